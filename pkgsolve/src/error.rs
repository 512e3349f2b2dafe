//! Error handling for pkgsolve.

/// pkgsolve error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A [`pkgsolve_types::Error`] from the value-type layer (malformed
    /// version, malformed spec, bad metadata, or no matching packages).
    #[error(transparent)]
    Types(#[from] pkgsolve_types::Error),

    /// The SAT instance has no satisfying assignment.
    #[error("failed to solve dependencies:\n{0}")]
    Unsatisfiable(String),

    /// The optimum-enumeration loop exceeded its iteration cap.
    ///
    /// Handled internally by switching solver strategy (falling back to the
    /// sorting-network bound rather than further blocking-clause
    /// enumeration); never surfaces to callers of [`crate::Resolver::solve`].
    #[error("exceeded maximum solver iterations")]
    MaxIterations,
}
