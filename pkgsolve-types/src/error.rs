//! Error handling for pkgsolve-types.

/// Errors produced while parsing or validating core value types.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A version string could not be parsed.
    #[error("malformed version {0:?}: {1}")]
    MalformedVersion(String, String),

    /// A match specification string could not be parsed.
    #[error("malformed match spec {0:?}: {1}")]
    MalformedSpec(String, String),

    /// An index entry is missing required metadata.
    #[error("bad metadata for {0:?}: {1}")]
    BadMetadata(String, String),

    /// No artifact in the index matched one or more requested specs.
    #[error("no packages found matching: {}", .0.join(", "))]
    NoPackagesFound(Vec<String>),
}
