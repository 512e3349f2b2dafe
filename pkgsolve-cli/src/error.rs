//! Error handling for the `pkgsolve` binary.

use std::path::PathBuf;

/// Errors surfaced by the `pkgsolve` binary's subcommands.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Reading a file from disk failed.
    #[error("failed to read {path:?}: {source}")]
    IoPath {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A JSON document could not be deserialized.
    #[error("failed to parse {path:?} as JSON: {source}")]
    Json {
        /// The path whose contents failed to parse.
        path: PathBuf,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// A resolver-core error (malformed spec/version, unsatisfiable
    /// requirements, missing packages).
    #[error(transparent)]
    Resolve(#[from] pkgsolve::Error),

    /// A value-type error (malformed spec/version, missing packages) raised
    /// directly by the CLI rather than through [`pkgsolve::Resolver`].
    #[error(transparent)]
    Types(#[from] pkgsolve_types::Error),
}
