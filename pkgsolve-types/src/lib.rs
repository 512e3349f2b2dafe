#![doc = include_str!("../README.md")]

mod error;
mod index;
mod matchspec;
mod package;
mod version;

pub use error::Error;
pub use index::Index;
pub use matchspec::{MatchSpec, Relation};
pub use package::{Artifact, ArtifactMetadata};
pub use version::VersionOrder;
