//! The in-memory view of an artifact index.

use std::collections::HashMap;

use crate::{
    error::Error,
    matchspec::MatchSpec,
    package::{Artifact, ArtifactMetadata},
};

/// An immutable mapping from filename to artifact metadata, with a derived
/// secondary index from package name to filenames.
///
/// Populated once at construction; `find_matches` and `get_pkgs` iterate in
/// sorted filename order for determinism (spec.md §5).
#[derive(Clone, Debug)]
pub struct Index {
    by_filename: HashMap<String, Artifact>,
    by_name: HashMap<String, Vec<String>>,
}

impl Index {
    /// Builds an [`Index`] from a filename-to-metadata map.
    ///
    /// # Errors
    ///
    /// Propagates any [`Error`] encountered constructing an individual
    /// [`Artifact`] (malformed filename, malformed version).
    pub fn new(entries: impl IntoIterator<Item = (String, ArtifactMetadata)>) -> Result<Self, Error> {
        let mut by_filename = HashMap::new();
        let mut by_name: HashMap<String, Vec<String>> = HashMap::new();

        for (filename, metadata) in entries {
            let artifact = Artifact::new(&filename, &metadata)?;
            by_name.entry(artifact.name().to_string()).or_default().push(filename.clone());
            by_filename.insert(filename, artifact);
        }

        for filenames in by_name.values_mut() {
            filenames.sort();
        }

        log::debug!(
            "built index with {} artifacts across {} package names",
            by_filename.len(),
            by_name.len()
        );

        Ok(Self { by_filename, by_name })
    }

    /// Parses an [`Index`] from the JSON index format of spec.md §6.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadMetadata`] if the top-level JSON value isn't an
    /// object mapping filenames to artifact metadata, or propagates errors
    /// from [`Index::new`].
    pub fn from_json(data: &str) -> Result<Self, Error> {
        let raw: HashMap<String, ArtifactMetadata> = serde_json::from_str(data)
            .map_err(|e| Error::BadMetadata("<index>".to_string(), e.to_string()))?;
        Self::new(raw)
    }

    /// Looks up a single artifact by filename.
    pub fn get(&self, filename: &str) -> Option<&Artifact> {
        self.by_filename.get(filename)
    }

    /// Returns the number of artifacts in the index.
    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    /// Returns whether the index has no artifacts.
    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Returns, in sorted filename order, every artifact whose filename
    /// satisfies `ms`.
    pub fn find_matches(&self, ms: &MatchSpec) -> Vec<&Artifact> {
        let mut filenames = self.by_name.get(ms.name()).cloned().unwrap_or_default();
        filenames.sort();
        filenames
            .iter()
            .filter_map(|fname| self.by_filename.get(fname))
            .filter(|artifact| ms.matches(artifact.filename()))
            .collect()
    }

    /// Returns matching artifacts for `ms`.
    ///
    /// When `max_only` is `true`, restricts the result to artifacts tying
    /// for the maximum `(name, version, build_number)` — artifacts
    /// differing only in `build` all pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPackagesFound`] carrying `ms`'s string form if no
    /// artifact matches.
    pub fn get_pkgs(&self, ms: &MatchSpec, max_only: bool) -> Result<Vec<&Artifact>, Error> {
        let matches = self.find_matches(ms);
        if matches.is_empty() {
            return Err(Error::NoPackagesFound(vec![ms.to_string()]));
        }
        if !max_only {
            return Ok(matches);
        }

        let best = matches
            .iter()
            .map(|a| (a.version(), a.build_number()))
            .max_by(|a, b| a.cmp(b))
            .expect("matches is non-empty");

        Ok(matches
            .into_iter()
            .filter(|a| (a.version(), a.build_number()) == best)
            .collect())
    }
}
