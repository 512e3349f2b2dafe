//! Package artifacts: the concrete builds the resolver chooses between.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    hash::{Hash, Hasher},
};

use serde::Deserialize;

use crate::{error::Error, matchspec::split_filename, version::VersionOrder};

/// Raw, as-deserialized metadata for a single index entry.
///
/// Mirrors the index format of spec.md §6: a mapping from filename to this
/// structure.
#[derive(Clone, Debug, Deserialize)]
pub struct ArtifactMetadata {
    /// Package name.
    pub name: String,
    /// Version string (see [`VersionOrder`]).
    pub version: String,
    /// Build identifier.
    pub build: String,
    /// Secondary ranking, higher is newer.
    pub build_number: i64,
    /// Dependency match spec strings.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Space-separated features this artifact provides.
    #[serde(default)]
    pub features: String,
    /// Space-separated features activated for the whole solution when this
    /// artifact is installed.
    #[serde(default)]
    pub track_features: String,
    /// Extra dependencies gated on a feature-set being active.
    #[serde(default)]
    pub with_features_depends: BTreeMap<String, Vec<String>>,
    /// Origin channel. Not resolver-meaningful.
    #[serde(default)]
    pub channel: Option<String>,
}

/// A concrete, installable build of a package.
///
/// Identified by `filename` of the form `name-version-build.tar.bz2`.
/// Artifacts of the same name are totally ordered by
/// `(version, build_number, build)`; artifacts of different names are
/// incomparable — see [`Artifact::compare_same_name`].
#[derive(Clone, Debug)]
pub struct Artifact {
    filename: String,
    name: String,
    version_raw: String,
    version: VersionOrder,
    build_number: i64,
    build: String,
    channel: Option<String>,
    features: BTreeSet<String>,
    track_features: BTreeSet<String>,
    with_features_depends: BTreeMap<String, Vec<String>>,
    depends: Vec<String>,
}

impl Artifact {
    /// Builds an [`Artifact`] from a filename and its raw metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadMetadata`] if `filename` doesn't end in
    /// `.tar.bz2` or doesn't decompose into `name-version-build`, or
    /// [`Error::MalformedVersion`] if `metadata.version` doesn't parse.
    pub fn new(filename: &str, metadata: &ArtifactMetadata) -> Result<Self, Error> {
        if split_filename(filename).is_none() {
            return Err(Error::BadMetadata(
                filename.to_string(),
                "filename does not end in .tar.bz2 or decompose into name-version-build".to_string(),
            ));
        }
        let version = VersionOrder::new(&metadata.version)?;
        Ok(Self {
            filename: filename.to_string(),
            name: metadata.name.clone(),
            version_raw: metadata.version.clone(),
            version,
            build_number: metadata.build_number,
            build: metadata.build.clone(),
            channel: metadata.channel.clone(),
            features: split_feature_string(&metadata.features),
            track_features: split_feature_string(&metadata.track_features),
            with_features_depends: metadata.with_features_depends.clone(),
            depends: metadata.depends.clone(),
        })
    }

    /// Returns the artifact's filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw version string.
    pub fn version_str(&self) -> &str {
        &self.version_raw
    }

    /// Returns the parsed version.
    pub fn version(&self) -> &VersionOrder {
        &self.version
    }

    /// Returns the build number.
    pub fn build_number(&self) -> i64 {
        self.build_number
    }

    /// Returns the build string.
    pub fn build(&self) -> &str {
        &self.build
    }

    /// Returns the origin channel, if any.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Returns the features this artifact provides when installed.
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    /// Returns the features this artifact activates for the whole solution.
    pub fn track_features(&self) -> &BTreeSet<String> {
        &self.track_features
    }

    /// Returns the raw dependency match spec strings.
    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    /// Returns the extra dependency spec strings gated on `active_features`,
    /// by picking the longest `with_features_depends` key that is a subset
    /// of `active_features`.
    ///
    /// On ties, the lexicographically smallest key wins (spec.md §9, Open
    /// Question resolved).
    pub fn extra_depends_for(&self, active_features: &BTreeSet<String>) -> &[String] {
        let mut best: Option<(&String, &Vec<String>)> = None;
        for (key, deps) in &self.with_features_depends {
            let key_features: BTreeSet<&str> = key.split_whitespace().collect();
            if !key_features.iter().all(|f| active_features.contains(*f)) {
                continue;
            }
            best = match best {
                None => Some((key, deps)),
                Some((best_key, _))
                    if key_features.len() > best_key.split_whitespace().count()
                        || (key_features.len() == best_key.split_whitespace().count()
                            && key < best_key) =>
                {
                    Some((key, deps))
                }
                other => other,
            };
        }
        best.map(|(_, deps)| deps.as_slice()).unwrap_or(&[])
    }

    /// The sort key used to order artifacts of the same name: descending
    /// preference is newest `version`, then `build_number`, then `build`.
    pub fn rank_key(&self) -> (&VersionOrder, i64, &str) {
        (&self.version, self.build_number, self.build.as_str())
    }

    /// Compares two artifacts if (and only if) they share a name.
    ///
    /// Artifacts of different names are incomparable per spec.
    pub fn compare_same_name(&self, other: &Self) -> Option<Ordering> {
        if self.name != other.name {
            return None;
        }
        Some(self.rank_key().cmp(&other.rank_key()))
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.filename.hash(state);
    }
}

fn split_feature_string(features: &str) -> BTreeSet<String> {
    features.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, version: &str, build: &str, build_number: i64) -> ArtifactMetadata {
        ArtifactMetadata {
            name: name.to_string(),
            version: version.to_string(),
            build: build.to_string(),
            build_number,
            depends: Vec::new(),
            features: String::new(),
            track_features: String::new(),
            with_features_depends: BTreeMap::new(),
            channel: None,
        }
    }

    #[test]
    fn rejects_bad_filename() {
        let m = meta("numpy", "1.7.1", "py27_0", 0);
        assert!(Artifact::new("numpy-1.7.1-py27_0.tar.gz", &m).is_err());
        assert!(Artifact::new("numpy.tar.bz2", &m).is_err());
    }

    #[test]
    fn orders_within_name_only() {
        let a = Artifact::new("numpy-1.7.1-py27_0.tar.bz2", &meta("numpy", "1.7.1", "py27_0", 0)).unwrap();
        let b = Artifact::new("numpy-1.8.0-py27_0.tar.bz2", &meta("numpy", "1.8.0", "py27_0", 0)).unwrap();
        let c = Artifact::new("python-2.7.5-0.tar.bz2", &meta("python", "2.7.5", "0", 0)).unwrap();

        assert_eq!(a.compare_same_name(&b), Some(Ordering::Less));
        assert_eq!(a.compare_same_name(&c), None);
    }

    #[test]
    fn with_features_depends_tie_break_lexicographic() {
        let mut m = meta("numpy", "1.7.1", "py27_0", 0);
        m.with_features_depends.insert("gpu".to_string(), vec!["cuda".to_string()]);
        m.with_features_depends.insert("mkl".to_string(), vec!["mkl-lib".to_string()]);
        let a = Artifact::new("numpy-1.7.1-py27_0.tar.bz2", &m).unwrap();

        let mut active = BTreeSet::new();
        active.insert("gpu".to_string());
        active.insert("mkl".to_string());

        assert_eq!(a.extra_depends_for(&active), ["cuda".to_string()]);
    }
}
