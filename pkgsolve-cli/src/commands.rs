//! Subcommand implementations for the `pkgsolve` binary.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use pkgsolve::Resolver;
use pkgsolve_types::{Index, MatchSpec};

use crate::Error;

fn read_to_string(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::IoPath { path: path.to_path_buf(), source })
}

fn load_index(path: &Path) -> Result<Index, Error> {
    let data = read_to_string(path)?;
    Ok(Index::from_json(&data)?)
}

fn load_installed(path: Option<&PathBuf>) -> Result<HashMap<String, String>, Error> {
    let Some(path) = path else { return Ok(HashMap::new()) };
    let data = read_to_string(path)?;
    serde_json::from_str(&data).map_err(|source| Error::Json { path: path.clone(), source })
}

fn parse_specs(raw: &[String]) -> Result<Vec<MatchSpec>, Error> {
    raw.iter().map(|s| MatchSpec::new(s)).collect::<Result<_, _>>().map_err(Error::from)
}

/// Runs the `solve` subcommand: resolves `specs` against `index` and prints
/// the chosen filenames, one per line, in sorted order.
///
/// # Errors
///
/// Returns an error if the index or installed-map file can't be read or
/// parsed, if a spec string is malformed, or if the requirements have no
/// consistent solution.
pub fn solve(
    index: PathBuf,
    specs: Vec<String>,
    features: Vec<String>,
    max_only: bool,
    installed: Option<PathBuf>,
) -> Result<(), Error> {
    let index = load_index(&index)?;
    let installed = load_installed(installed.as_ref())?;
    let specs = parse_specs(&specs)?;
    let features: BTreeSet<String> = features.into_iter().collect();

    let resolver = Resolver::new(&index);
    let filenames = resolver.solve(&specs, &installed, &features, max_only, false)?;
    for filename in filenames {
        println!("{filename}");
    }
    Ok(())
}

/// Runs the `find-matches` subcommand: prints every artifact in `index`
/// matching `spec`, one per line, in sorted order.
///
/// # Errors
///
/// Returns an error if the index file can't be read or parsed, or if `spec`
/// is malformed.
pub fn find_matches(index: PathBuf, spec: String) -> Result<(), Error> {
    let index = load_index(&index)?;
    let spec = MatchSpec::new(&spec).map_err(Error::from)?;

    let resolver = Resolver::new(&index);
    for filename in resolver.find_matches(&spec) {
        println!("{filename}");
    }
    Ok(())
}
