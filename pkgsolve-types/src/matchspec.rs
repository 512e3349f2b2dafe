//! Match specifications: predicates over package artifacts.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::{error::Error, version::VersionOrder};

/// A relational comparison operator used by a version-requirement atom.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl Relation {
    /// Parses the longest matching operator prefix, returning it and the
    /// remainder of the string.
    fn parse_prefix(input: &str) -> Option<(Self, &str)> {
        const OPS: &[(&str, Relation)] = &[
            ("==", Relation::Eq),
            ("!=", Relation::Ne),
            ("<=", Relation::Le),
            (">=", Relation::Ge),
            ("<", Relation::Lt),
            (">", Relation::Gt),
        ];
        for (token, rel) in OPS {
            if let Some(rest) = input.strip_prefix(token) {
                return Some((*rel, rest));
            }
        }
        None
    }

    fn evaluate(self, candidate: &VersionOrder, bound: &VersionOrder) -> bool {
        match self {
            Relation::Eq => candidate == bound,
            Relation::Ne => candidate != bound,
            Relation::Le => candidate <= bound,
            Relation::Ge => candidate >= bound,
            Relation::Lt => candidate < bound,
            Relation::Gt => candidate > bound,
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Eq => "==",
            Relation::Ne => "!=",
            Relation::Le => "<=",
            Relation::Ge => ">=",
            Relation::Lt => "<",
            Relation::Gt => ">",
        };
        write!(f, "{s}")
    }
}

/// A single atom within a [`MatchSpec`] version expression alternative.
///
/// Either a relational constraint (`>=1.2`) evaluated via [`VersionOrder`],
/// or a glob-style pattern (`1.2.*`) where `.` is literal and `*` matches any
/// run of characters, anchored to the full candidate string.
#[derive(Clone, Debug)]
enum Atom {
    Relational(Relation, VersionOrder),
    Glob(String),
}

impl Atom {
    fn parse(raw: &str, original: &str) -> Result<Self, Error> {
        if raw.is_empty() {
            return Err(Error::MalformedSpec(original.to_string(), "empty version atom".to_string()));
        }
        if matches!(raw.chars().next(), Some('=' | '<' | '>' | '!')) {
            let (relation, rest) = Relation::parse_prefix(raw).ok_or_else(|| {
                Error::MalformedSpec(original.to_string(), "unrecognized relational operator".to_string())
            })?;
            let version = VersionOrder::new(rest)
                .map_err(|_| Error::MalformedSpec(original.to_string(), "invalid version in atom".to_string()))?;
            Ok(Atom::Relational(relation, version))
        } else {
            Ok(Atom::Glob(raw.to_string()))
        }
    }

    fn matches(&self, candidate_version: &str) -> bool {
        match self {
            Atom::Relational(relation, bound) => match VersionOrder::new(candidate_version) {
                Ok(candidate) => relation.evaluate(&candidate, bound),
                Err(_) => false,
            },
            Atom::Glob(pattern) => glob_match(pattern, candidate_version),
        }
    }
}

/// Matches `pattern` (`.` literal, `*` = any run of characters) against the
/// full extent of `text`.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(pattern: &[u8], text: &[u8]) -> bool {
        match pattern.first() {
            None => text.is_empty(),
            Some(b'*') => (0..=text.len()).any(|split| inner(&pattern[1..], &text[split..])),
            Some(&p) => matches!(text.first(), Some(&t) if t == p) && inner(&pattern[1..], &text[1..]),
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}

/// An alternative within a version expression: a conjunction of atoms that
/// must *all* match.
#[derive(Clone, Debug)]
struct Alternative(Vec<Atom>);

impl Alternative {
    fn matches(&self, version: &str) -> bool {
        self.0.iter().all(|atom| atom.matches(version))
    }
}

/// A predicate over package artifacts: name plus optional version/build
/// constraint.
///
/// Parsed from a whitespace-tokenized string with one to three tokens:
///
/// - `name` — matches every artifact of that name.
/// - `name versionexpr` — `versionexpr` is one or more `|`-separated
///   alternatives, each a comma-separated conjunction of atoms.
/// - `name version build` — exact match on both version and build strings.
///
/// # Examples
///
/// ```
/// use pkgsolve_types::MatchSpec;
///
/// let spec = MatchSpec::new("python 2.7*").unwrap();
/// assert!(spec.matches("python-2.7.5-0.tar.bz2"));
///
/// let spec = MatchSpec::new("python >=2.7,<3").unwrap();
/// assert!(!spec.matches("python-2.6.9-0.tar.bz2"));
///
/// let spec = MatchSpec::new("python 2.7.5 0").unwrap();
/// assert_eq!(spec.to_filename().as_deref(), Some("python-2.7.5-0.tar.bz2"));
/// ```
#[derive(Clone, Debug)]
pub struct MatchSpec {
    raw: String,
    name: String,
    strictness: u8,
    alternatives: Vec<Alternative>,
    exact_build: Option<String>,
}

impl MatchSpec {
    /// Parses a match spec from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSpec`] when the input has zero or more than
    /// three whitespace tokens, or an atom has an unrecognized relational
    /// operator.
    pub fn new(input: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.len() {
            0 => Err(Error::MalformedSpec(input.to_string(), "no tokens".to_string())),
            1 => Ok(Self {
                raw: input.to_string(),
                name: tokens[0].to_string(),
                strictness: 1,
                alternatives: Vec::new(),
                exact_build: None,
            }),
            2 => {
                let alternatives = tokens[1]
                    .split('|')
                    .map(|alt| {
                        let atoms = alt
                            .split(',')
                            .map(|atom| Atom::parse(atom, input))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Alternative(atoms))
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(Self {
                    raw: input.to_string(),
                    name: tokens[0].to_string(),
                    strictness: 2,
                    alternatives,
                    exact_build: None,
                })
            }
            3 => Ok(Self {
                raw: input.to_string(),
                name: tokens[0].to_string(),
                strictness: 3,
                alternatives: vec![Alternative(vec![Atom::Relational(
                    Relation::Eq,
                    VersionOrder::new(tokens[1])
                        .map_err(|_| Error::MalformedSpec(input.to_string(), "invalid version".to_string()))?,
                )])],
                exact_build: Some(tokens[2].to_string()),
            }),
            _ => Err(Error::MalformedSpec(input.to_string(), "more than three tokens".to_string())),
        }
    }

    /// Returns the package name this spec constrains.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `1`, `2`, or `3` depending on how specific the spec is.
    pub fn strictness(&self) -> u8 {
        self.strictness
    }

    /// Returns the exact filename this spec pins to, if `strictness() == 3`.
    pub fn to_filename(&self) -> Option<String> {
        if self.strictness != 3 {
            return None;
        }
        let Atom::Relational(_, version) = &self.alternatives[0].0[0] else {
            return None;
        };
        let build = self.exact_build.as_ref()?;
        Some(format!("{}-{}-{}.tar.bz2", self.name, version.as_str(), build))
    }

    /// Returns whether `filename` (`name-version-build.tar.bz2`) satisfies
    /// this spec.
    pub fn matches(&self, filename: &str) -> bool {
        let Some((name, version, build)) = split_filename(filename) else {
            return false;
        };
        if name != self.name {
            return false;
        }
        match self.strictness {
            1 => true,
            2 => self.alternatives.iter().any(|alt| alt.matches(version)),
            3 => {
                let expected_build = self.exact_build.as_deref().unwrap_or_default();
                build == expected_build && self.alternatives[0].matches(version)
            }
            _ => unreachable!("strictness is validated at construction"),
        }
    }
}

/// Splits a `name-version-build.tar.bz2` filename into its three parts.
pub fn split_filename(filename: &str) -> Option<(&str, &str, &str)> {
    let stem = filename.strip_suffix(".tar.bz2")?;
    let (rest, build) = stem.rsplit_once('-')?;
    let (name, version) = rest.rsplit_once('-')?;
    Some((name, version, build))
}

impl FromStr for MatchSpec {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        MatchSpec::new(input)
    }
}

impl Display for MatchSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("python", "python-2.7.5-0.tar.bz2", true)]
    #[case("python 2.7*", "python-2.7.5-0.tar.bz2", true)]
    #[case("python 2.7*", "python-3.3.2-0.tar.bz2", false)]
    #[case("python >=2.7,<3", "python-2.6.9-0.tar.bz2", false)]
    #[case("python >=2.7,<3", "python-2.7.5-0.tar.bz2", true)]
    #[case("python 2.7.5 0", "python-2.7.5-0.tar.bz2", true)]
    #[case("python 2.7.5 1", "python-2.7.5-0.tar.bz2", false)]
    #[case("numpy", "python-2.7.5-0.tar.bz2", false)]
    fn matches_table(#[case] spec: &str, #[case] filename: &str, #[case] expected: bool) {
        assert_eq!(MatchSpec::new(spec).unwrap().matches(filename), expected);
    }

    #[test]
    fn to_filename_only_for_exact_specs() {
        assert_eq!(
            MatchSpec::new("python 2.7.5 0").unwrap().to_filename().as_deref(),
            Some("python-2.7.5-0.tar.bz2")
        );
        assert_eq!(MatchSpec::new("python 2.7.5").unwrap().to_filename(), None);
        assert_eq!(MatchSpec::new("python").unwrap().to_filename(), None);
    }

    #[test]
    fn rejects_bad_token_counts() {
        assert!(MatchSpec::new("").is_err());
        assert!(MatchSpec::new("a b c d").is_err());
    }

    #[test]
    fn rejects_unknown_operator() {
        // A single '=' is not one of the recognized two-char relational operators.
        assert!(MatchSpec::new("python =1.0").is_err());
    }

    #[test]
    fn bare_glob_atoms_need_no_operator() {
        assert!(MatchSpec::new("foo ~1.0").unwrap().matches("foo-~1.0-0.tar.bz2"));
    }

    #[test]
    fn glob_anchors_to_full_string() {
        assert!(glob_match("2.7.*", "2.7.5"));
        assert!(!glob_match("2.7.*", "12.7.5"));
        assert!(glob_match("*", "anything"));
    }
}
