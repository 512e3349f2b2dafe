//! Version parsing and total ordering.
//!
//! A version string such as `"1!2.3.4rc2.post1"` decomposes into an epoch,
//! dot-separated components, and — within each component — maximal runs of
//! digits and non-digits. See [`VersionOrder`] for the full grammar.

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::error::Error;

/// A single sub-component of a version component.
///
/// Digit runs become [`Token::Int`]; non-digit runs are lowercased, with two
/// reserved spellings ([`Token::Dev`], [`Token::Post`]) that rank outside the
/// normal string/integer ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    /// `dev` — ranks below any string or integer in its position.
    Dev,
    /// A lowercased non-digit run that is not `dev` or `post`.
    Str(String),
    /// A run of digits, or the `-1` filler used to pad missing positions.
    Int(i64),
    /// `post` — ranks above any string or integer in its position.
    Post,
}

impl Token {
    /// Relative rank used when comparing tokens of different kinds.
    ///
    /// `Dev` is always least, `Post` is always greatest; `Str` sorts below
    /// `Int` (any string is less than any integer), per spec.
    fn rank(&self) -> u8 {
        match self {
            Token::Dev => 0,
            Token::Str(_) => 1,
            Token::Int(_) => 2,
            Token::Post => 3,
        }
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Str(a), Token::Str(b)) => a.cmp(b),
            (Token::Int(a), Token::Int(b)) => a.cmp(b),
            (Token::Dev, Token::Dev) | (Token::Post, Token::Post) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The filler subcomponent used to pad missing positions during comparison.
const FILL: Token = Token::Int(-1);

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '*' | '.' | '_' | '!')
}

/// Splits a component into maximal runs of digits and non-digits, prepending
/// the `-1` filler when the component doesn't start with a digit.
///
/// ```text
/// "4rc2"  -> [Int(4), Str("rc"), Int(2)]
/// "post1" -> [Int(-1), Post, Int(1)]
/// "dev1"  -> [Int(-1), Dev, Int(1)]
/// ```
fn tokenize_component(component: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = component.chars().peekable();

    if let Some(&first) = chars.peek() {
        if !first.is_ascii_digit() {
            tokens.push(FILL);
        }
    }

    let mut current = String::new();
    let mut current_is_digit: Option<bool> = None;
    for c in component.chars() {
        let is_digit = c.is_ascii_digit();
        match current_is_digit {
            Some(prev) if prev == is_digit => current.push(c),
            _ => {
                if !current.is_empty() {
                    tokens.push(make_token(&current));
                }
                current.clear();
                current.push(c);
                current_is_digit = Some(is_digit);
            }
        }
    }
    if !current.is_empty() {
        tokens.push(make_token(&current));
    }

    tokens
}

fn make_token(run: &str) -> Token {
    if run.chars().all(|c| c.is_ascii_digit()) {
        Token::Int(run.parse().unwrap_or(i64::MAX))
    } else {
        match run {
            "dev" => Token::Dev,
            "post" => Token::Post,
            other => Token::Str(other.to_string()),
        }
    }
}

/// A parsed, totally ordered package version.
///
/// Constructed from a non-empty string matching `[*._0-9A-Za-z!]+`.
/// Comparison is case-insensitive and total: for any two well-formed
/// versions, exactly one of `<`, `==`, `>` holds.
///
/// # Examples
///
/// ```
/// use pkgsolve_types::VersionOrder;
///
/// assert!(VersionOrder::new("1!0.4.1").unwrap() > VersionOrder::new("9999.9").unwrap());
/// assert!(VersionOrder::new("1.1.dev1").unwrap() < VersionOrder::new("1.1.a1").unwrap());
/// assert!(VersionOrder::new("1.1.a1").unwrap() < VersionOrder::new("1.1").unwrap());
/// assert!(VersionOrder::new("1.1").unwrap() < VersionOrder::new("1.1.post1").unwrap());
/// assert!(VersionOrder::new("1.1.post1").unwrap() < VersionOrder::new("1.1.0").unwrap());
/// assert!(VersionOrder::new("1.4").unwrap() < VersionOrder::new("1.4.0").unwrap());
/// assert_eq!(VersionOrder::new("0.4.1.RC").unwrap(), VersionOrder::new("0.4.1.rc").unwrap());
/// ```
#[derive(Clone, Debug, Eq)]
pub struct VersionOrder {
    raw: String,
    epoch: i64,
    components: Vec<Vec<Token>>,
}

impl VersionOrder {
    /// Parses `input` into a [`VersionOrder`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedVersion`] on empty input, disallowed
    /// characters, more than one epoch separator, a non-integer epoch, or an
    /// empty component between dots.
    pub fn new(input: &str) -> Result<Self, Error> {
        if input.is_empty() {
            return Err(Error::MalformedVersion(input.to_string(), "empty version string".into()));
        }
        if let Some(bad) = input.chars().find(|&c| !is_version_char(c)) {
            log::trace!("rejecting version {input:?}: disallowed character {bad:?}");
            return Err(Error::MalformedVersion(
                input.to_string(),
                "contains a character outside [*._0-9A-Za-z!]".into(),
            ));
        }

        let lowered = input.to_ascii_lowercase();
        let bang_count = lowered.matches('!').count();
        if bang_count > 1 {
            return Err(Error::MalformedVersion(
                input.to_string(),
                "epoch separator '!' appears more than once".into(),
            ));
        }

        let (epoch, rest) = match lowered.split_once('!') {
            Some((epoch_str, rest)) => {
                if epoch_str.is_empty() || !epoch_str.chars().all(|c| c.is_ascii_digit()) {
                    return Err(Error::MalformedVersion(
                        input.to_string(),
                        "epoch must be a non-negative integer".into(),
                    ));
                }
                let epoch: i64 = epoch_str
                    .parse()
                    .map_err(|_| Error::MalformedVersion(input.to_string(), "epoch overflowed".into()))?;
                (epoch, rest)
            }
            None => (0, lowered.as_str()),
        };

        if rest.is_empty() {
            return Err(Error::MalformedVersion(
                input.to_string(),
                "no version components after epoch".into(),
            ));
        }

        let mut components = Vec::new();
        for component in rest.split('.') {
            if component.is_empty() {
                return Err(Error::MalformedVersion(
                    input.to_string(),
                    "empty component between dots".into(),
                ));
            }
            components.push(tokenize_component(component));
        }

        Ok(Self { raw: input.to_string(), epoch, components })
    }

    /// Returns the original, unparsed version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the epoch (defaults to `0` when no `!` separator is present).
    pub fn epoch(&self) -> i64 {
        self.epoch
    }
}

impl FromStr for VersionOrder {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        VersionOrder::new(input)
    }
}

impl Display for VersionOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Ord for VersionOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            not_equal => return not_equal,
        }

        let filler_component = [FILL];
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).map(Vec::as_slice).unwrap_or(&filler_component);
            let b = other.components.get(i).map(Vec::as_slice).unwrap_or(&filler_component);

            let sublen = a.len().max(b.len());
            for j in 0..sublen {
                let ta = a.get(j).unwrap_or(&FILL);
                let tb = b.get(j).unwrap_or(&FILL);
                match ta.cmp(tb) {
                    Ordering::Equal => continue,
                    not_equal => return not_equal,
                }
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for VersionOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", false)]
    #[case("1.0.0", true)]
    #[case("1!2.3.4rc2.post1", true)]
    #[case("1..2", false)]
    #[case("!1.0", false)]
    #[case("1!2!3", false)]
    #[case("1.0a!", false)]
    #[case("1.0$", false)]
    fn parses_or_rejects(#[case] input: &str, #[case] should_parse: bool) {
        assert_eq!(VersionOrder::new(input).is_ok(), should_parse, "input: {input:?}");
    }

    #[test]
    fn epoch_dominates_components() {
        assert!(VersionOrder::new("1!0.4.1").unwrap() > VersionOrder::new("9999.9").unwrap());
    }

    #[test]
    fn dev_ranks_lowest() {
        let dev = VersionOrder::new("1.1.dev1").unwrap();
        let alpha = VersionOrder::new("1.1.a1").unwrap();
        let plain = VersionOrder::new("1.1").unwrap();
        assert!(dev < alpha);
        assert!(alpha < plain);
    }

    #[test]
    fn post_ranks_highest() {
        let plain = VersionOrder::new("1.1").unwrap();
        let post = VersionOrder::new("1.1.post1").unwrap();
        let next = VersionOrder::new("1.1.0").unwrap();
        assert!(plain < post);
        assert!(post < next);
    }

    #[test]
    fn fillvalue_rule() {
        assert!(VersionOrder::new("1.4").unwrap() < VersionOrder::new("1.4.0").unwrap());
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(VersionOrder::new("0.4.1.RC").unwrap(), VersionOrder::new("0.4.1.rc").unwrap());
    }

    #[test]
    fn reflexive_equality() {
        let v = VersionOrder::new("1.2.3").unwrap();
        assert_eq!(v, v.clone());
    }

    proptest! {
        #[test]
        fn totality(a in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}", b in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}") {
            let va = VersionOrder::new(&a).unwrap();
            let vb = VersionOrder::new(&b).unwrap();
            let lt = va < vb;
            let eq = va == vb;
            let gt = va > vb;
            prop_assert_eq!((lt as u8) + (eq as u8) + (gt as u8), 1);
        }

        #[test]
        fn transitivity(a in "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}", b in "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}", c in "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}") {
            let va = VersionOrder::new(&a).unwrap();
            let vb = VersionOrder::new(&b).unwrap();
            let vc = VersionOrder::new(&c).unwrap();
            if va <= vb && vb <= vc {
                prop_assert!(va <= vc);
            }
        }
    }
}
