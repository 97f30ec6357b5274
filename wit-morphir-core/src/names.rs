//! Validated names and documentation used by the WIT domain model.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

static KEBAB_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]([a-z0-9-]*[a-z0-9])?$").unwrap_or_else(|err| panic!("kebab regex: {err}"))
});

pub fn is_kebab_case(value: &str) -> bool {
    KEBAB_CASE.is_match(value)
}

fn validate(kind: &'static str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidIdentifier {
            kind,
            value: String::new(),
            reason: "cannot be empty",
        });
    }
    if !is_kebab_case(value) {
        return Err(CoreError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason: "must be kebab-case",
        });
    }
    Ok(())
}

/// The `ns` part of `package ns:name;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(value: impl Into<String>) -> Result<Namespace, CoreError> {
        let value = value.into();
        validate("namespace", &value)?;
        Ok(Namespace(value))
    }

    /// Only for literals known to be valid.
    pub fn must(value: &str) -> Namespace {
        Namespace::new(value).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The `name` part of `package ns:name;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(value: impl Into<String>) -> Result<PackageName, CoreError> {
        let value = value.into();
        validate("package name", &value)?;
        Ok(PackageName(value))
    }

    /// Only for literals known to be valid.
    pub fn must(value: &str) -> PackageName {
        PackageName::new(value).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A kebab-case identifier, or a `%`-escaped one such as `%type`.
///
/// The escape is kept as part of the value so that emitting the
/// identifier reproduces the source spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Result<Identifier, CoreError> {
        let value = value.into();
        match value.strip_prefix('%') {
            Some(rest) => validate("identifier", rest)?,
            None => validate("identifier", &value)?,
        }
        Ok(Identifier(value))
    }

    /// Only for literals known to be valid.
    pub fn must(value: &str) -> Identifier {
        Identifier::new(value).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_escaped(&self) -> bool {
        self.0.starts_with('%')
    }

    /// The name without its `%` escape.
    pub fn unescaped(&self) -> &str {
        self.0.strip_prefix('%').unwrap_or(&self.0)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl AsRef<str> for $ty {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

display_as_str!(Namespace, PackageName, Identifier);

/// Ordered documentation lines; may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Documentation {
    lines: Vec<String>,
}

impl Documentation {
    /// Split a block of text into lines. Empty text has no lines.
    pub fn new(text: &str) -> Documentation {
        if text.is_empty() {
            return Documentation::default();
        }
        Documentation {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Documentation {
        Documentation { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for Documentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Parse `major[.minor[.patch]]`, filling missing segments with zero.
pub fn parse_version(segments: &[String]) -> Result<semver::Version, CoreError> {
    let mut parts: Vec<&str> = segments.iter().map(String::as_str).collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    Ok(semver::Version::parse(&parts.join("."))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_kebab_identifier() {
        let err = Identifier::new("Foo_Bar").unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentifier { .. }));
    }

    #[test]
    fn accepts_kebab_and_escaped_identifiers() {
        assert_eq!(Identifier::new("foo-bar").expect("kebab").as_str(), "foo-bar");
        let escaped = Identifier::new("%type").expect("escaped");
        assert!(escaped.is_escaped());
        assert_eq!(escaped.unescaped(), "type");
    }

    #[test]
    fn rejects_empty_and_trailing_hyphen() {
        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("%").is_err());
        assert!(Namespace::new("wasi-").is_err());
        assert!(PackageName::new("9lives").is_err());
    }

    #[test]
    fn documentation_splits_on_newlines() {
        let docs = Documentation::new("first\nsecond");
        assert_eq!(docs.lines().len(), 2);
        assert_eq!(docs.to_string(), "first\nsecond");
        assert!(Documentation::new("").is_empty());
    }

    #[test]
    fn pads_partial_versions() {
        let version = parse_version(&["0".to_string(), "2".to_string()]).expect("version");
        assert_eq!(version, semver::Version::new(0, 2, 0));
        assert!(parse_version(&["x".to_string()]).is_err());
    }
}
