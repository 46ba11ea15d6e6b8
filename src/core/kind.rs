// This module defines the registration kinds the merger recognizes. A Kind pairs a category
// name (for example "language") with the canonical archive path of its descriptor
// (META-INF/truffle/language) and owns the compiled regex for its data lines. The
// RegistrationPaths table is the fixed, ordered configuration the Assembler hands to the
// merger: lookup is an exact match on the archive-relative path, and the table order is the
// order in which merged descriptors are emitted. LineSeparator selects the separator used
// when merged descriptors are rendered.

//! Registration kinds and the recognized path table.

use regex::Regex;
use std::fmt;

use super::error::{MergeError, MergeResult};

/// A registration category and the archive path of its descriptor.
#[derive(Debug, Clone)]
pub struct Kind {
    name: String,
    path: String,
    pattern: Regex,
}

impl Kind {
    /// Create a kind, validating its name.
    ///
    /// The name must be non-empty ASCII alphanumerics or `_` and must not end
    /// in a digit, otherwise `language1` could not be split into name and key.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> MergeResult<Self> {
        let name = name.into();
        let path = path.into();

        let invalid = |reason: &str| MergeError::InvalidKind {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("name may only contain ASCII letters, digits and '_'"));
        }
        if name.ends_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("name must not end in a digit"));
        }
        if path.is_empty() {
            return Err(invalid("descriptor path is empty"));
        }

        let pattern = Regex::new(&format!(r"^({}[1-9][0-9]*)(\.\S.*)$", regex::escape(&name)))
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(Self { name, path, pattern })
    }

    /// Parse a `name=path` assignment as given on the command line.
    pub fn parse_assignment(spec: &str) -> MergeResult<Self> {
        match spec.split_once('=') {
            Some((name, path)) => Self::new(name.trim(), path.trim()),
            None => Err(MergeError::InvalidKind {
                name: spec.to_string(),
                reason: "expected NAME=PATH".to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical archive path of this kind's descriptor.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Regex matched against every data line of a descriptor.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Enumerated key for the given sequential number, e.g. `language3`.
    pub fn key(&self, index: usize) -> String {
        format!("{}{}", self.name, index)
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.path == other.path
    }
}

impl Eq for Kind {}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Ordered table mapping descriptor paths to kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPaths {
    kinds: Vec<Kind>,
}

impl RegistrationPaths {
    pub const LANGUAGE_PATH: &'static str = "META-INF/truffle/language";
    pub const INSTRUMENT_PATH: &'static str = "META-INF/truffle/instrument";

    /// Build a table, rejecting duplicate names or paths.
    pub fn new(kinds: Vec<Kind>) -> MergeResult<Self> {
        for (i, kind) in kinds.iter().enumerate() {
            for earlier in &kinds[..i] {
                if earlier.name == kind.name {
                    return Err(MergeError::InvalidTable {
                        reason: format!("kind '{}' is listed twice", kind.name),
                    });
                }
                if earlier.path == kind.path {
                    return Err(MergeError::InvalidTable {
                        reason: format!(
                            "path {} is claimed by both '{}' and '{}'",
                            kind.path, earlier.name, kind.name
                        ),
                    });
                }
            }
        }
        Ok(Self { kinds })
    }

    /// The language and instrument descriptors written by the Truffle
    /// registration processors.
    pub fn truffle() -> Self {
        Self {
            kinds: vec![
                Kind::new("language", Self::LANGUAGE_PATH).expect("valid builtin kind"),
                Kind::new("instrument", Self::INSTRUMENT_PATH).expect("valid builtin kind"),
            ],
        }
    }

    /// Exact-path lookup.
    pub fn lookup(&self, path: &str) -> Option<(usize, &Kind)> {
        self.kinds.iter().enumerate().find(|(_, kind)| kind.path == path)
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for RegistrationPaths {
    fn default() -> Self {
        Self::truffle()
    }
}

/// Line separator used when rendering merged descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSeparator {
    /// `\r\n` on Windows, `\n` everywhere else.
    #[default]
    Platform,
    Lf,
    CrLf,
}

impl LineSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineSeparator::Platform if cfg!(windows) => "\r\n",
            LineSeparator::Platform | LineSeparator::Lf => "\n",
            LineSeparator::CrLf => "\r\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_pattern_rejects_leading_zero() {
        let kind = Kind::new("language", RegistrationPaths::LANGUAGE_PATH).unwrap();
        assert!(kind.pattern().is_match("language1.id=js"));
        assert!(kind.pattern().is_match("language12.className=com.acme.Foo"));
        assert!(!kind.pattern().is_match("language0.id=js"));
        assert!(!kind.pattern().is_match("language01.id=js"));
        assert!(!kind.pattern().is_match("language1."));
        assert!(!kind.pattern().is_match("language1. id=js"));
        assert!(!kind.pattern().is_match("instrument1.id=js"));
    }

    #[test]
    fn test_kind_name_validation() {
        assert!(Kind::new("", "a").is_err());
        assert!(Kind::new("lang2", "a").is_err());
        assert!(Kind::new("lang.x", "a").is_err());
        assert!(Kind::new("language", "").is_err());
        assert!(Kind::new("file_type", "META-INF/truffle/file_type").is_ok());
    }

    #[test]
    fn test_parse_assignment() {
        let kind = Kind::parse_assignment("tool=META-INF/custom/tool").unwrap();
        assert_eq!(kind.name(), "tool");
        assert_eq!(kind.path(), "META-INF/custom/tool");
        assert!(matches!(
            Kind::parse_assignment("tool"),
            Err(MergeError::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_table_lookup_is_exact() {
        let paths = RegistrationPaths::truffle();
        let (idx, kind) = paths.lookup("META-INF/truffle/instrument").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(kind.name(), "instrument");
        assert!(paths.lookup("/META-INF/truffle/language").is_none());
        assert!(paths.lookup("META-INF/truffle/language/").is_none());
        assert!(paths.lookup("META-INF/truffle/Language").is_none());
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let a = Kind::new("language", "x").unwrap();
        let b = Kind::new("language", "y").unwrap();
        let c = Kind::new("tool", "x").unwrap();
        assert!(RegistrationPaths::new(vec![a.clone(), b]).is_err());
        assert!(RegistrationPaths::new(vec![a, c]).is_err());
    }

    #[test]
    fn test_line_separator() {
        assert_eq!(LineSeparator::Lf.as_str(), "\n");
        assert_eq!(LineSeparator::CrLf.as_str(), "\r\n");
        if cfg!(windows) {
            assert_eq!(LineSeparator::Platform.as_str(), "\r\n");
        } else {
            assert_eq!(LineSeparator::Platform.as_str(), "\n");
        }
    }
}
