// This module parses one registration descriptor offered to the merger into a
// ContributionBlock. A descriptor is line oriented: lines starting with '#' are comments,
// empty lines are skipped, and every other line must be a data line of the form
// <kind><n><suffix>, e.g. "language2.className=com.acme.Foo". Data lines are grouped by
// their original enumerated key ("language2"); the groups live in a BTreeMap so that
// iteration is in lexicographic key order, while the property suffixes of one group keep
// the order in which they appeared. Any other line, whitespace-only lines included, is a
// fatal format violation carrying the descriptor path, the 1-based line number and the
// offending text.

//! Registration descriptor parsing.

use std::collections::BTreeMap;

use super::error::{MergeError, MergeResult};
use super::kind::Kind;

/// The grouped data lines contributed by one descriptor for one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionBlock {
    groups: BTreeMap<String, Vec<String>>,
}

impl ContributionBlock {
    /// Parse descriptor `text` found at archive path `path`.
    pub fn parse(kind: &Kind, path: &str, text: &str) -> MergeResult<Self> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (idx, line) in text.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let captures = kind.pattern().captures(line).ok_or_else(|| {
                MergeError::FormatViolation {
                    path: path.to_string(),
                    line_number: idx + 1,
                    line: line.to_string(),
                    pattern: kind.pattern().as_str().to_string(),
                }
            })?;

            let key = &captures[1];
            let suffix = &captures[2];
            log::trace!("{}: {} -> {}{}", path, idx + 1, key, suffix);

            groups
                .entry(key.to_string())
                .or_default()
                .push(suffix.to_string());
        }

        Ok(Self { groups })
    }

    /// Groups in lexicographic order of their original key.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.groups
            .iter()
            .map(|(key, props)| (key.as_str(), props.as_slice()))
    }

    /// Property suffixes recorded under an original key.
    pub fn properties(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Number of distinct original keys.
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
