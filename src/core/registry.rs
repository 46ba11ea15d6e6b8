// This module implements the merge/renumber step. Given the contribution blocks collected
// for one kind, in the order they were offered, MergedRegistry walks each block's groups in
// lexicographic key order and assigns sequential keys starting at 1, so the result depends
// only on which blocks were offered and in which order, never on line order inside a
// descriptor or on hash iteration order. Groups with the same original key in different
// blocks are never combined; each becomes its own entry. render() turns the registry back
// into descriptor text with a trailing separator.

//! Sort-then-assign renumbering of contribution blocks.

use super::descriptor::ContributionBlock;
use super::error::MergeResult;
use super::kind::{Kind, LineSeparator};

/// One renumbered group of the merged descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    /// New sequential number, starting at 1.
    pub index: usize,
    /// Key the group had in its contributing descriptor.
    pub original_key: String,
    /// Property suffixes in their original order.
    pub properties: Vec<String>,
}

/// Densely renumbered registrations of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRegistry {
    kind: Kind,
    entries: Vec<MergedEntry>,
}

impl MergedRegistry {
    /// Renumber `blocks`, which must be in offer order.
    pub fn from_blocks(kind: &Kind, blocks: &[ContributionBlock]) -> Self {
        let mut entries = Vec::with_capacity(blocks.iter().map(|b| b.key_count()).sum());

        for block in blocks {
            for (original_key, properties) in block.groups() {
                entries.push(MergedEntry {
                    index: entries.len() + 1,
                    original_key: original_key.to_string(),
                    properties: properties.to_vec(),
                });
            }
        }

        Self {
            kind: kind.clone(),
            entries,
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn entries(&self) -> &[MergedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the descriptor text, one line per property and a trailing separator.
    pub fn render(&self, separator: LineSeparator) -> String {
        let sep = separator.as_str();
        let mut lines = Vec::new();
        for entry in &self.entries {
            let key = self.kind.key(entry.index);
            for prop in &entry.properties {
                lines.push(format!("{key}{prop}"));
            }
        }

        let mut out = lines.join(sep);
        out.push_str(sep);
        out
    }
}

/// Merge descriptor fragments of one kind, offered in slice order.
///
/// Each fragment is parsed as if it were found at the kind's canonical path.
pub fn merge_fragments<S: AsRef<str>>(
    kind: &Kind,
    fragments: &[S],
    separator: LineSeparator,
) -> MergeResult<String> {
    let blocks = fragments
        .iter()
        .map(|text| ContributionBlock::parse(kind, kind.path(), text.as_ref()))
        .collect::<MergeResult<Vec<_>>>()?;
    Ok(MergedRegistry::from_blocks(kind, &blocks).render(separator))
}
