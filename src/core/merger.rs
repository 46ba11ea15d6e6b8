// This module provides RegistrationMerger, the component that takes part in building one
// archive. It is a small state machine: open() starts accumulating, add() routes each entry
// either into a per-kind list of contribution blocks (registration descriptors) or back to
// the caller as not handled (ordinary files), and close() renumbers every kind that received
// at least one block. A rejected descriptor moves the merger into a failed state in which
// every later call errors, so a partial registry is never emitted. A merger is scoped to a
// single archive; once closed it refuses further use, so accumulated state can never leak
// from one archive into the next.

//! Per-archive registration merger.

use super::descriptor::ContributionBlock;
use super::error::{MergeError, MergeResult};
use super::kind::{LineSeparator, RegistrationPaths};
use super::registry::MergedRegistry;

#[derive(Debug)]
enum State {
    Fresh,
    Accumulating {
        archive: String,
        /// Blocks per kind, indexed like the registration table.
        blocks: Vec<Vec<ContributionBlock>>,
    },
    /// A descriptor was rejected; nothing from this archive may be emitted.
    Failed {
        archive: String,
        reason: String,
    },
    Closed,
}

/// Merges the registration descriptors of every module entering one archive.
#[derive(Debug)]
pub struct RegistrationMerger {
    paths: RegistrationPaths,
    separator: LineSeparator,
    state: State,
}

impl RegistrationMerger {
    pub fn new(paths: RegistrationPaths) -> Self {
        Self {
            paths,
            separator: LineSeparator::default(),
            state: State::Fresh,
        }
    }

    /// Use `separator` when rendering merged descriptors.
    pub fn with_separator(mut self, separator: LineSeparator) -> Self {
        self.separator = separator;
        self
    }

    pub fn paths(&self) -> &RegistrationPaths {
        &self.paths
    }

    pub fn separator(&self) -> LineSeparator {
        self.separator
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Start accumulating for `archive`.
    pub fn open(&mut self, archive: &str) -> MergeResult<()> {
        match self.state {
            State::Fresh => {
                log::debug!("registration merger opened for {}", archive);
                self.state = State::Accumulating {
                    archive: archive.to_string(),
                    blocks: vec![Vec::new(); self.paths.len()],
                };
                Ok(())
            }
            State::Accumulating { .. } => Err(MergeError::AlreadyOpened),
            State::Failed { .. } => Err(self.aborted()),
            State::Closed => Err(MergeError::Reused),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed { .. })
    }

    fn aborted(&self) -> MergeError {
        match &self.state {
            State::Failed { archive, reason } => MergeError::Aborted {
                archive: archive.clone(),
                reason: reason.clone(),
            },
            _ => MergeError::Reused,
        }
    }

    /// Offer an entry. Returns `true` if it was consumed as a registration
    /// descriptor, in which case it must not be copied into the archive.
    pub fn add(&mut self, path: &str, contents: &[u8]) -> MergeResult<bool> {
        match self.state {
            State::Failed { .. } => return Err(self.aborted()),
            State::Closed => return Err(MergeError::Reused),
            State::Fresh | State::Accumulating { .. } => {}
        }

        let Some((idx, kind)) = self.paths.lookup(path) else {
            return Ok(false);
        };
        if matches!(self.state, State::Fresh) {
            return Err(MergeError::NotOpened {
                path: path.to_string(),
            });
        }

        let parsed = std::str::from_utf8(contents)
            .map_err(|_| MergeError::InvalidEncoding {
                path: path.to_string(),
            })
            .and_then(|text| ContributionBlock::parse(kind, path, text));

        let block = match parsed {
            Ok(block) => block,
            Err(e) => {
                let archive = match std::mem::replace(&mut self.state, State::Closed) {
                    State::Accumulating { archive, .. } => archive,
                    _ => String::new(),
                };
                log::debug!("{}: merge aborted: {}", archive, e);
                self.state = State::Failed {
                    archive,
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };

        if let State::Accumulating { blocks, .. } = &mut self.state {
            log::debug!(
                "{}: {} {} registration(s) in block {}",
                path,
                block.key_count(),
                kind.name(),
                blocks[idx].len() + 1
            );
            blocks[idx].push(block);
        }
        Ok(true)
    }

    /// Entries of the accompanying sources archive are never merged.
    pub fn add_source(&mut self, _path: &str, _contents: &[u8]) -> bool {
        false
    }

    /// Renumber every kind that received at least one block.
    ///
    /// Registries come back in registration table order. The merger is
    /// unusable afterwards. After a rejected descriptor this errors and
    /// emits nothing.
    pub fn close(&mut self) -> MergeResult<Vec<MergedRegistry>> {
        if self.is_failed() {
            return Err(self.aborted());
        }
        let (archive, blocks) = match std::mem::replace(&mut self.state, State::Closed) {
            State::Accumulating { archive, blocks } => (archive, blocks),
            State::Fresh => {
                // Nothing was ever offered; closing an unopened merger still retires it.
                return Ok(Vec::new());
            }
            State::Failed { .. } | State::Closed => return Err(MergeError::Reused),
        };

        let registries: Vec<MergedRegistry> = self
            .paths
            .kinds()
            .iter()
            .zip(blocks)
            .filter(|(_, blocks)| !blocks.is_empty())
            .map(|(kind, blocks)| MergedRegistry::from_blocks(kind, &blocks))
            .collect();

        for registry in &registries {
            log::info!(
                "{}: merged {} {} registration(s) into {}",
                archive,
                registry.len(),
                registry.kind().name(),
                registry.kind().path()
            );
        }
        Ok(registries)
    }
}
