//! Path and token lookup over archived entries

use crate::entry::FileEntry;
use crate::path::{FilePathCase, normalize_path};
use crate::settings::FileIdentifier;
use crate::token::ArchiveFileToken;
use std::collections::HashMap;
use std::fmt;

/// Reason an entry cannot join an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexConflict {
    DuplicatePath,
    DuplicateToken { existing: String },
}

impl fmt::Display for IndexConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePath => f.write_str("duplicate path"),
            Self::DuplicateToken { existing } => write!(f, "token already used by {existing:?}"),
        }
    }
}

/// Entries in insertion order plus path and token maps into that order
#[derive(Debug, Default)]
pub(crate) struct ArchiveIndex {
    entries: Vec<FileEntry>,
    by_path: HashMap<String, usize>,
    by_token: HashMap<ArchiveFileToken, usize>,
}

impl ArchiveIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            by_path: HashMap::with_capacity(capacity),
            by_token: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Check whether an entry with this path and token could be added
    pub fn check(&self, path: &str, token: ArchiveFileToken) -> Result<(), IndexConflict> {
        if self.by_path.contains_key(path) {
            return Err(IndexConflict::DuplicatePath);
        }
        if let Some(&position) = self.by_token.get(&token) {
            return Err(IndexConflict::DuplicateToken {
                existing: self.entries[position].relative_path.clone(),
            });
        }
        Ok(())
    }

    /// Append an entry that passed [`ArchiveIndex::check`]
    pub fn push(&mut self, entry: FileEntry) {
        let position = self.entries.len();
        self.by_path.insert(entry.relative_path.clone(), position);
        self.by_token.insert(entry.token, position);
        self.entries.push(entry);
    }

    pub fn get_by_path(&self, normalized: &str) -> Option<&FileEntry> {
        self.by_path.get(normalized).map(|&i| &self.entries[i])
    }

    pub fn get_by_token(&self, token: ArchiveFileToken) -> Option<&FileEntry> {
        self.by_token.get(&token).map(|&i| &self.entries[i])
    }

    /// Resolve a caller identifier; paths are normalized with `case` first
    pub fn resolve(&self, identifier: &FileIdentifier, case: FilePathCase) -> Option<&FileEntry> {
        match identifier {
            FileIdentifier::Path(path) => {
                let normalized = normalize_path(path, case).ok()?;
                self.get_by_path(&normalized)
            }
            FileIdentifier::Token(token) => self.get_by_token(*token),
        }
    }
}
