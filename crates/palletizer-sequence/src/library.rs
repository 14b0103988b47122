//! Named sequences and their YAML files
//!
//! The library keeps a copy of every saved sequence by name. The rows being
//! edited and executed live in a [`RowStore`] owned by the caller; saving
//! copies them into the library and selecting copies them back.

use crate::row::Row;
use crate::store::RowStore;
use palletizer_core::SequenceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Name of the sequence a fresh library starts with
pub const DEFAULT_SEQUENCE_NAME: &str = "Default";

/// On-disk form of one sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceFile {
    /// Sequence name; the file stem is used when missing
    #[serde(default)]
    pub name: String,
    /// Rows in execution order
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl SequenceFile {
    /// Read a sequence file
    pub fn load(path: &Path) -> Result<Self, SequenceError> {
        let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let mut file: SequenceFile = if text.trim().is_empty() {
            SequenceFile {
                name: String::new(),
                rows: Vec::new(),
            }
        } else {
            serde_yaml::from_str(&text).map_err(|e| io_error(path, e))?
        };
        if file.name.trim().is_empty() {
            file.name = file_stem(path);
        }
        Ok(file)
    }

    /// Write a sequence file
    pub fn save(&self, path: &Path) -> Result<(), SequenceError> {
        let text = serde_yaml::to_string(self).map_err(|e| io_error(path, e))?;
        fs::write(path, text).map_err(|e| io_error(path, e))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn io_error(path: &Path, e: impl std::fmt::Display) -> SequenceError {
    SequenceError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn check_name(name: &str) -> Result<String, SequenceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SequenceError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Table of saved sequences
#[derive(Debug, Clone)]
pub struct SequenceLibrary {
    saved: BTreeMap<String, Vec<Row>>,
    current_name: String,
}

impl SequenceLibrary {
    /// Create a library whose current sequence is `Default`
    pub fn new() -> Self {
        Self {
            saved: BTreeMap::new(),
            current_name: DEFAULT_SEQUENCE_NAME.to_string(),
        }
    }

    /// Name the next save goes to
    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    /// Names of saved sequences, sorted
    pub fn names(&self) -> Vec<String> {
        self.saved.keys().cloned().collect()
    }

    /// Whether a sequence with this name is saved
    pub fn contains(&self, name: &str) -> bool {
        self.saved.contains_key(name)
    }

    /// Rows of a saved sequence
    pub fn saved_rows(&self, name: &str) -> Option<&[Row]> {
        self.saved.get(name).map(Vec::as_slice)
    }

    /// Start a new, empty sequence and make it current
    pub fn new_sequence(&mut self, name: &str, store: &mut RowStore) -> Result<(), SequenceError> {
        let name = check_name(name)?;
        if self.contains(&name) {
            return Err(SequenceError::DuplicateName { name });
        }
        store.clear_all();
        self.saved.insert(name.clone(), Vec::new());
        tracing::info!("Started sequence '{}'", name);
        self.current_name = name;
        Ok(())
    }

    /// Save a copy of the rows under the current name
    pub fn save_current(&mut self, store: &RowStore) -> Result<(), SequenceError> {
        if store.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        self.saved
            .insert(self.current_name.clone(), store.rows().to_vec());
        tracing::info!(
            "Saved sequence '{}' ({} rows)",
            self.current_name,
            store.len()
        );
        Ok(())
    }

    /// Rename the current sequence, then save under the new name
    pub fn save_as(&mut self, name: &str, store: &RowStore) -> Result<(), SequenceError> {
        let name = check_name(name)?;
        if store.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        self.current_name = name;
        self.save_current(store)
    }

    /// Load a saved sequence into the store and make it current
    pub fn select(&mut self, name: &str, store: &mut RowStore) -> Result<usize, SequenceError> {
        let rows = self
            .saved
            .get(name)
            .ok_or_else(|| SequenceError::UnknownSequence {
                name: name.to_string(),
            })?;
        store.replace_rows(rows.clone());
        self.current_name = name.to_string();
        tracing::info!("Selected sequence '{}'", name);
        Ok(store.len())
    }

    /// Write the store's rows to a file under the current name
    pub fn save_to_file(&self, path: &Path, store: &RowStore) -> Result<(), SequenceError> {
        let file = SequenceFile {
            name: self.current_name.clone(),
            rows: store.rows().to_vec(),
        };
        file.save(path)?;
        tracing::info!(
            "Sequence '{}' written to {}",
            self.current_name,
            path.display()
        );
        Ok(())
    }

    /// Read a file into the store and make its sequence current
    ///
    /// On failure the store and the library are left as they were.
    pub fn load_from_file(
        &mut self,
        path: &Path,
        store: &mut RowStore,
    ) -> Result<String, SequenceError> {
        let file = SequenceFile::load(path)?;
        let name = check_name(&file.name)?;

        store.replace_rows(file.rows.clone());
        self.saved.entry(name.clone()).or_insert(file.rows);
        self.current_name = name.clone();
        tracing::info!(
            "Loaded sequence '{}' ({} rows) from {}",
            name,
            store.len(),
            path.display()
        );
        Ok(name)
    }
}

impl Default for SequenceLibrary {
    fn default() -> Self {
        Self::new()
    }
}
