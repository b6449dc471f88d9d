//! Field registry: path to optional field validator

use crate::validation::FieldValidator;
use std::fmt;
use std::sync::Arc;

/// A registered field validator, as handed to the validation pipeline
pub type RegisteredValidator = (String, Arc<dyn FieldValidator>);

/// Registry entry owned by whichever binding registered the path
#[derive(Clone)]
pub struct FieldEntry {
    pub path: String,
    pub validator: Option<Arc<dyn FieldValidator>>,
}

impl fmt::Debug for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEntry")
            .field("path", &self.path)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Fields currently mounted on a form, in registration order
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    entries: Vec<FieldEntry>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or overwrite the entry for `path` (last writer wins).
    /// An overwritten entry keeps its original position.
    pub fn register(&mut self, path: impl Into<String>, validator: Option<Arc<dyn FieldValidator>>) {
        let path = path.into();
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => entry.validator = validator,
            None => self.entries.push(FieldEntry { path, validator }),
        }
    }

    /// Remove the entry for `path`; returns false if it was not registered
    pub fn unregister(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path != path);
        self.entries.len() != before
    }

    /// Check if a path is registered
    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// The validator registered for `path`, if any
    pub fn validator(&self, path: &str) -> Option<Arc<dyn FieldValidator>> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .and_then(|e| e.validator.clone())
    }

    /// Paths that carry a validator, in registration order
    pub fn validated_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.validator.is_some())
            .map(|e| e.path.as_str())
            .collect()
    }

    /// Snapshot of every path with its validator
    pub fn validated(&self) -> Vec<RegisteredValidator> {
        self.entries
            .iter()
            .filter_map(|e| e.validator.clone().map(|v| (e.path.clone(), v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
