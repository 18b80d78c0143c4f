use std::path::{Path, PathBuf};

use crate::error::AutofillError;
use crate::memory::memory_model::{MemoryEntry, now_epoch_secs};

/// JSON-file-backed memory store. Loads leniently (missing file means an
/// empty store); writes are explicit via `save`.
pub struct MemoryStore {
    path: Option<PathBuf>,
    entries: Vec<MemoryEntry>,
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, AutofillError> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| AutofillError::JsonParse {
                    context: format!("memory store {}", path.display()),
                    source: e,
                })?
            }
            Err(_) => Vec::new(),
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
        })
    }

    pub fn save(&self) -> Result<(), AutofillError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| AutofillError::JsonSerialize {
                context: "memory store".into(),
                source: e,
            })?;

        std::fs::write(path, json).map_err(|e| AutofillError::Storage {
            context: format!("writing {}", path.display()),
            source: e,
        })
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn insert(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    /// Replace the answer of an existing memory. Missing ids are a
    /// contract violation, not a silent no-op.
    pub fn update_answer(
        &mut self,
        id: &str,
        answer: &str,
        confidence: f32,
    ) -> Result<(), AutofillError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AutofillError::MemoryNotFound { id: id.to_string() })?;

        entry.answer = answer.to_string();
        entry.confidence = entry.confidence.max(confidence);
        entry.metadata.updated_at = now_epoch_secs();
        Ok(())
    }

    pub fn bump_usage(&mut self, id: &str) -> Result<(), AutofillError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AutofillError::MemoryNotFound { id: id.to_string() })?;

        entry.metadata.usage_count += 1;
        Ok(())
    }
}
