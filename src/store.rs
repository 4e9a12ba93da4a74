use crate::recorder::RecordedSequence;
use std::path::{Path, PathBuf};

pub const SEQUENCES_FILE: &str = "sequences.json";

/// Flat JSON store of recorded sequences keyed by name. The whole collection
/// is read and rewritten on every mutation; `save` is an upsert and `delete`
/// filters by name.
pub struct SequenceStore {
    path: PathBuf,
}

impl SequenceStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SEQUENCES_FILE),
        }
    }

    /// Platform data directory for the default store location.
    pub fn default_dir() -> PathBuf {
        dirs_next::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("click_pilot")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored sequence. A missing or unreadable file yields an
    /// empty list so a fresh profile starts clean.
    pub fn load(&self) -> Vec<RecordedSequence> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(sequences) => sequences,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn save(&self, sequence: &RecordedSequence) -> anyhow::Result<()> {
        let mut sequences = self.load();
        match sequences.iter_mut().find(|s| s.name == sequence.name) {
            Some(existing) => *existing = sequence.clone(),
            None => sequences.push(sequence.clone()),
        }
        self.persist(&sequences)
    }

    pub fn delete(&self, name: &str) -> anyhow::Result<()> {
        let sequences: Vec<RecordedSequence> =
            self.load().into_iter().filter(|s| s.name != name).collect();
        self.persist(&sequences)
    }

    fn persist(&self, sequences: &[RecordedSequence]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(sequences)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
