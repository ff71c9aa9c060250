use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use unlock_core::game_trait::GameResult;
use unlock_core::time::to_iso8601;

use crate::error::StoreError;

/// Key under which an invite's result is kept.
pub fn result_key(invite_id: &str) -> String {
    format!("catch_result_{invite_id}")
}

/// Completed game results keyed by invite, optionally backed by a JSON file.
///
/// The file is rewritten whole on every save. A missing file is an empty
/// store; an unreadable or corrupt one is an error.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: BTreeMap<String, GameResult>,
    path: Option<PathBuf>,
}

impl ResultStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let results = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            },
        };
        tracing::debug!(path = %path.display(), count = results.len(), "Opened result store");
        Ok(Self {
            results,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn get(&self, invite_id: &str) -> Option<&GameResult> {
        self.results.get(&result_key(invite_id))
    }

    /// Record `result` for `invite_id`, replacing any earlier one, and
    /// persist if file-backed.
    pub fn save(&mut self, invite_id: &str, result: GameResult) -> Result<(), StoreError> {
        tracing::info!(
            invite = invite_id,
            game = %result.game,
            label = %result.label,
            completed_at = %to_iso8601(&result.completed_at),
            "Saving result"
        );
        self.results.insert(result_key(invite_id), result);
        self.flush()
    }

    pub fn remove(&mut self, invite_id: &str) -> Result<Option<GameResult>, StoreError> {
        let removed = self.results.remove(&result_key(invite_id));
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let encoded = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(path, encoded).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unlock_core::game_registry::GameTypeId;

    #[test]
    fn key_format() {
        assert_eq!(result_key("abc123"), "catch_result_abc123");
    }

    #[test]
    fn in_memory_save_and_replace() {
        let mut store = ResultStore::in_memory();
        assert!(store.is_empty());
        store
            .save("inv", GameResult::new(GameTypeId::Wheel, "Yes"))
            .unwrap();
        store
            .save("inv", GameResult::new(GameTypeId::Wheel, "Obviously"))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("inv").unwrap().label, "Obviously");
        assert!(store.get("other").is_none());
    }
}
