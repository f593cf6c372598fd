use std::sync::Arc;

use tracing::{info, warn};

use storage::keys;
use storage::repository::{LocalStore, StorageError};
use vocab_core::model::Difficulty;

/// Best game score per difficulty, persisted under `highScore_<difficulty>`.
#[derive(Clone)]
pub struct HighScoreService {
    store: Arc<dyn LocalStore>,
}

impl HighScoreService {
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Stored best score, or 0 if none is stored or it cannot be read.
    pub async fn get(&self, difficulty: Difficulty) -> u32 {
        let key = keys::high_score(difficulty);
        match self.store.get_item(&key).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(%key, %raw, "ignoring unreadable high score");
                0
            }),
            Ok(None) => 0,
            Err(err) => {
                warn!(%key, error = %err, "could not read high score");
                0
            }
        }
    }

    /// Store `score` if it beats the stored best. Returns whether it did.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new best cannot be written.
    pub async fn submit(&self, difficulty: Difficulty, score: u32) -> Result<bool, StorageError> {
        if score <= self.get(difficulty).await {
            return Ok(false);
        }
        self.store
            .set_item(&keys::high_score(difficulty), &score.to_string())
            .await?;
        info!(%difficulty, score, "new high score");
        Ok(true)
    }
}
