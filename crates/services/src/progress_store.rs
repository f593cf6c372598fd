use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storage::keys;
use storage::repository::LocalStore;
use vocab_core::model::{MissedWord, ProgressFormat, ProgressRecord, QuizResult, WordEntry};

use crate::Clock;
use crate::error::ProgressStoreError;

/// Write-through owner of the persisted `ProgressRecord`.
///
/// Every mutation updates the in-memory record and writes the whole record
/// back before the lock is released, so mutations never interleave and a
/// reload loses at most the mutation that was in flight.
pub struct ProgressStore {
    store: Arc<dyn LocalStore>,
    record: Mutex<ProgressRecord>,
}

impl ProgressStore {
    /// Load the persisted record.
    ///
    /// Missing, unreadable or corrupt data yields an empty record; the cause
    /// is logged and never surfaced.
    pub async fn load(store: Arc<dyn LocalStore>, clock: Clock) -> Self {
        let record = match store.get_item(keys::PROGRESS).await {
            Ok(Some(json)) => match ProgressRecord::from_json(&json, clock.now()) {
                Ok((record, ProgressFormat::Current)) => record,
                Ok((record, format)) => {
                    info!(?format, words = record.len(), "migrating legacy progress record");
                    record
                }
                Err(err) => {
                    warn!(error = %err, "stored progress is corrupt, starting empty");
                    ProgressRecord::new()
                }
            },
            Ok(None) => ProgressRecord::new(),
            Err(err) => {
                warn!(error = %err, "could not read stored progress, starting empty");
                ProgressRecord::new()
            }
        };

        Self {
            store,
            record: Mutex::new(record),
        }
    }

    /// Current in-memory record.
    pub async fn snapshot(&self) -> ProgressRecord {
        self.record.lock().await.clone()
    }

    /// Count a miss for `entry` and persist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if the record cannot be written. The
    /// in-memory record keeps the update either way.
    pub async fn record_miss(
        &self,
        entry: &WordEntry,
        at: DateTime<Utc>,
    ) -> Result<MissedWord, ProgressStoreError> {
        let mut record = self.record.lock().await;
        let missed = record.record_miss(entry, at).clone();
        debug!(word = %missed.word, missed_count = missed.missed_count, "recorded miss");
        self.persist(&record).await?;
        Ok(missed)
    }

    /// Append a completed quiz to the history and persist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if the record cannot be written.
    pub async fn record_quiz_completion(
        &self,
        result: QuizResult,
    ) -> Result<(), ProgressStoreError> {
        let mut record = self.record.lock().await;
        debug!(score = result.score, total = result.total, kind = ?result.kind, "recorded quiz");
        record.record_completion(result);
        self.persist(&record).await
    }

    /// Forget all progress, in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError` if the persisted copy cannot be removed;
    /// the in-memory record is then left untouched.
    pub async fn clear_all(&self) -> Result<(), ProgressStoreError> {
        let mut record = self.record.lock().await;
        if let Err(err) = self.store.remove_item(keys::PROGRESS).await {
            warn!(error = %err, "failed to clear stored progress");
            return Err(err.into());
        }
        record.clear();
        info!("cleared all progress");
        Ok(())
    }

    async fn persist(&self, record: &ProgressRecord) -> Result<(), ProgressStoreError> {
        let json = record.to_json()?;
        if let Err(err) = self.store.set_item(keys::PROGRESS, &json).await {
            warn!(error = %err, "failed to persist progress");
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use storage::repository::{InMemoryStore, StorageError};
    use vocab_core::model::QuizKind;
    use vocab_core::time::{fixed_clock, fixed_now};

    async fn store_with(json: Option<&str>) -> (Arc<InMemoryStore>, ProgressStore) {
        let backing = Arc::new(InMemoryStore::new());
        if let Some(json) = json {
            backing.set_item(keys::PROGRESS, json).await.unwrap();
        }
        let store = ProgressStore::load(backing.clone(), fixed_clock()).await;
        (backing, store)
    }

    #[tokio::test]
    async fn missing_record_loads_empty() {
        let (_, store) = store_with(None).await;
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_loads_empty() {
        let (_, store) = store_with(Some("{not json")).await;
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn record_miss_twice_adds_two_and_keeps_latest_time() {
        let (backing, store) = store_with(None).await;
        let entry = WordEntry::new("candid", "Truthful");
        let first = fixed_now();
        let second = first + Duration::seconds(30);

        store.record_miss(&entry, first).await.unwrap();
        let missed = store.record_miss(&entry, second).await.unwrap();
        assert_eq!(missed.missed_count, 2);
        assert_eq!(missed.last_missed, second);

        // Written through: a fresh load sees the same record.
        let reloaded = ProgressStore::load(backing, fixed_clock()).await;
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn completions_append_to_history() {
        let (_, store) = store_with(None).await;
        store
            .record_quiz_completion(QuizResult::new(3, 5, fixed_now(), QuizKind::Custom))
            .await
            .unwrap();
        store
            .record_quiz_completion(QuizResult::new(5, 5, fixed_now(), QuizKind::Daily))
            .await
            .unwrap();
        let history = store.snapshot().await.history().to_vec();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_perfect());
    }

    #[tokio::test]
    async fn clear_all_then_load_is_empty() {
        let (backing, store) = store_with(None).await;
        store
            .record_miss(&WordEntry::new("terse", "Brief"), fixed_now())
            .await
            .unwrap();
        store.clear_all().await.unwrap();

        assert!(store.snapshot().await.is_empty());
        assert_eq!(backing.get_item(keys::PROGRESS).await.unwrap(), None);
        let reloaded = ProgressStore::load(backing, fixed_clock()).await;
        assert!(reloaded.snapshot().await.is_empty());
    }

    /// Reads and writes work; removal always fails.
    struct StuckStore(InMemoryStore);

    #[async_trait]
    impl LocalStore for StuckStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set_item(key, value).await
        }

        async fn remove_item(&self, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk unavailable".to_owned()))
        }
    }

    #[tokio::test]
    async fn failed_clear_keeps_memory_in_line_with_disk() {
        let backing = Arc::new(StuckStore(InMemoryStore::new()));
        let store = ProgressStore::load(backing.clone(), fixed_clock()).await;
        store
            .record_miss(&WordEntry::new("terse", "Brief"), fixed_now())
            .await
            .unwrap();

        assert!(matches!(
            store.clear_all().await,
            Err(ProgressStoreError::Storage(_))
        ));
        assert_eq!(store.snapshot().await.len(), 1);

        let reloaded = ProgressStore::load(backing, fixed_clock()).await;
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn legacy_record_is_rewritten_on_next_write() {
        let legacy = r#"{"candid": {"word": "candid", "meaning": "Truthful", "missedCount": 4, "lastMissed": "2024-01-01T00:00:00.000Z"}}"#;
        let (backing, store) = store_with(Some(legacy)).await;
        assert_eq!(store.snapshot().await.get("candid").unwrap().missed_count, 4);

        store
            .record_miss(&WordEntry::new("candid", "Truthful"), fixed_now())
            .await
            .unwrap();
        let json = backing.get_item(keys::PROGRESS).await.unwrap().unwrap();
        assert!(json.contains("\"version\":2"));
        assert!(json.contains("\"missedCount\":5"));
    }
}
