use storage::keys;
use storage::repository::LocalStore;
use storage::sqlite::SqliteLocalStore;
use storage::Storage;
use vocab_core::model::Difficulty;

#[tokio::test]
async fn sqlite_roundtrip_persists_items() {
    let repo = SqliteLocalStore::open("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("open");

    assert_eq!(repo.get_item(keys::PROGRESS).await.unwrap(), None);

    repo.set_item(keys::PROGRESS, "{\"version\":2,\"words\":{}}")
        .await
        .unwrap();
    repo.set_item(keys::PROGRESS, "{\"version\":2,\"words\":{},\"history\":[]}")
        .await
        .unwrap();

    let stored = repo.get_item(keys::PROGRESS).await.unwrap();
    assert_eq!(
        stored.as_deref(),
        Some("{\"version\":2,\"words\":{},\"history\":[]}")
    );
}

#[tokio::test]
async fn sqlite_remove_is_idempotent() {
    let repo = SqliteLocalStore::connect("sqlite:file:memdb_remove?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let key = keys::high_score(Difficulty::Medium);
    repo.set_item(&key, "42").await.unwrap();
    repo.remove_item(&key).await.unwrap();
    repo.remove_item(&key).await.unwrap();
    assert_eq!(repo.get_item(&key).await.unwrap(), None);
}

#[tokio::test]
async fn migrations_can_run_twice() {
    let repo = SqliteLocalStore::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(repo.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);

    repo.set_item(keys::DAILY_CHALLENGE_COMPLETION, "2024-05-01")
        .await
        .unwrap();
    assert_eq!(
        repo.get_item(keys::DAILY_CHALLENGE_COMPLETION)
            .await
            .unwrap()
            .as_deref(),
        Some("2024-05-01")
    );
}

#[tokio::test]
async fn storage_handle_wraps_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_handle?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.local.set_item("k", "v").await.unwrap();
    assert_eq!(storage.local.get_item("k").await.unwrap().as_deref(), Some("v"));
}
