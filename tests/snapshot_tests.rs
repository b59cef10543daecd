/// Snapshot persistence tests
///
/// The `seed` command saves the store; `serve` loads it back.
/// Run with: cargo test --test snapshot_tests
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{GAMES, USERS, templates, users};
use user_game_api::game::USER_ID_FIELD;
use user_game_api::logging::LogHandle;
use user_game_api::seed::{BatchSize, Corpus, SeedOptions, Seeder};
use user_game_api::storage::{DocumentStore, Filter, FindOptions, InMemoryStore, SnapshotManager};
use user_game_api::user::User;

#[tokio::test]
async fn test_seeded_store_survives_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = SnapshotManager::new(dir.path().join("store.snapshot"));

    let original = Arc::new(InMemoryStore::new());
    let options = SeedOptions {
        users_collection: USERS.to_string(),
        games_collection: GAMES.to_string(),
        batch: BatchSize::new(6, 0),
        max_inflight: 2,
        deadline: Duration::from_secs(30),
    };
    let report = Seeder::new(original.clone(), options, &LogHandle::disabled())
        .run(Corpus::new(users(4), templates()))
        .await
        .unwrap();

    let saved = snapshots.save_store(&original).await.unwrap();
    assert_eq!(saved, report.users + report.games);
    assert!(snapshots.exists());

    let restored = InMemoryStore::new();
    let loaded = snapshots.load_into(&restored).await.unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(restored.collection_names().await, [GAMES, USERS]);

    // Index definitions travel with the snapshot.
    assert!(!restored.create_index(GAMES, USER_ID_FIELD).await.unwrap());

    let docs = restored
        .find(USERS, &Filter::All, &FindOptions::new())
        .await
        .unwrap();
    for doc in &docs {
        let user = User::from_document(doc).unwrap();
        let owned = restored
            .count(GAMES, &Filter::eq(USER_ID_FIELD, user.id.unwrap()))
            .await
            .unwrap();
        assert_eq!(owned as i64, user.rating);
        assert_eq!(owned, 6);
    }
}
