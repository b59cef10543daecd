/// Seeding pipeline tests
///
/// Corpus -> users -> bounded per-user game batches -> ratings.
/// Run with: cargo test --test seed_pipeline_tests
mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{GAMES, InstrumentedStore, USERS, templates, users};
use user_game_api::core::RecordId;
use user_game_api::game::{Game, USER_ID_FIELD};
use user_game_api::logging::LogHandle;
use user_game_api::seed::{BatchSize, Corpus, SeedError, SeedOptions, Seeder};
use user_game_api::storage::{DocumentStore, Filter, FindOptions, InMemoryStore};
use user_game_api::user::User;

fn options(min: usize, span: usize, max_inflight: usize) -> SeedOptions {
    SeedOptions {
        users_collection: USERS.to_string(),
        games_collection: GAMES.to_string(),
        batch: BatchSize::new(min, span),
        max_inflight,
        deadline: Duration::from_secs(60),
    }
}

async fn seeded_users(store: &dyn DocumentStore) -> Vec<User> {
    store
        .find(USERS, &Filter::All, &FindOptions::new())
        .await
        .unwrap()
        .iter()
        .map(|doc| User::from_document(doc).unwrap())
        .collect()
}

async fn games_per_owner(store: &dyn DocumentStore) -> HashMap<RecordId, i64> {
    let mut counts = HashMap::new();
    for doc in store.find(GAMES, &Filter::All, &FindOptions::new()).await.unwrap() {
        let game = Game::from_document(&doc).unwrap();
        *counts.entry(game.user_id).or_insert(0) += 1;
    }
    counts
}

#[tokio::test]
async fn test_two_users_fixed_batch_of_ten() {
    let store = Arc::new(InMemoryStore::new());
    let seeder = Seeder::new(store.clone(), options(10, 0, 4), &LogHandle::disabled());

    let report = seeder
        .run(Corpus::new(users(2), templates()))
        .await
        .unwrap();
    assert_eq!(report.users, 2);
    assert_eq!(report.games, 20);

    let seeded = seeded_users(&*store).await;
    assert_eq!(seeded.len(), 2);
    for user in &seeded {
        let id = user.id.unwrap();
        assert_eq!(user.rating, 10);
        let owned = store
            .count(GAMES, &Filter::eq(USER_ID_FIELD, id))
            .await
            .unwrap();
        assert_eq!(owned, 10);
    }
}

#[tokio::test]
async fn test_batches_respect_bounds_and_ratings_match() {
    let store = Arc::new(InMemoryStore::new());
    let batch = BatchSize::new(3, 4);
    let seeder = Seeder::new(store.clone(), options(3, 4, 3), &LogHandle::disabled());

    let report = seeder
        .run(Corpus::new(users(12), templates()))
        .await
        .unwrap();

    let seeded = seeded_users(&*store).await;
    let counts = games_per_owner(&*store).await;
    let (low, high) = batch.bounds();

    assert_eq!(seeded.len(), 12);
    assert_eq!(counts.values().sum::<i64>() as usize, report.games);

    for user in &seeded {
        let owned = counts.get(&user.id.unwrap()).copied().unwrap_or(0);
        assert!(
            (low as i64..=high as i64).contains(&owned),
            "user {} has {} games",
            user.last_name,
            owned
        );
        assert_eq!(user.rating, owned, "rating must equal game count");
    }

    // No game points at a user that was not inserted in this run.
    let known: Vec<RecordId> = seeded.iter().filter_map(|u| u.id).collect();
    assert!(counts.keys().all(|owner| known.contains(owner)));
}

#[tokio::test]
async fn test_owner_index_exists_after_seed() {
    let store = Arc::new(InMemoryStore::new());
    let seeder = Seeder::new(store.clone(), options(1, 0, 2), &LogHandle::disabled());
    seeder.run(Corpus::new(users(3), templates())).await.unwrap();

    assert!(!store.create_index(GAMES, USER_ID_FIELD).await.unwrap());
    assert!(!seeder.ensure_indexes().await.unwrap());
}

#[tokio::test]
async fn test_inflight_inserts_never_exceed_capacity() {
    let store = Arc::new(InstrumentedStore::new(Duration::from_millis(10)));
    let seeder = Seeder::new(store.clone(), options(2, 0, 3), &LogHandle::disabled());

    let report = seeder
        .run(Corpus::new(users(20), templates()))
        .await
        .unwrap();

    assert_eq!(report.games, 40);
    assert!(store.peak() <= 3, "peak in-flight inserts was {}", store.peak());
    assert!(store.peak() >= 2, "pool never ran tasks side by side");
}

#[tokio::test]
async fn test_store_failure_aborts_the_run() {
    let store = Arc::new(InstrumentedStore::failing_on(GAMES));
    let seeder = Seeder::new(store.clone(), options(5, 0, 2), &LogHandle::disabled());

    let err = seeder
        .run(Corpus::new(users(6), templates()))
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Store(_)), "unexpected error: {err}");

    // Users were written, but no rating was recorded for a failed batch.
    let seeded = seeded_users(&*store).await;
    assert_eq!(seeded.len(), 6);
    assert!(seeded.iter().all(|u| u.rating == 0));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_stops_a_slow_run() {
    let store = Arc::new(InstrumentedStore::new(Duration::from_secs(3600)));
    let mut opts = options(1, 0, 2);
    opts.deadline = Duration::from_secs(5);
    let seeder = Seeder::new(store, opts, &LogHandle::disabled());

    let err = seeder
        .run(Corpus::new(users(2), templates()))
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Deadline(d) if d == Duration::from_secs(5)));
}

#[tokio::test]
async fn test_missing_corpus_writes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let seeder = Seeder::new(store.clone(), options(1, 0, 1), &LogHandle::disabled());

    let err = seeder
        .run_from_files("/no/such/users.json", "/no/such/games.json")
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Corpus { .. }));
    assert!(store.collection_names().await.is_empty());
}

#[tokio::test]
async fn test_seed_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let users_path = dir.path().join("users.json");
    let games_path = dir.path().join("games.json");
    std::fs::write(
        &users_path,
        r#"{"objects":[
            {"email":"a@x.io","last_name":"Shevchenko","country":"UA","city":"Lviv","gender":"Male","birth_date":"9-3-1994"},
            {"email":"b@x.io","last_name":"Kovalenko","country":"UA","city":"Odesa","gender":"Female","birth_date":"11/23/1988"}
        ]}"#,
    )
    .unwrap();
    std::fs::write(
        &games_path,
        r#"{"objects":[{"points_gained":4,"win_status":1,"game_type":2,"created":"3/14/2021 1:59 PM"}]}"#,
    )
    .unwrap();

    let store = Arc::new(InMemoryStore::new());
    let seeder = Seeder::new(store.clone(), options(7, 0, 2), &LogHandle::disabled());
    let report = seeder.run_from_files(&users_path, &games_path).await.unwrap();

    assert_eq!(report.users, 2);
    assert_eq!(report.games, 14);
    let seeded = seeded_users(&*store).await;
    assert!(seeded.iter().any(|u| u.last_name == "Kovalenko" && u.rating == 7));
}
