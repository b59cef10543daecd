//! Bulk seeding: corpus load, user insert, then one bounded game-batch task
//! per user that also writes that user's rating.

pub mod corpus;
pub mod generator;
pub mod pool;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{Instrument, Span, debug, info, warn};

use crate::config::AppConfig;
use crate::core::{Document, RecordId, StoreError};
use crate::game::USER_ID_FIELD;
use crate::logging::LogHandle;
use crate::storage::DocumentStore;
use crate::user::{RATING_FIELD, User};

pub use corpus::{Corpus, GameTemplate, UserTemplate, parse_corpus_date};
pub use generator::{BatchSize, generate_batch};
pub use pool::BoundedPool;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("corpus file {}: {reason}", path.display())]
    Corpus { path: PathBuf, reason: String },
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
    #[error("seed run exceeded its deadline of {0:?}")]
    Deadline(Duration),
    #[error("seed task failed: {0}")]
    Task(String),
}

impl SeedError {
    pub fn corpus(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Corpus {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub users_collection: String,
    pub games_collection: String,
    pub batch: BatchSize,
    pub max_inflight: usize,
    pub deadline: Duration,
}

impl SeedOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            users_collection: config.collection_users.clone(),
            games_collection: config.collection_user_games.clone(),
            batch: BatchSize::new(config.seed.min_batch, config.seed.batch_span),
            max_inflight: config.seed.max_inflight,
            deadline: config.seed.deadline,
        }
    }
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users_collection: "users".to_string(),
            games_collection: "user_games".to_string(),
            batch: BatchSize::default(),
            max_inflight: 16,
            deadline: Duration::from_secs(36_000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub games: usize,
}

pub struct Seeder {
    store: Arc<dyn DocumentStore>,
    options: SeedOptions,
    span: Span,
}

impl Seeder {
    pub fn new(store: Arc<dyn DocumentStore>, options: SeedOptions, log: &LogHandle) -> Self {
        Self {
            store,
            options,
            span: log.component("seeder"),
        }
    }

    pub fn options(&self) -> &SeedOptions {
        &self.options
    }

    /// Loads both corpus files and seeds from them, all under the run deadline.
    pub async fn run_from_files(
        &self,
        users_path: impl AsRef<Path>,
        games_path: impl AsRef<Path>,
    ) -> Result<SeedReport, SeedError> {
        let work = async {
            let corpus = Corpus::load(users_path, games_path).await?;
            self.seed(corpus).await
        };
        self.with_run_deadline(work).await
    }

    pub async fn run(&self, corpus: Corpus) -> Result<SeedReport, SeedError> {
        self.with_run_deadline(self.seed(corpus)).await
    }

    /// Creates the owning-user index on the games collection.
    /// Returns `false` when it was already there.
    pub async fn ensure_indexes(&self) -> Result<bool, SeedError> {
        let created = self
            .store
            .create_index(&self.options.games_collection, USER_ID_FIELD)
            .await?;
        debug!(parent: &self.span, created, field = USER_ID_FIELD, "games index ensured");
        Ok(created)
    }

    /// Inserts all users in one call; ids come back in input order.
    pub async fn insert_users(&self, users: Vec<User>) -> Result<Vec<RecordId>, SeedError> {
        let docs = users.into_iter().map(User::into_document).collect();
        let ids = self
            .store
            .insert_many(&self.options.users_collection, docs)
            .await?;
        info!(parent: &self.span, count = ids.len(), "users inserted");
        Ok(ids)
    }

    async fn with_run_deadline<F>(&self, work: F) -> Result<SeedReport, SeedError>
    where
        F: Future<Output = Result<SeedReport, SeedError>>,
    {
        let deadline = self.options.deadline;
        tokio::time::timeout(deadline, work)
            .await
            .map_err(|_| SeedError::Deadline(deadline))?
    }

    async fn seed(&self, mut corpus: Corpus) -> Result<SeedReport, SeedError> {
        let started = Instant::now();
        let users = std::mem::take(&mut corpus.users);
        let corpus = Arc::new(corpus);

        self.ensure_indexes().await?;
        let owners = self.insert_users(users).await?;

        let games_total = Arc::new(AtomicUsize::new(0));
        let mut pool = BoundedPool::new(self.options.max_inflight);
        let mut failure = None;

        for owner in owners.iter().copied() {
            if let Some(err) = pool.take_failure() {
                failure = Some(err);
                break;
            }

            let task = insert_batch(
                Arc::clone(&self.store),
                Arc::clone(&corpus),
                self.options.clone(),
                owner,
                Arc::clone(&games_total),
            )
            .instrument(self.span.clone());

            if let Err(err) = pool.spawn(task).await {
                failure = Some(err);
                break;
            }
        }

        let drained = pool.join_all().await;
        if let Err(err) = failure.map_or(drained, Err) {
            warn!(parent: &self.span, error = %err, "seed run aborted");
            return Err(err);
        }

        let report = SeedReport {
            users: owners.len(),
            games: games_total.load(Ordering::Relaxed),
        };
        info!(
            parent: &self.span,
            users = report.users,
            games = report.games,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "seed run complete"
        );
        Ok(report)
    }
}

/// One pool task: sample, insert the batch, then record its size as the
/// owner's rating.
async fn insert_batch(
    store: Arc<dyn DocumentStore>,
    corpus: Arc<Corpus>,
    options: SeedOptions,
    owner: RecordId,
    games_total: Arc<AtomicUsize>,
) -> Result<(), SeedError> {
    let batch = {
        let mut rng = rand::thread_rng();
        let quantity = options.batch.draw(&mut rng);
        generate_batch(&corpus, owner, quantity, &mut rng)?
    };
    let quantity = batch.len();

    if quantity > 0 {
        store.insert_many(&options.games_collection, batch).await?;
    }
    store
        .update_one(
            &options.users_collection,
            owner,
            Document::new().with(RATING_FIELD, quantity as i64),
        )
        .await?;

    games_total.fetch_add(quantity, Ordering::Relaxed);
    debug!(%owner, quantity, "games batch inserted");
    Ok(())
}
