use std::sync::Arc;
use std::time::Duration;

use crate::game::{DocumentGameRepository, GameService};
use crate::logging::LogHandle;
use crate::storage::DocumentStore;
use crate::user::{DocumentUserRepository, UserService};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub games: Arc<GameService>,
}

impl AppState {
    pub fn new(users: Arc<UserService>, games: Arc<GameService>) -> Self {
        Self { users, games }
    }

    /// Wires both services over one shared store.
    pub fn over_store(
        store: Arc<dyn DocumentStore>,
        users_collection: &str,
        games_collection: &str,
        op_timeout: Duration,
        log: &LogHandle,
    ) -> Self {
        let users = DocumentUserRepository::new(store.clone(), users_collection, op_timeout, log);
        let games = DocumentGameRepository::new(store, games_collection, op_timeout, log);
        Self::new(
            Arc::new(UserService::new(Arc::new(users), log)),
            Arc::new(GameService::new(Arc::new(games), log)),
        )
    }
}
