// ============================================================================
// user-game-api
// ============================================================================
//
// Users, their seeded game history, and the read API over both. Data lives in
// an in-process document store that can be snapshotted to disk.

pub mod config;
pub mod core;
pub mod game;
pub mod logging;
pub mod seed;
pub mod storage;
pub mod user;
pub mod web;

pub use core::{Document, RecordId, StoreError, Value};
pub use seed::{SeedError, SeedOptions, SeedReport, Seeder};
pub use storage::{DocumentStore, InMemoryStore, SnapshotManager};
pub use web::{AppState, build_router};
