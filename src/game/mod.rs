pub mod handlers;
pub mod model;
pub mod repository;
pub mod service;

pub use model::{DayCount, DayTypeCount, Game, GamesStatistics, USER_ID_FIELD};
pub use repository::{DocumentGameRepository, GameRepository, statistics_pipeline};
pub use service::GameService;
