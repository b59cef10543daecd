pub mod handlers;
pub mod model;
pub mod repository;
pub mod service;

pub use model::{RATING_FIELD, User, UserRating};
pub use repository::{DocumentUserRepository, UserRepository};
pub use service::UserService;
