pub mod document;
pub mod error;
pub mod value;

pub use document::{Document, ID_FIELD, RecordId};
pub use error::{Result, StoreError};
pub use value::{DAY_FORMAT, Value};
