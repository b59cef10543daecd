pub mod collection;
pub mod engine;
pub mod filter;
pub mod memory;
pub mod persistence;
pub mod pipeline;

use std::future::Future;
use std::time::Duration;

pub use collection::{Collection, FindOptions};
pub use engine::DocumentStore;
pub use filter::Filter;
pub use memory::InMemoryStore;
pub use persistence::{SnapshotManager, StoreSnapshot};
pub use pipeline::{Expr, Pipeline, SortOrder, Stage};

use crate::core::{Result, StoreError};

/// Bounds a single store call; a stalled backend fails the call with
/// `StoreError::Timeout` instead of hanging the caller.
pub async fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(deadline, op)
        .await
        .map_err(|_| StoreError::Timeout(deadline))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn with_deadline_times_out_stalled_operations() {
        let stalled = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, StoreError>(())
        };
        let err = with_deadline(Duration::from_millis(50), stalled).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }
}
