use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::SeedError;

/// Runs at most `capacity` tasks at once.
///
/// [`spawn`](Self::spawn) waits for a free permit before the task starts, and
/// the task keeps that permit until it finishes. [`join_all`](Self::join_all)
/// is the completion barrier.
pub struct BoundedPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    tasks: JoinSet<Result<(), SeedError>>,
}

impl BoundedPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            tasks: JoinSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    pub async fn spawn<F>(&mut self, task: F) -> Result<(), SeedError>
    where
        F: Future<Output = Result<(), SeedError>> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SeedError::Task("worker pool closed".to_string()))?;

        self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        });
        Ok(())
    }

    /// First error among the tasks that have already finished, if any.
    pub fn take_failure(&mut self) -> Option<SeedError> {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = flatten(joined) {
                return Some(err);
            }
        }
        None
    }

    /// Waits for every task and reports the first failure seen.
    pub async fn join_all(mut self) -> Result<(), SeedError> {
        let mut first = None;
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = flatten(joined) {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

fn flatten(joined: Result<Result<(), SeedError>, JoinError>) -> Result<(), SeedError> {
    joined.map_err(|err| SeedError::Task(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let mut pool = BoundedPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let running = running.clone();
            let peak = peak.clone();
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
            assert!(pool.in_flight() <= pool.capacity());
        }

        pool.join_all().await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn first_failure_is_reported_after_drain() {
        let mut pool = BoundedPool::new(2);
        let finished = Arc::new(AtomicUsize::new(0));

        pool.spawn(async { Err::<(), _>(SeedError::Task("boom".into())) })
            .await
            .unwrap();
        for _ in 0..4 {
            let finished = finished.clone();
            pool.spawn(async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        }

        let err = pool.join_all().await.unwrap_err();
        assert!(matches!(err, SeedError::Task(ref msg) if msg == "boom"));
        assert_eq!(finished.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn panicking_task_becomes_task_error() {
        let mut pool = BoundedPool::new(1);
        pool.spawn(async {
            if true {
                panic!("worker exploded");
            }
            Ok(())
        })
        .await
        .unwrap();
        assert!(matches!(pool.join_all().await, Err(SeedError::Task(_))));
    }

    #[tokio::test]
    async fn take_failure_sees_finished_errors() {
        let mut pool = BoundedPool::new(1);
        pool.spawn(async { Err::<(), _>(SeedError::Task("early".into())) })
            .await
            .unwrap();
        // The permit only frees once the failed task has completed.
        pool.spawn(async { Ok(()) }).await.unwrap();

        let mut seen = None;
        for _ in 0..50 {
            if let Some(err) = pool.take_failure() {
                seen = Some(err);
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(seen, Some(SeedError::Task(_))));
        pool.join_all().await.unwrap();
    }
}
