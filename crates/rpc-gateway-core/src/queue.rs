use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rpc_gateway_config::RequestQueueConfig;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds outbound concurrency per network. `max_concurrent` callers hold a permit
/// and run; up to `max_queued` more may wait for one; beyond that, callers are
/// rejected immediately rather than piling up indefinitely.
#[derive(Debug)]
pub struct RequestQueue {
    semaphore: Arc<Semaphore>,
    max_queued: usize,
    queued: AtomicUsize,
}

#[derive(Debug)]
pub struct QueueTicket {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl RequestQueue {
    pub fn new(config: &RequestQueueConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            max_queued: config.max_queued,
            queued: AtomicUsize::new(0),
        }
    }

    /// Waits for a free slot, unless the queue is already at capacity, in which
    /// case it rejects immediately rather than growing the wait line further.
    pub async fn acquire(&self) -> Result<QueueTicket, QueueFull> {
        if self.semaphore.available_permits() == 0 {
            if self.queued.fetch_add(1, Ordering::SeqCst) >= self.max_queued {
                self.queued.fetch_sub(1, Ordering::SeqCst);
                return Err(QueueFull);
            }
            let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Ok(QueueTicket { _permit: permit });
        }
        let permit = self.semaphore.clone().acquire_owned().await.expect("semaphore never closed");
        Ok(QueueTicket { _permit: permit })
    }
}
