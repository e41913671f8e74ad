use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::Shared;
use tracing::debug;

type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type SharedFuture<T> = Shared<BoxedFuture<T>>;

/// Collapses concurrent identical requests onto a single in-flight upstream call.
/// Keyed by the request fingerprint; the first caller for a key populates the
/// entry and drives the work, later callers for the same key await its result.
#[derive(Debug)]
pub struct Coalescer<T: Clone + Send + Sync + 'static> {
    in_flight: Arc<DashMap<String, SharedFuture<T>>>,
    /// Safety net: if the driving future never removes itself (panic, or a future
    /// which nobody polls to completion), the entry is dropped after this long.
    stale_after: Duration,
}

impl<T: Clone + Send + Sync + 'static> Coalescer<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self { in_flight: Arc::new(DashMap::new()), stale_after }
    }

    /// Runs `make_future` for `key` if no call for that key is already in flight,
    /// otherwise awaits the in-flight one. Returns `(value, was_coalesced)`.
    pub async fn run<F>(&self, key: String, make_future: F) -> (T, bool)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (shared, coalesced) = match self.in_flight.entry(key.clone()) {
            dashmap::Entry::Occupied(entry) => (entry.get().clone(), true),
            dashmap::Entry::Vacant(entry) => {
                let boxed: BoxedFuture<T> = make_future.boxed();
                let shared = boxed.shared();
                entry.insert(shared.clone());

                let in_flight = self.in_flight.clone();
                let cleanup_shared = shared.clone();
                let cleanup_key = key.clone();
                let stale_after = self.stale_after;
                tokio::spawn(async move {
                    let completed = tokio::select! {
                        _ = cleanup_shared => true,
                        _ = tokio::time::sleep(stale_after) => false,
                    };
                    debug!(key = %cleanup_key, completed, "removing coalesced entry");
                    in_flight.remove(&cleanup_key);
                });

                (shared, false)
            }
        };

        (shared.await, coalesced)
    }
}
