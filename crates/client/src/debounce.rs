//! Trailing-edge debounce for search-as-you-type.
//!
//! Calls inside one window collapse into the last one. A call that has fired
//! is never cancelled, so responses may arrive out of order; each firing gets
//! a [`Ticket`] the caller can check to drop a stale response.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::{ClientConfig, DEFAULT_SEARCH_DEBOUNCE_MS};

/// Identifies one debounced call.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `false` once a newer call has been scheduled on the same debouncer.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Debouncer using the configured search window (`HMIS_SEARCH_DEBOUNCE_MS`).
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.search_debounce)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `f` to run after the debounce window.
    ///
    /// The handle resolves to `None` when a later call superseded this one
    /// before the window elapsed, otherwise to the output of `f`.
    pub fn call<F, Fut>(&self, f: F) -> JoinHandle<Option<Fut::Output>>
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != generation {
                tracing::trace!(generation, "debounced call superseded");
                return None;
            }
            Some(f(Ticket { generation, latest }).await)
        })
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS))
    }
}
