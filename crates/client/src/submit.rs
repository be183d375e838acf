//! Form submission guards.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::{ClientError, ClientResult};

/// Allows one in-flight submission per form.
///
/// A second submit while the first is running is rejected with
/// [`ClientError::AlreadySubmitting`] instead of being sent.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    in_flight: Arc<AtomicBool>,
}

struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives the "processing" state of the submit button.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `submit` unless another submission is in flight. The guard is
    /// released when `submit` finishes, whatever its outcome.
    pub async fn run<T, Fut>(&self, submit: Fut) -> ClientResult<T>
    where
        Fut: Future<Output = ClientResult<T>>,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("submit ignored: previous submission still in flight");
            return Err(ClientError::AlreadySubmitting);
        }
        let _in_flight = InFlight(Arc::clone(&self.in_flight));
        submit.await
    }
}

/// Asks the user before a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed answer; for non-interactive callers and tests.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "auto-confirm");
        self.0
    }
}

/// Fails with [`ClientError::NotConfirmed`] unless the user agrees.
pub async fn require_confirmation(confirm: &dyn Confirm, prompt: &str) -> ClientResult<()> {
    if confirm.confirm(prompt).await {
        Ok(())
    } else {
        tracing::info!(prompt, "action cancelled by user");
        Err(ClientError::NotConfirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn rejects_overlapping_submit() {
        let guard = SubmitGuard::new();
        let slow = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run(async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Ok::<_, ClientError>("saved")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(guard.is_processing());

        let second = guard.run(async { Ok::<_, ClientError>("duplicate") }).await;
        assert!(matches!(second, Err(ClientError::AlreadySubmitting)));

        assert_eq!(slow.await.unwrap().unwrap(), "saved");
        assert!(!guard.is_processing());
    }

    #[tokio::test]
    async fn guard_is_released_after_failure() {
        let guard = SubmitGuard::new();
        let failed = guard
            .run(async { Err::<(), _>(ClientError::Api(500, "boom".into())) })
            .await;
        assert!(failed.is_err());
        assert!(guard.run(async { Ok::<_, ClientError>(()) }).await.is_ok());
    }

    #[tokio::test]
    async fn declined_confirmation_blocks_action() {
        let err = require_confirmation(&AutoConfirm(false), "Delete this image?")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotConfirmed));
        assert!(require_confirmation(&AutoConfirm(true), "Delete this image?").await.is_ok());
    }
}
