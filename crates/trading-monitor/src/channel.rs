//! Fire-and-forget notification channel.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use trading_core::error::NotifyError;
use trading_core::traits::Notifier;

/// Wraps a [`Notifier`] so that sending never fails and never blocks the
/// caller longer than the timeout.
#[derive(Clone)]
pub struct NotificationChannel {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationChannel {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver `message`. Failures and timeouts are logged and dropped.
    /// Returns whether delivery succeeded.
    pub async fn notify(&self, message: &str) -> bool {
        let result = match tokio::time::timeout(self.timeout, self.notifier.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.timeout)),
        };

        match result {
            Ok(()) => {
                debug!(notifier = self.notifier.name(), "Notification sent");
                true
            }
            Err(e) => {
                warn!(notifier = self.notifier.name(), error = %e, "Notification failed");
                false
            }
        }
    }
}
