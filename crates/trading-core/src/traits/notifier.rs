//! Outbound operator notifications.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Delivers human-readable messages to an operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}
