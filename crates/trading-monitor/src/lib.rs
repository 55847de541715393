//! Logging setup and operator notifications.

mod channel;
mod logging;
mod notifier;

pub use channel::NotificationChannel;
pub use logging::{setup_logging, LogFormat, LoggingGuard};
pub use notifier::{LogNotifier, MemoryNotifier, TelegramConfig, TelegramNotifier};
