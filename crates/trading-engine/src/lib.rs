//! Trading loop driver.
//!
//! [`TradingLoop`] owns the exchange, the notification channel, the
//! strategy and every piece of mutable state, and advances them one tick
//! at a time. [`StatusReport`] is the read-only counterpart used by the
//! `status` command.

mod inputs;
mod report;
mod scheduler;
mod settings;

pub use inputs::SnapshotBuilder;
pub use report::{InstrumentStatus, StatusReport};
pub use scheduler::{TickOutcome, TradingLoop};
pub use settings::LoopSettings;
