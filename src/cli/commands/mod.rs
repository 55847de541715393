//! CLI command implementations.

pub mod paper;
pub mod run;
pub mod status;
pub mod strategies;
pub mod validate;
