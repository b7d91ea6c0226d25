//! Schema module - Configuration and result types for dispatch optimization.

mod config;
mod evolution;

pub use config::*;
pub use evolution::*;
