//! Command implementations.

/// Batch processing command handler.
pub mod process;
