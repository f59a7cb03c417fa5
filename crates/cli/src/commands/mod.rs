//! Command handlers for the Folio CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chunks;
pub mod documents;
pub mod search;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chunks::ChunksCommand;
pub use search::SearchCommand;
