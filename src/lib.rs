//! Songdrop Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod jobs;
pub mod matching;
pub mod server;
pub mod submission_store;

// Re-export commonly used types for convenience
pub use matching::{DuplicateChecker, MatchingConfig, MetadataResolver, SystemMediaTools};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use submission_store::{SqliteSubmissionStore, SubmissionStore};
