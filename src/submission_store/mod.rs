mod models;
mod schema;
mod sqlite_store;

pub use models::{StoredSong, Submission};
pub use sqlite_store::SqliteSubmissionStore;

use crate::matching::AcceptedSong;
use anyhow::Result;

pub trait SubmissionStore: Send + Sync {
    fn insert_submission(&self, submission: &Submission) -> Result<()>;
    fn list_submissions(&self, store_code: &str) -> Result<Vec<Submission>>;
    /// All songs accepted for a store, flattened across submissions, in the
    /// shape the duplicate checker consumes.
    fn accepted_songs(&self, store_code: &str) -> Result<Vec<AcceptedSong>>;
    fn count_submissions(&self, store_code: &str) -> Result<usize>;
}
