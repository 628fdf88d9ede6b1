pub const SUBMISSIONS_DB_VERSION: i64 = 1;

/// Legacy single-song columns (song_name, song_url, fingerprint, metadata)
/// are kept so databases written by earlier deployments keep loading; new
/// rows store their song list in the songs column.
pub const SUBMISSIONS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS submissions (
    id TEXT PRIMARY KEY,
    store_code TEXT NOT NULL,
    submitter_name TEXT,
    song_name TEXT,
    song_url TEXT,
    fingerprint TEXT,
    metadata TEXT,
    songs TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_store_code ON submissions (store_code);
CREATE INDEX IF NOT EXISTS idx_submissions_created_at ON submissions (created_at);
";
