use super::models::{StoredSong, Submission};
use super::schema::{SUBMISSIONS_DB_VERSION, SUBMISSIONS_SCHEMA};
use super::SubmissionStore;
use crate::matching::AcceptedSong;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteSubmissionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSubmissionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open submissions database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new submissions database at {:?}", path);
            conn.execute_batch(SUBMISSIONS_SCHEMA)?;
            conn.execute(
                &format!("PRAGMA user_version = {}", SUBMISSIONS_DB_VERSION),
                [],
            )?;
        } else {
            let db_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            if db_version != SUBMISSIONS_DB_VERSION {
                anyhow::bail!(
                    "Submissions database version {} is unsupported (expected {})",
                    db_version,
                    SUBMISSIONS_DB_VERSION
                );
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch(SUBMISSIONS_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_submission(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
        let created_at_str: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let songs_json: Option<String> = row.get("songs")?;
        let songs = match songs_json {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            // Legacy row shape, one song in dedicated columns.
            None => {
                let metadata_json: Option<String> = row.get("metadata")?;
                vec![StoredSong {
                    name: row.get::<_, Option<String>>("song_name")?.unwrap_or_default(),
                    url: row.get("song_url")?,
                    fingerprint: row.get("fingerprint")?,
                    metadata: metadata_json.and_then(|j| serde_json::from_str(&j).ok()),
                }]
            }
        };

        Ok(Submission {
            id: row.get("id")?,
            store_code: row.get("store_code")?,
            submitter_name: row.get("submitter_name")?,
            songs,
            created_at,
        })
    }
}

impl SubmissionStore for SqliteSubmissionStore {
    fn insert_submission(&self, submission: &Submission) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let songs_json = serde_json::to_string(&submission.songs)?;

        // The single-song columns mirror the first song so readers of the
        // older row shape still see one song per row.
        let first = submission.songs.first();
        let first_metadata = first
            .and_then(|s| s.metadata.as_ref())
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "INSERT INTO submissions
             (id, store_code, submitter_name, song_name, song_url, fingerprint, metadata, songs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                submission.id,
                submission.store_code,
                submission.submitter_name,
                first.map(|s| s.name.as_str()),
                first.and_then(|s| s.url.as_deref()),
                first.and_then(|s| s.fingerprint.as_deref()),
                first_metadata,
                songs_json,
                submission.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn list_submissions(&self, store_code: &str) -> Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, store_code, submitter_name, song_name, song_url, fingerprint, metadata, songs, created_at
             FROM submissions WHERE store_code = ?1 ORDER BY created_at ASC",
        )?;

        let submissions = stmt
            .query_map(params![store_code], Self::row_to_submission)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(submissions)
    }

    fn accepted_songs(&self, store_code: &str) -> Result<Vec<AcceptedSong>> {
        Ok(self
            .list_submissions(store_code)?
            .iter()
            .flat_map(Submission::to_accepted_songs)
            .collect())
    }

    fn count_submissions(&self, store_code: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM submissions WHERE store_code = ?1",
            params![store_code],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
