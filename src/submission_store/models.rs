use crate::matching::{AcceptedSong, SongMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One song inside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSong {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub metadata: Option<SongMetadata>,
}

/// A persisted song submission, scoped to one store code.
///
/// Older rows carried a single song in dedicated columns; newer rows carry a
/// song list. The store normalizes both shapes into `songs` on read, so no
/// other code has to know the legacy shape exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub store_code: String,
    #[serde(default)]
    pub submitter_name: Option<String>,
    pub songs: Vec<StoredSong>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        store_code: String,
        submitter_name: Option<String>,
        songs: Vec<StoredSong>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            store_code,
            submitter_name,
            songs,
            created_at: Utc::now(),
        }
    }

    /// Flatten this submission into comparison-set entries.
    pub fn to_accepted_songs(&self) -> Vec<AcceptedSong> {
        self.songs
            .iter()
            .map(|song| AcceptedSong {
                song_name: song.name.clone(),
                url: song.url.clone(),
                fingerprint: song.fingerprint.clone(),
                metadata: song.metadata.clone(),
            })
            .collect()
    }
}
