//! Tagged song fingerprints.
//!
//! A fingerprint is a `kind:value` pair summarizing a song for fast equality
//! checks. Kinds are, in increasing order of reliability: raw URL hash,
//! platform video id, audio content digest. Uploaded files without fpcalc
//! fall back to a content hash of the raw bytes.
//!
//! Persisted as plain `"kind:value"` strings so they survive any storage
//! engine; parsed back into the tagged form for comparison. Equality never
//! crosses kinds.

use super::video_id::PlatformId;
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the hex digest kept for audio fingerprints. The raw fpcalc
/// output is far too long to store per song.
pub const AUDIO_DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FingerprintKind {
    Audio,
    PlatformId,
    UrlHash,
    FileHash,
    /// Legacy or malformed values with no recognized tag.
    Unknown,
}

impl FingerprintKind {
    fn tag(&self) -> &'static str {
        match self {
            FingerprintKind::Audio => "audio",
            FingerprintKind::PlatformId => "yt",
            FingerprintKind::UrlHash => "url",
            FingerprintKind::FileHash => "file",
            FingerprintKind::Unknown => "unknown",
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "audio" => FingerprintKind::Audio,
            "yt" => FingerprintKind::PlatformId,
            "url" => FingerprintKind::UrlHash,
            "file" => FingerprintKind::FileHash,
            _ => FingerprintKind::Unknown,
        }
    }
}

/// A tagged fingerprint value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub kind: FingerprintKind,
    pub value: String,
}

impl Fingerprint {
    pub fn new(kind: FingerprintKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Audio content fingerprint from a raw fpcalc output string.
    pub fn from_raw_audio(raw_fingerprint: &str) -> Self {
        let digest = hex_digest(raw_fingerprint.as_bytes());
        Self::new(FingerprintKind::Audio, &digest[..AUDIO_DIGEST_LEN])
    }

    /// Cheap fingerprint derived from a platform identifier.
    pub fn from_platform_id(id: &PlatformId) -> Self {
        Self::new(FingerprintKind::PlatformId, id.id.clone())
    }

    /// Last-resort fingerprint for URLs with no recognized identifier.
    pub fn from_url(url: &str) -> Self {
        Self::new(FingerprintKind::UrlHash, hex_digest(url.as_bytes()))
    }

    /// Content hash of an uploaded file's raw bytes.
    pub fn from_file_bytes(bytes: &[u8]) -> Self {
        Self::new(FingerprintKind::FileHash, hex_digest(bytes))
    }

    /// Parse the persisted `"kind:value"` form.
    ///
    /// Strings without a separator parse as `unknown` carrying the whole
    /// input, so legacy rows still round-trip and compare among themselves.
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((tag, value)) => {
                let kind = FingerprintKind::from_tag(tag);
                match kind {
                    FingerprintKind::Unknown => Self::new(kind, text),
                    _ => Self::new(kind, value),
                }
            }
            None => Self::new(FingerprintKind::Unknown, text),
        }
    }

    /// Exact-match comparison: identical kind and identical value.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.value)
    }
}

/// Compare two persisted fingerprint strings.
pub fn fingerprints_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    Fingerprint::parse(a).matches(&Fingerprint::parse(b))
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
