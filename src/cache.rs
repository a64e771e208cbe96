use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Wire format for envelope timestamps and pass times:
/// `YYYY-MM-DD HH:MM:SS`, UTC, second precision.
pub mod stamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// A timestamped payload as persisted on disk:
/// `{ "last_updated": "...", "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    #[serde(with = "stamp")]
    pub last_updated: DateTime<Utc>,
    pub data: Vec<T>,
}

impl<T> CacheEnvelope<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now - self.last_updated < threshold
    }
}

/// A file-backed envelope with a freshness threshold. Missing and corrupt
/// files both read as "no envelope", which forces regeneration upstream.
pub struct FileCache<T> {
    path: PathBuf,
    threshold: Duration,
    _payload: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned + Clone> FileCache<T> {
    pub fn new(path: PathBuf, threshold: Duration) -> Self {
        Self {
            path,
            threshold,
            _payload: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the envelope regardless of age. Corrupt contents are logged and
    /// treated as absent.
    pub fn load(&self) -> Option<CacheEnvelope<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!(
                    "corrupt cache {} ({}), forcing regenerate",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Payload if the envelope exists and is younger than the threshold.
    pub fn load_fresh(&self, now: DateTime<Utc>) -> Option<Vec<T>> {
        let envelope = self.load()?;
        if envelope.is_fresh(now, self.threshold) {
            Some(envelope.data)
        } else {
            None
        }
    }

    /// Persist a new envelope atomically: write a sibling temp file, then
    /// rename over the target. A kill mid-write leaves the previous envelope
    /// intact.
    pub fn store(&self, data: &[T], now: DateTime<Utc>) -> Result<(), CacheError> {
        let envelope = CacheEnvelope {
            last_updated: now,
            data: data.to_vec(),
        };
        let serialized = serde_json::to_string_pretty(&envelope)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Modification time of the cache file, used by the monitor loop to pick
    /// up externally written envelopes without re-reading every tick.
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}
