use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SentryLensError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSummary {
    pub whats_wrong: String,
    #[serde(rename = "possivel_causa")]
    pub possible_cause: String,
    pub timestamp: DateTime<Utc>,
}

impl CachedSummary {
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < ttl
    }
}

/// Issue id to translated summary, backed by a single JSON file.
///
/// The whole map is rewritten after every insert. Writes go to a sibling
/// temp file first and are renamed over the cache file.
#[derive(Debug)]
pub struct SummaryCache {
    path: PathBuf,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSummary>>,
}

impl SummaryCache {
    /// Reads the cache file, dropping expired entries. A missing or unreadable
    /// file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring summary cache at {}: {e}", path.display());
                HashMap::new()
            }
        };

        let now = Utc::now();
        let total = entries.len();
        let entries: HashMap<_, _> = entries
            .into_iter()
            .filter(|(_, entry)| entry.is_fresh(ttl, now))
            .collect();

        if entries.len() < total {
            info!(
                "Dropped {} expired summary cache entries",
                total - entries.len()
            );
        }
        info!(
            "Loaded {} cached summaries from {}",
            entries.len(),
            path.display()
        );

        Self {
            path,
            ttl,
            entries: Mutex::new(entries),
        }
    }

    pub fn get(&self, issue_id: &str) -> Option<CachedSummary> {
        let entries = self.lock();
        let entry = entries.get(issue_id)?;
        if entry.is_fresh(self.ttl, Utc::now()) {
            debug!("Summary cache hit for issue {issue_id}");
            Some(entry.clone())
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn insert(&self, issue_id: &str, whats_wrong: String, possible_cause: String) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(
            issue_id.to_string(),
            CachedSummary {
                whats_wrong,
                possible_cause,
                timestamp: Utc::now(),
            },
        );
        self.flush(&entries)
    }

    fn flush(&self, entries: &HashMap<String, CachedSummary>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedSummary>> {
        // A panic while holding the lock leaves the map itself intact
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn read_entries(path: &Path) -> Result<HashMap<String, CachedSummary>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(&raw).map_err(|e| SentryLensError::Cache(e.to_string()))
}
