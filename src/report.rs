use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

pub const COLUMNS: [&str; 14] = [
    "report_date",
    "title",
    "count",
    "users_affected",
    "environment",
    "status",
    "level",
    "first_seen",
    "last_seen",
    "short_id",
    "culprit",
    "permalink",
    "o_que_aconteceu",
    "possivel_causa",
];

/// One report row. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRecord {
    pub report_date: String,
    pub title: String,
    pub count: u64,
    pub users_affected: u64,
    pub environment: String,
    pub status: String,
    pub level: String,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub short_id: String,
    pub culprit: String,
    pub permalink: Option<String>,
    #[serde(rename = "o_que_aconteceu")]
    pub what_happened: String,
    #[serde(rename = "possivel_causa")]
    pub possible_cause: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    pub columns: Vec<&'static str>,
    pub rows: Vec<IssueRecord>,
}

impl Sheet {
    /// Sorts by count, then affected users, both descending.
    pub fn new(mut rows: Vec<IssueRecord>) -> Self {
        rows.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.users_affected.cmp(&a.users_affected))
        });
        Self {
            columns: COLUMNS.to_vec(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub provider: String,
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub sheets: IndexMap<String, Sheet>,
}

impl Report {
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
