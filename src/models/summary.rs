use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Creation time in unix milliseconds.
    pub id: i64,
    /// Endpoint output with line breaks stored as `<br>`.
    pub summary: String,
    pub original_text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
}

impl Summary {
    pub fn new(summary: String, original_text: String, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            summary,
            original_text,
            timestamp: now,
            url,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.summary.split("<br>")
    }
}

/// What the result panel of the topic detail page currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultPanel {
    #[default]
    Empty,
    Pending(String),
    Message(String),
    Summary(String),
    Suggestions(String),
    Error(String),
}
