use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Copy of `notes_<id>` kept for listing.
    #[serde(default)]
    pub notes: String,
}

impl Topic {
    pub fn new(name: &str) -> Self {
        Self {
            id: generate_id("topic"),
            name: name.trim().to_string(),
            created_at: Utc::now(),
            notes: String::new(),
        }
    }

    pub fn created_label(&self) -> String {
        self.created_at
            .with_timezone(&chrono::Local)
            .format("%-m/%-d/%Y")
            .to_string()
    }
}

/// A topic as shown in the topic list, with its summary count read from storage.
#[derive(Debug, Clone)]
pub struct TopicRow {
    pub topic: Topic,
    pub summary_count: usize,
}
