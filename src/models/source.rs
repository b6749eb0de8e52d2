use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::generate_id;

pub const MAX_CREDIBILITY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Article,
    Book,
    Journal,
    Website,
    Other,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Article,
        SourceType::Book,
        SourceType::Journal,
        SourceType::Website,
        SourceType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Article => "article",
            SourceType::Book => "book",
            SourceType::Journal => "journal",
            SourceType::Website => "website",
            SourceType::Other => "other",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Publication date as entered, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credibility: Option<u8>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl Source {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Rating in 1..=5, `None` when unrated.
    pub fn rating(&self) -> Option<u8> {
        self.credibility.filter(|c| *c > 0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() && self.title.trim().is_empty() {
            return Err(AppError::validation("Please enter at least a URL or title"));
        }
        if let Some(c) = self.credibility {
            if c > MAX_CREDIBILITY {
                return Err(AppError::validation(format!(
                    "Credibility must be between 0 and {MAX_CREDIBILITY}"
                )));
            }
        }
        Ok(())
    }
}

/// Partial source used for inserts and in-place updates.
///
/// `None` fields are left untouched when merged into an existing record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInput {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub source_type: Option<SourceType>,
    pub credibility: Option<u8>,
    pub notes: Option<String>,
}

impl SourceInput {
    pub fn merge_into(self, source: &mut Source) {
        if let Some(url) = self.url {
            source.url = url.trim().to_string();
        }
        if let Some(title) = self.title {
            source.title = title.trim().to_string();
        }
        if let Some(author) = self.author {
            source.author = author.trim().to_string();
        }
        if let Some(date) = self.date {
            source.date = date.trim().to_string();
        }
        if let Some(source_type) = self.source_type {
            source.source_type = source_type;
        }
        if let Some(credibility) = self.credibility {
            source.credibility = Some(credibility);
        }
        if let Some(notes) = self.notes {
            source.notes = notes.trim().to_string();
        }
    }

    pub fn into_source(self) -> Source {
        let mut source = Source {
            id: self.id.clone().unwrap_or_else(|| generate_id("source")),
            url: String::new(),
            title: String::new(),
            author: String::new(),
            date: String::new(),
            source_type: SourceType::default(),
            credibility: None,
            notes: String::new(),
            added_at: Some(Utc::now()),
        };
        self.merge_into(&mut source);
        source
    }
}

pub fn credibility_label(rating: Option<u8>) -> &'static str {
    match rating {
        Some(1) => "Very Low",
        Some(2) => "Low",
        Some(3) => "Medium",
        Some(4) => "High",
        Some(5) => "Very High",
        _ => "Not rated",
    }
}

pub fn credibility_stars(rating: u8) -> String {
    let filled = rating.min(MAX_CREDIBILITY) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_CREDIBILITY as usize - filled)
    )
}
