use chrono::{DateTime, Datelike, NaiveDate};

use crate::models::{Source, SourceType};

const UNKNOWN_AUTHOR: &str = "Unknown Author";
const UNTITLED: &str = "Untitled";

fn author(source: &Source) -> &str {
    non_empty(&source.author).unwrap_or(UNKNOWN_AUTHOR)
}

fn title(source: &Source) -> &str {
    non_empty(&source.title).unwrap_or(UNTITLED)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_source_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

/// Publication date for MLA and Chicago: empty when absent, raw text when unparseable.
fn display_date(source: &Source) -> String {
    match non_empty(&source.date) {
        None => String::new(),
        Some(raw) => parse_source_date(raw)
            .map(short_date)
            .unwrap_or_else(|| raw.to_string()),
    }
}

pub fn apa(source: &Source) -> String {
    let year = parse_source_date(&source.date)
        .map(|d| d.year().to_string())
        .unwrap_or_else(|| "n.d.".to_string());
    let author = author(source);
    let title = title(source);

    match source.source_type {
        SourceType::Book => format!("{author} ({year}). {title}. Publisher."),
        SourceType::Journal => {
            format!("{author} ({year}). {title}. Journal Name, Volume(Issue), pages.")
        }
        _ => format!("{author} ({year}). {title}. Retrieved from {}", source.url),
    }
}

pub fn mla(source: &Source, today: NaiveDate) -> String {
    let author = author(source);
    let title = title(source);

    match source.source_type {
        SourceType::Book => format!("{author}. {title}. Publisher, {}.", display_date(source)),
        _ => format!(
            "{author}. \"{title}.\" Web. {}. <{}>.",
            short_date(today),
            source.url
        ),
    }
}

pub fn chicago(source: &Source, today: NaiveDate) -> String {
    let author = author(source);
    let title = title(source);

    match source.source_type {
        SourceType::Book => format!(
            "{author}. {title}. City: Publisher, {}.",
            display_date(source)
        ),
        _ => format!(
            "{author}. \"{title}.\" Accessed {}. {}.",
            short_date(today),
            source.url
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceInput;

    fn source(source_type: SourceType) -> Source {
        SourceInput {
            url: Some("http://x.test".into()),
            title: Some("On Testing".into()),
            author: Some("J. Doe".into()),
            date: Some("2020-01-01".into()),
            source_type: Some(source_type),
            ..Default::default()
        }
        .into_source()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn apa_article() {
        assert_eq!(
            apa(&source(SourceType::Article)),
            "J. Doe (2020). On Testing. Retrieved from http://x.test"
        );
    }

    #[test]
    fn apa_book_and_journal_layouts() {
        assert_eq!(
            apa(&source(SourceType::Book)),
            "J. Doe (2020). On Testing. Publisher."
        );
        assert_eq!(
            apa(&source(SourceType::Journal)),
            "J. Doe (2020). On Testing. Journal Name, Volume(Issue), pages."
        );
    }

    #[test]
    fn apa_defaults_for_missing_fields() {
        let bare = SourceInput {
            url: Some("http://bare.test".into()),
            ..Default::default()
        }
        .into_source();
        assert_eq!(
            apa(&bare),
            "Unknown Author (n.d.). Untitled. Retrieved from http://bare.test"
        );
    }

    #[test]
    fn mla_web_and_book() {
        assert_eq!(
            mla(&source(SourceType::Website), today()),
            "J. Doe. \"On Testing.\" Web. 3/9/2024. <http://x.test>."
        );
        assert_eq!(
            mla(&source(SourceType::Book), today()),
            "J. Doe. On Testing. Publisher, 1/1/2020."
        );
    }

    #[test]
    fn chicago_web_and_book() {
        assert_eq!(
            chicago(&source(SourceType::Article), today()),
            "J. Doe. \"On Testing.\" Accessed 3/9/2024. http://x.test."
        );
        assert_eq!(
            chicago(&source(SourceType::Book), today()),
            "J. Doe. On Testing. City: Publisher, 1/1/2020."
        );
    }

    #[test]
    fn book_without_date_leaves_it_blank() {
        let mut book = source(SourceType::Book);
        book.date.clear();
        assert_eq!(mla(&book, today()), "J. Doe. On Testing. Publisher, .");
        assert_eq!(apa(&book), "J. Doe (n.d.). On Testing. Publisher.");
    }

    #[test]
    fn formatting_is_deterministic_for_a_fixed_day() {
        let s = source(SourceType::Website);
        assert_eq!(mla(&s, today()), mla(&s, today()));
        assert_eq!(chicago(&s, today()), chicago(&s, today()));
    }

    #[test]
    fn rfc3339_dates_are_understood() {
        let date = parse_source_date("2019-07-04T12:00:00Z").unwrap();
        assert_eq!(short_date(date), "7/4/2019");
        assert!(parse_source_date("last spring").is_none());
    }
}
