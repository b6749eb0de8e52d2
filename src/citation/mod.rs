mod formatter;

pub use formatter::{apa, chicago, mla, parse_source_date};

use chrono::NaiveDate;

use crate::models::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStyle {
    Apa,
    Mla,
    Chicago,
}

impl CitationStyle {
    pub const ALL: [CitationStyle; 3] = [
        CitationStyle::Apa,
        CitationStyle::Mla,
        CitationStyle::Chicago,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
            CitationStyle::Chicago => "Chicago",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "apa" => Some(CitationStyle::Apa),
            "mla" => Some(CitationStyle::Mla),
            "chicago" => Some(CitationStyle::Chicago),
            _ => None,
        }
    }

    /// `today` is the access date used by the web layouts of MLA and Chicago.
    pub fn format(&self, source: &Source, today: NaiveDate) -> String {
        match self {
            CitationStyle::Apa => apa(source),
            CitationStyle::Mla => mla(source, today),
            CitationStyle::Chicago => chicago(source, today),
        }
    }
}

/// Citations of one topic's sources in every style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSet {
    pub apa: String,
    pub mla: String,
    pub chicago: String,
}

impl CitationSet {
    pub fn build(sources: &[Source], today: NaiveDate) -> Self {
        Self {
            apa: render(CitationStyle::Apa, sources, today),
            mla: render(CitationStyle::Mla, sources, today),
            chicago: render(CitationStyle::Chicago, sources, today),
        }
    }

    pub fn get(&self, style: CitationStyle) -> &str {
        match style {
            CitationStyle::Apa => &self.apa,
            CitationStyle::Mla => &self.mla,
            CitationStyle::Chicago => &self.chicago,
        }
    }
}

pub fn render(style: CitationStyle, sources: &[Source], today: NaiveDate) -> String {
    sources
        .iter()
        .map(|s| style.format(s, today))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceInput;

    #[test]
    fn entries_are_separated_by_blank_lines() {
        let sources: Vec<Source> = ["One", "Two"]
            .iter()
            .map(|t| {
                SourceInput {
                    title: Some(t.to_string()),
                    url: Some(format!("http://{}.test", t.to_lowercase())),
                    ..Default::default()
                }
                .into_source()
            })
            .collect();
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let set = CitationSet::build(&sources, today);

        assert_eq!(
            set.get(CitationStyle::Apa),
            "Unknown Author (n.d.). One. Retrieved from http://one.test\n\n\
             Unknown Author (n.d.). Two. Retrieved from http://two.test"
        );
        assert_eq!(set.mla.matches("\n\n").count(), 1);
    }

    #[test]
    fn styles_parse_case_insensitively() {
        assert_eq!(CitationStyle::parse("MLA"), Some(CitationStyle::Mla));
        assert_eq!(CitationStyle::parse("chicago"), Some(CitationStyle::Chicago));
        assert_eq!(CitationStyle::parse("harvard"), None);
    }
}
