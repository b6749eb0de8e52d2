use crate::models::{credibility_label, credibility_stars, Source, SourceInput, SourceType};
use crate::services::PageMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Url,
    Title,
    Author,
    Date,
    Type,
    Credibility,
    Notes,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Url,
        FormField::Title,
        FormField::Author,
        FormField::Date,
        FormField::Type,
        FormField::Credibility,
        FormField::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Url => "URL",
            FormField::Title => "Title",
            FormField::Author => "Author",
            FormField::Date => "Date (YYYY-MM-DD)",
            FormField::Type => "Type",
            FormField::Credibility => "Credibility",
            FormField::Notes => "Notes",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// State of the add/edit source modal.
#[derive(Debug, Clone, Default)]
pub struct SourceForm {
    pub editing_id: Option<String>,
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub source_type: SourceType,
    /// 0 means not rated.
    pub credibility: u8,
    pub notes: String,
    pub focus: FormField,
}

impl SourceForm {
    pub fn edit(source: &Source) -> Self {
        Self {
            editing_id: Some(source.id.clone()),
            url: source.url.clone(),
            title: source.title.clone(),
            author: source.author.clone(),
            date: source.date.clone(),
            source_type: source.source_type,
            credibility: source.rating().unwrap_or(0),
            notes: source.notes.clone(),
            focus: FormField::Title,
        }
    }

    /// Form for the page a summary was made from.
    pub fn for_page(url: &str, title: &str, notes: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            notes: notes.to_string(),
            source_type: SourceType::Website,
            focus: FormField::Title,
            ..Default::default()
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::Url => self.url.clone(),
            FormField::Title => self.title.clone(),
            FormField::Author => self.author.clone(),
            FormField::Date => self.date.clone(),
            FormField::Type => format!("< {} >", self.source_type.label()),
            FormField::Credibility => {
                let rating = (self.credibility > 0).then_some(self.credibility);
                format!(
                    "{} {}",
                    credibility_stars(self.credibility),
                    credibility_label(rating)
                )
            }
            FormField::Notes => self.notes.clone(),
        }
    }

    fn text_field(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Url => Some(&mut self.url),
            FormField::Title => Some(&mut self.title),
            FormField::Author => Some(&mut self.author),
            FormField::Date => Some(&mut self.date),
            FormField::Notes => Some(&mut self.notes),
            FormField::Type | FormField::Credibility => None,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus {
            FormField::Credibility => {
                if let Some(rating) = c.to_digit(10).filter(|d| *d <= 5) {
                    self.credibility = rating as u8;
                }
            }
            FormField::Type => {
                if c == ' ' {
                    self.source_type = self.source_type.next();
                }
            }
            _ => {
                if let Some(field) = self.text_field() {
                    field.push(c);
                }
            }
        }
    }

    pub fn paste(&mut self, text: &str) {
        let flattened = text.replace(['\r', '\n'], " ");
        if let Some(field) = self.text_field() {
            field.push_str(&flattened);
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            FormField::Credibility => self.credibility = 0,
            _ => {
                if let Some(field) = self.text_field() {
                    field.pop();
                }
            }
        }
    }

    /// Left/right on the type and credibility selectors.
    pub fn adjust(&mut self, forward: bool) {
        match self.focus {
            FormField::Type => {
                self.source_type = if forward {
                    self.source_type.next()
                } else {
                    self.source_type.prev()
                };
            }
            FormField::Credibility => {
                self.credibility = if forward {
                    (self.credibility + 1).min(5)
                } else {
                    self.credibility.saturating_sub(1)
                };
            }
            _ => {}
        }
    }

    /// Copies the non-empty metadata fields into the form.
    pub fn apply_metadata(&mut self, metadata: &PageMetadata) {
        if !metadata.title.is_empty() {
            self.title = metadata.title.clone();
        }
        if !metadata.author.is_empty() {
            self.author = metadata.author.clone();
        }
        if !metadata.date.is_empty() {
            self.date = metadata.date.clone();
        }
    }

    pub fn to_input(&self) -> SourceInput {
        SourceInput {
            id: self.editing_id.clone(),
            url: Some(self.url.clone()),
            title: Some(self.title.clone()),
            author: Some(self.author.clone()),
            date: Some(self.date.clone()),
            source_type: Some(self.source_type),
            credibility: Some(self.credibility),
            notes: Some(self.notes.clone()),
        }
    }
}
