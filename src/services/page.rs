use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::citation::parse_source_date;
use crate::error::{AppError, Result};

/// Best-effort bibliographic data pulled from a page's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub author: String,
    /// `YYYY-MM-DD`, or empty.
    pub date: String,
}

/// The page research actions apply to, with whatever text the user selected on it.
#[derive(Debug, Clone, Default)]
pub struct ActivePage {
    pub url: String,
    pub title: String,
    pub metadata: PageMetadata,
    pub text: String,
    pub selection: String,
}

impl ActivePage {
    pub fn selected_text(&self) -> Option<&str> {
        let trimmed = self.selection.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, page_url: &str) -> Result<ActivePage> {
        let url = Url::parse(page_url.trim())
            .map_err(|e| AppError::Extraction(format!("invalid url {page_url}: {e}")))?;

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Extraction(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let html = response.text().await?;
        let metadata = extract_metadata(&html);

        Ok(ActivePage {
            url: url.to_string(),
            title: metadata.title.clone(),
            text: extract_text(&html),
            metadata,
            selection: String::new(),
        })
    }
}

/// Hostname of `url`, used as a stand-in title when nothing better is known.
pub fn hostname_title(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()?
        .host_str()
        .map(|h| h.to_string())
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<title[^>]*>(.*?)</title>")
}

fn h1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<h1[^>]*>(.*?)</h1>")
}

fn meta_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<meta\b[^>]*>")
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
}

fn rel_author_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?is)<[a-z0-9]+\b[^>]*\brel\s*=\s*["']author["'][^>]*>(.*?)</"#)
}

fn class_author_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r#"(?is)<[a-z0-9]+\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?author(?:\s[^"']*)?["'][^>]*>(.*?)</"#,
    )
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?is)<time\b[^>]*\bdatetime\s*=\s*["']([^"']+)["']"#)
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?s)<[^>]*>")
}

/// Content of the first `<meta>` whose `attr` equals `value`.
fn meta_content(html: &str, attr: &str, value: &str) -> Option<String> {
    meta_re().find_iter(html).find_map(|tag| {
        let mut matched = false;
        let mut content = None;
        for cap in attr_re().captures_iter(tag.as_str()) {
            let name = cap[1].to_ascii_lowercase();
            let val = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            if name == attr && val.eq_ignore_ascii_case(value) {
                matched = true;
            } else if name == "content" {
                content = Some(val.to_string());
            }
        }
        if matched {
            content.map(|c| clean_text(&c)).filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty())
}

fn clean_text(raw: &str) -> String {
    let stripped = tag_re().replace_all(raw, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_metadata(html: &str) -> PageMetadata {
    let title = first_capture(title_re(), html)
        .or_else(|| meta_content(html, "property", "og:title"))
        .or_else(|| first_capture(h1_re(), html))
        .unwrap_or_default();

    let author = meta_content(html, "name", "author")
        .or_else(|| first_capture(rel_author_re(), html))
        .or_else(|| first_capture(class_author_re(), html))
        .unwrap_or_default();

    let date = meta_content(html, "property", "article:published_time")
        .or_else(|| meta_content(html, "name", "date"))
        .or_else(|| time_re().captures(html).map(|c| c[1].to_string()))
        .and_then(|raw| parse_source_date(&raw).or_else(|| parse_source_date(raw.get(..10)?)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    PageMetadata {
        title,
        author,
        date,
    }
}

fn extract_text(html: &str) -> String {
    let text = match html2text::from_read(html.as_bytes(), 100) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return String::new();
        }
    };

    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
