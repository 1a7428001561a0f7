//! Web page source: fetch a URL and reduce the HTML to readable text.

use super::TextSource;
use crate::error::{PrecisError, Result};
use async_trait::async_trait;
use scraper::node::Element;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const USER_AGENT: &str = concat!("precis/", env!("CARGO_PKG_VERSION"));

/// Elements whose text never reaches the output.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "head", "template", "svg"];

/// Elements rendered as separate paragraphs.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "h1", "h2", "h3", "h4", "h5",
    "h6", "li", "ul", "ol", "br", "tr", "table", "blockquote", "pre",
];

/// Candidate containers for the main content, most specific first.
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role=main]", "#content", "body"];

/// Text loaded from an http(s) URL.
pub struct WebSource {
    url: Url,
    timeout: Duration,
}

impl WebSource {
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

#[async_trait]
impl TextSource for WebSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn load_text(&self) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let response = client.get(self.url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                PrecisError::Source(format!("Request timed out fetching {}", self.url))
            } else {
                PrecisError::Source(format!("Failed to fetch {}: {}", self.url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrecisError::Source(format!(
                "HTTP {} when fetching {}",
                status.as_u16(),
                self.url
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        let is_html = content_type.contains("text/html") || content_type.contains("xhtml");
        let is_text = content_type.contains("text/plain") || content_type.contains("text/markdown");
        if !is_html && !is_text && !content_type.is_empty() {
            return Err(PrecisError::Source(format!(
                "Unsupported content type '{}' for {}",
                content_type, self.url
            )));
        }

        let body = response.text().await?;
        debug!("Fetched {} bytes ({})", body.len(), content_type);

        Ok(if is_text {
            body
        } else {
            html_to_text(&body)
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Extract readable text from an HTML document.
///
/// Scripts, styles and footnote markup are dropped; block elements become
/// paragraphs so the splitter can break on them.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if text.chars().count() > 100 {
                return text;
            }
        }
    }

    element_text(document.root_element())
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    clean_text(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if is_skipped(child.value()) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&child.value().name());
            if block {
                out.push_str("\n\n");
            }
            collect_text(child, out);
            if block {
                out.push_str("\n\n");
            }
        }
    }
}

/// Scripts and styles, plus footnote references and footnote blocks from e-book exports.
fn is_skipped(element: &Element) -> bool {
    let name = element.name();
    SKIPPED_ELEMENTS.contains(&name)
        || (name == "span" && element.classes().any(|c| c == "Exp"))
        || (name == "div" && element.classes().any(|c| c == "_idFootnotes"))
}

/// Normalize whitespace, keeping blank lines as paragraph breaks.
fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_break = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            pending_break = true;
            continue;
        }
        if !result.is_empty() {
            result.push_str(if pending_break { "\n\n" } else { " " });
        }
        result.push_str(&line.split_whitespace().collect::<Vec<_>>().join(" "));
        pending_break = false;
    }

    result
}
