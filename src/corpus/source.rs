//! Line sources for corpus builds: local text files, arbitrary web pages and Wikipedia
//! plain-text extracts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::core::config::CorpusSettings;
use crate::core::errors::RagError;

/// Where the raw lines of a corpus build come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    File(PathBuf),
    Url(String),
    Wikipedia { api_url: String, title: String },
}

impl CorpusSource {
    /// Picks the configured source: a URL first, then a Wikipedia title.
    pub fn from_settings(settings: &CorpusSettings) -> Option<Self> {
        if let Some(url) = &settings.source_url {
            return Some(CorpusSource::Url(url.clone()));
        }
        settings
            .wikipedia_title
            .as_ref()
            .map(|title| CorpusSource::Wikipedia {
                api_url: settings.wikipedia_api.clone(),
                title: title.clone(),
            })
    }

    pub async fn read_lines(&self, timeout_secs: u64) -> Result<Vec<String>, RagError> {
        match self {
            CorpusSource::File(path) => read_corpus_lines(path),
            CorpusSource::Url(url) => fetch_corpus_lines(url, timeout_secs).await,
            CorpusSource::Wikipedia { api_url, title } => {
                fetch_wikipedia_lines(api_url, title, timeout_secs).await
            }
        }
    }
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusSource::File(path) => write!(f, "file {}", path.display()),
            CorpusSource::Url(url) => write!(f, "url {}", url),
            CorpusSource::Wikipedia { title, .. } => write!(f, "Wikipedia article '{}'", title),
        }
    }
}

pub fn read_corpus_lines(path: &Path) -> Result<Vec<String>, RagError> {
    let text = std::fs::read_to_string(path)?;
    Ok(split_lines(&text))
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim_end().to_string()).collect()
}

/// Fetches a page and reduces its HTML to text lines.
pub async fn fetch_corpus_lines(url: &str, timeout_secs: u64) -> Result<Vec<String>, RagError> {
    let client = http_client(timeout_secs)?;
    let response = client.get(url).send().await.map_err(RagError::http)?;
    if !response.status().is_success() {
        return Err(RagError::Http(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    let body = response.text().await.map_err(RagError::http)?;
    let lines = split_lines(&strip_html_tags(&body));
    tracing::info!(lines = lines.len(), "Fetched corpus from {}", url);
    Ok(lines)
}

/// Fetches the plain-text extract of a Wikipedia article. Section headings come back as
/// `== Heading ==` lines, which the preprocessor drops.
pub async fn fetch_wikipedia_lines(
    api_url: &str,
    title: &str,
    timeout_secs: u64,
) -> Result<Vec<String>, RagError> {
    let client = http_client(timeout_secs)?;
    let response = client
        .get(api_url)
        .query(&[
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("format", "json"),
            ("titles", title),
        ])
        .send()
        .await
        .map_err(RagError::http)?;
    if !response.status().is_success() {
        return Err(RagError::Http(format!(
            "Wikipedia extract for '{}' returned {}",
            title,
            response.status()
        )));
    }

    let payload: Value = response.json().await.map_err(RagError::http)?;
    let extract = extract_from_payload(&payload)
        .ok_or_else(|| RagError::Http(format!("Wikipedia has no article '{}'", title)))?;

    let lines = split_lines(extract);
    tracing::info!(lines = lines.len(), "Fetched Wikipedia article '{}'", title);
    Ok(lines)
}

fn http_client(timeout_secs: u64) -> Result<Client, RagError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("almanac/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(RagError::http)
}

fn extract_from_payload(payload: &Value) -> Option<&str> {
    payload
        .get("query")?
        .get("pages")?
        .as_object()?
        .values()
        .find_map(|page| page.get("extract").and_then(Value::as_str))
}

/// Strips tags, drops `<script>`/`<style>` bodies, breaks lines at block elements and decodes
/// the common entities.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        result.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };

        let tag = after[1..close].trim().to_ascii_lowercase();
        rest = &after[close + 1..];

        for raw in ["script", "style"] {
            if tag == raw || tag.starts_with(&format!("{} ", raw)) {
                let end_tag = format!("</{}>", raw);
                rest = match rest.to_ascii_lowercase().find(&end_tag) {
                    Some(end) => &rest[end + end_tag.len()..],
                    None => "",
                };
            }
        }

        if is_block_boundary(&tag) {
            result.push('\n');
        }
    }
    result.push_str(rest);

    let decoded = decode_entities(&result);
    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block_boundary(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("");
    matches!(
        name,
        "br" | "p" | "li" | "ul" | "ol" | "div" | "tr" | "table" | "h1" | "h2" | "h3" | "h4"
            | "h5" | "h6" | "dd" | "dt"
    )
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&ndash;", "–")
        .replace("&#8211;", "–")
        .replace("&mdash;", "—")
        .replace("&#8212;", "—")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
