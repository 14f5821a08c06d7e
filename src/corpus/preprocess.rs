//! Turns raw corpus lines into date-qualified fragments.
//!
//! 1. Empty lines and section headings are dropped.
//! 2. A single left-to-right scan carries the most recent date forward: a line whose leading
//!    token is a date sets the current date and is kept as-is; any other line is prefixed with
//!    the current date (when there is one).
//! 3. Only lines that contain the separator survive.

use super::dates::is_date;
use super::fragment::Fragment;
use crate::core::config::defaults::{DATE_SEPARATOR, SECTION_MARKER};
use crate::core::config::CorpusSettings;

#[derive(Debug, Clone)]
pub struct Preprocessor {
    separator: String,
    section_marker: String,
}

impl Preprocessor {
    pub fn new(separator: impl Into<String>, section_marker: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            section_marker: section_marker.into(),
        }
    }

    pub fn from_settings(settings: &CorpusSettings) -> Self {
        Self::new(settings.separator.clone(), settings.section_marker.clone())
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn process<I, S>(&self, lines: I) -> Vec<Fragment>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fragments: Vec<Fragment> = lines
            .into_iter()
            .filter(|line| !self.is_discarded(line.as_ref()))
            .scan(None::<String>, |current_date, line| {
                Some(self.qualify(current_date, line.as_ref()))
            })
            .filter(|line| line.contains(self.separator.as_str()))
            .map(|line| Fragment::from_tagged_text(line, &self.separator))
            .collect();

        tracing::debug!(fragments = fragments.len(), "Preprocessed corpus lines");
        fragments
    }

    fn is_discarded(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with(self.section_marker.as_str())
    }

    /// One step of the carry-forward scan.
    fn qualify(&self, current_date: &mut Option<String>, line: &str) -> String {
        let token = self.leading_token(line);
        if is_date(token) {
            *current_date = Some(token.to_string());
            return line.to_string();
        }

        match current_date {
            Some(date) => format!("{}{}{}", date, self.separator, line),
            None => line.to_string(),
        }
    }

    /// Text before the first separator, or the whole line when there is none.
    fn leading_token<'a>(&self, line: &'a str) -> &'a str {
        line.split_once(self.separator.as_str())
            .map_or(line, |(head, _)| head)
            .trim()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DATE_SEPARATOR, SECTION_MARKER)
    }
}
