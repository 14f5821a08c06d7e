//! Best-effort date recognition for the leading token of a corpus line.
//!
//! Anything that does not look like a calendar date yields `None`; callers never see a
//! parse error.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Formats for a single numeric token.
const NUMERIC_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Formats for month-name tokens once commas are removed.
const TEXTUAL_FORMATS: [&str; 2] = ["%B %d %Y", "%d %B %Y"];

/// Year used to validate month/day tokens that carry no year. A leap year, so
/// "February 29" is accepted.
const PLACEHOLDER_YEAR: i32 = 2000;

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex"))
}

/// Parses `token` as a date, returning `None` when it is not one.
///
/// Accepts ISO-like numeric dates, `January 1, 2023`, `1 January 2023`, abbreviated month
/// names, month/day without a year, month/year, ordinal days (`1st`) and ranges whose first
/// half is a date (`March 5–7`).
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let normalized = normalize(token);
    if normalized.is_empty() {
        return None;
    }

    parse_normalized(&normalized).or_else(|| {
        // "January 1–3" or "March 5 - April 2": retry with the start of the range
        let start = normalized
            .split(['–', '—'])
            .next()
            .map(str::trim)
            .filter(|start| *start != normalized)?;
        parse_normalized(start)
    })
}

pub fn is_date(token: &str) -> bool {
    parse_date(token).is_some()
}

fn normalize(token: &str) -> String {
    let without_commas = token.trim().replace(',', " ");
    let without_ordinals = ordinal_suffix().replace_all(&without_commas, "$1");
    without_ordinals.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_normalized(text: &str) -> Option<NaiveDate> {
    let words: Vec<&str> = text.split(' ').collect();
    // chrono lets `%d` and `%Y` split one run of digits, so every number must be a word of its own
    // with a day or year width before any textual format is tried.
    let numbers_well_formed = words
        .iter()
        .filter(|word| word.starts_with(|c: char| c.is_ascii_digit()))
        .all(|word| word.chars().all(|c| c.is_ascii_digit()) && matches!(word.len(), 1 | 2 | 4));

    match words.as_slice() {
        [single] => {
            if single.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            NUMERIC_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(single, format).ok())
        }
        [_, _, _] if numbers_well_formed && words.iter().any(|word| is_year(word)) => TEXTUAL_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok()),
        [first, second] if numbers_well_formed => {
            if is_year(first) || is_year(second) {
                // Month and year: "January 2023"
                let with_day = format!("1 {}", text);
                return NaiveDate::parse_from_str(&with_day, "%d %B %Y").ok();
            }
            // Month and day without a year: "January 5" / "5 January"
            let with_year = format!("{} {}", text, PLACEHOLDER_YEAR);
            TEXTUAL_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(&with_year, format).ok())
        }
        _ => None,
    }
}

fn is_year(word: &str) -> bool {
    word.len() == 4 && word.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_numeric_dates() {
        assert_eq!(parse_date("2023-01-01"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_date("2023/02/28"), Some(ymd(2023, 2, 28)));
        assert_eq!(parse_date(" 2023-2-1 "), Some(ymd(2023, 2, 1)));
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(parse_date("January 13, 2022"), Some(ymd(2022, 1, 13)));
        assert_eq!(parse_date("13 January 2022"), Some(ymd(2022, 1, 13)));
        assert_eq!(parse_date("Feb 3 2021"), Some(ymd(2021, 2, 3)));
        assert_eq!(parse_date("March 1st, 2020"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_date("September 2019"), Some(ymd(2019, 9, 1)));
    }

    #[test]
    fn month_and_day_without_year_is_a_date() {
        assert_eq!(parse_date("January 5"), Some(ymd(PLACEHOLDER_YEAR, 1, 5)));
        assert_eq!(parse_date("29 February"), Some(ymd(PLACEHOLDER_YEAR, 2, 29)));
    }

    #[test]
    fn ranges_use_their_first_day() {
        assert_eq!(parse_date("March 5–7"), Some(ymd(PLACEHOLDER_YEAR, 3, 5)));
        assert_eq!(
            parse_date("June 30 – July 2"),
            Some(ymd(PLACEHOLDER_YEAR, 6, 30))
        );
    }

    #[test]
    fn prose_and_bare_numbers_are_not_dates() {
        assert!(!is_date(""));
        assert!(!is_date("B"));
        assert!(!is_date("The prime minister resigns"));
        assert!(!is_date("2023"));
        assert!(!is_date("42"));
        assert!(!is_date("February 30"));
    }

    #[test]
    fn month_and_year_is_not_read_as_a_day() {
        assert_eq!(parse_date("September 2019"), Some(ymd(2019, 9, 1)));
        assert_eq!(parse_date("June 2000"), Some(ymd(2000, 6, 1)));
        assert!(!is_date("June 123"));
        assert!(!is_date("June 12345"));
        assert!(!is_date("January 13 22"));
    }
}
