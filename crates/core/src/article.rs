//! Article record produced by extraction.
//!
//! This module defines the [`Article`] struct which represents the complete
//! result of extracting one Article page: metadata, the cleaned body
//! fragment, and the calculated reading time.

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::Document;

/// Words per minute assumed when estimating reading time.
const WORDS_PER_MINUTE: f64 = 230.0;

/// The structured result of extracting one source page.
///
/// Created by [`crate::extract_article`]. The `body_html` field is replaced
/// once by the image pipeline when remote images are rewritten to local
/// archive paths; every other field is immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    /// Article title.
    pub title: String,

    /// Author display name, `"Unknown"` when no byline was found.
    pub author: String,

    /// Author handle without the leading `@`, empty if unknown.
    pub handle: String,

    /// ISO-8601 publish timestamp, empty string when the page carries none.
    pub publish_date: String,

    /// Cleaned article body as an HTML fragment.
    pub body_html: String,

    /// Canonical source URL of the page.
    pub source_url: String,

    /// Estimated reading time in whole minutes (230 wpm, rounded up).
    pub reading_time: u32,
}

impl Article {
    /// Creates a new Article from its components.
    ///
    /// The reading time is derived from the body: markup is stripped, the
    /// plain text is split on whitespace, and the word count is divided by
    /// 230 words per minute, rounded up. An empty body yields 0.
    pub fn new(
        title: String,
        author: String,
        handle: String,
        publish_date: String,
        body_html: String,
        source_url: String,
    ) -> Self {
        let reading_time = reading_time_minutes(&body_html);
        Self { title, author, handle, publish_date, body_html, source_url, reading_time }
    }
}

/// Estimate reading time in whole minutes for an HTML fragment.
pub(crate) fn reading_time_minutes(html: &str) -> u32 {
    let words = count_words(&html_to_text(html));
    (words as f64 / WORDS_PER_MINUTE).ceil() as u32
}

/// Convert HTML to plain text by removing tags
fn html_to_text(html: &str) -> String {
    match Document::parse(html) {
        Ok(doc) => doc.text_content(),
        Err(_) => String::new(),
    }
}

/// Count words by splitting on whitespace
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Parse the calendar date out of a publish timestamp.
///
/// Accepts a full RFC 3339 timestamp (the form `time` elements carry in
/// their `datetime` attribute) or a bare `YYYY-MM-DD` date. Anything else
/// yields `None` and callers fall back to the current date.
pub(crate) fn parse_calendar_date(value: &str) -> Option<Date> {
    if let Ok(datetime) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(datetime.date());
    }
    Date::parse(value, format_description!("[year]-[month]-[day]")).ok()
}

/// Format a date as `YYYY-MM-DD`.
pub(crate) fn iso_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Today's date in UTC.
pub(crate) fn current_date() -> Date {
    OffsetDateTime::now_utc().date()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_creation() {
        let body = "<p>This is a test article with some content.</p>".to_string();
        let article = Article::new(
            "Test Article".to_string(),
            "Jane Doe".to_string(),
            "janedoe".to_string(),
            "2026-01-15T10:30:00.000Z".to_string(),
            body.clone(),
            "https://x.com/janedoe/article/123".to_string(),
        );

        assert_eq!(article.body_html, body);
        assert_eq!(article.title, "Test Article");
        assert_eq!(article.author, "Jane Doe");
        assert_eq!(article.handle, "janedoe");
        assert_eq!(article.reading_time, 1);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let words = "word ".repeat(231);
        let html = format!("<p>{}</p>", words);
        assert_eq!(reading_time_minutes(&html), 2);

        let words = "word ".repeat(230);
        let html = format!("<p>{}</p>", words);
        assert_eq!(reading_time_minutes(&html), 1);
    }

    #[test]
    fn test_reading_time_empty_body() {
        assert_eq!(reading_time_minutes(""), 0);
        assert_eq!(reading_time_minutes("<p>   </p>"), 0);
    }

    #[test]
    fn test_html_to_text() {
        let html = "<p>Hello world</p><p>Second paragraph</p>";
        let text = html_to_text(html);
        assert_eq!(text, "Hello worldSecond paragraph");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("hello world"), 2);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("a b c d e"), 5);
    }

    #[test]
    fn test_parse_calendar_date() {
        let date = parse_calendar_date("2026-01-15T10:30:00.000Z").unwrap();
        assert_eq!(iso_date(date), "2026-01-15");

        let date = parse_calendar_date("2026-01-15T10:30:00Z").unwrap();
        assert_eq!(iso_date(date), "2026-01-15");

        let date = parse_calendar_date("2026-01-15").unwrap();
        assert_eq!(iso_date(date), "2026-01-15");

        assert!(parse_calendar_date("").is_none());
        assert!(parse_calendar_date("January 15, 2026").is_none());
    }

    #[test]
    fn test_article_serialization() {
        let article = Article::new(
            "Test".to_string(),
            "Author".to_string(),
            "author".to_string(),
            String::new(),
            "<p>Test content</p>".to_string(),
            "https://x.com/author/article/1".to_string(),
        );

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains(r#""title":"Test""#));
        assert!(json.contains(r#""body_html":"<p>Test content</p>""#));
        assert!(json.contains(r#""source_url":"https://x.com/author/article/1""#));
        assert!(json.contains(r#""publish_date":"""#));
    }
}
