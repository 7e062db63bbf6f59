//! Error types for Kobopress operations.
//!
//! This module defines the main error type [`KobopressError`] which represents
//! all possible errors that can occur during extraction, image fetching,
//! archive assembly, and the KEPUB transform.
//!
//! # Example
//!
//! ```rust
//! use kobopress_core::{KobopressError, Result};
//!
//! fn chapter_markup(xhtml: &str) -> Result<String> {
//!     if xhtml.is_empty() {
//!         return Err(KobopressError::XhtmlError("empty chapter".to_string()));
//!     }
//!     // ... transform logic
//!     # Ok(String::new())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion operations.
///
/// This enum represents all possible errors that can occur during
/// metadata/body extraction, HTTP fetching, EPUB archive construction,
/// and chapter rewriting. Per-image download failures are not errors;
/// they surface as counts on [`crate::ImageResult`].
///
/// # Example
///
/// ```rust
/// use kobopress_core::{KobopressError, extract_article};
///
/// let html = "<html><body></body></html>";
/// match extract_article(html, "https://x.com/jane/article/1", "Untitled") {
///     Ok(article) => println!("Extracted: {}", article.title),
///     Err(KobopressError::HtmlParseError(msg)) => {
///         println!("Unparseable markup: {}", msg);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum KobopressError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[cfg(feature = "fetch")]
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or is not an Article page URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors.
    ///
    /// Returned when HTML cannot be parsed, often due to malformed markup
    /// or invalid CSS selectors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// No content could be extracted.
    ///
    /// The scoring pass reports this when the page produced no candidate
    /// elements at all. Callers treat it as a signal to try the rich-text
    /// container fallback rather than as a fatal condition.
    #[error("No content found in document")]
    NoContent,

    /// Content extraction found candidates but none scored well enough.
    ///
    /// Like [`KobopressError::NoContent`], this drives the fallback path.
    #[error("Content below readability threshold: score {score:.1} < {threshold:.1}")]
    NotReadable {
        /// The score of the best candidate found.
        score: f64,
        /// The minimum score threshold that was required.
        threshold: f64,
    },

    /// Chapter XHTML problems.
    ///
    /// Returned when a chapter document cannot be serialized back into
    /// well-formed XHTML during the KEPUB transform.
    #[error("Failed to produce well-formed XHTML: {0}")]
    XhtmlError(String),

    /// EPUB archive construction or reading errors.
    #[error("EPUB archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    /// A required archive entry is missing.
    ///
    /// Returned when re-opening a built EPUB to rewrite a chapter that
    /// is not present in the archive.
    #[error("Archive entry not found: {0}")]
    MissingEntry(String),

    /// Image transcoding errors.
    ///
    /// Returned when WebP data cannot be decoded or re-encoded as JPEG.
    /// The image pipeline contains this error; it fails the affected
    /// download job rather than the conversion.
    #[error("Image transcoding failed: {0}")]
    TranscodeError(String),

    /// File not found.
    ///
    /// Returned when attempting to read a file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File write errors.
    ///
    /// Wraps standard I/O errors for file operations.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),
}

/// Result type alias for KobopressError.
///
/// This is a convenience alias for `std::result::Result<T, KobopressError>`.
pub type Result<T> = std::result::Result<T, KobopressError>;
