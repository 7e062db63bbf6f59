//! Output naming and source URL validation.
//!
//! The output filename packs the publish date, a slugged title, the
//! author handle, and a short digest of the source URL, so repeated
//! conversions of one Article overwrite each other while different
//! Articles with identical titles stay distinct.

use url::Url;

use crate::article::{current_date, iso_date, parse_calendar_date};
use crate::{KobopressError, Result};

const VALID_HOSTS: &[&str] = &["x.com", "twitter.com", "www.x.com", "www.twitter.com"];

const INVALID_URL_MESSAGE: &str = "Please provide an X Article URL.";

/// Maximum length of the title slug inside the filename.
const MAX_SLUG_CHARS: usize = 200;

/// Checks that a URL parses and points at a supported host.
///
/// # Errors
///
/// Returns [`KobopressError::InvalidUrl`] for unparseable URLs and for
/// hosts other than `x.com`/`twitter.com` (with or without `www.`).
pub fn validate_article_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| KobopressError::InvalidUrl(INVALID_URL_MESSAGE.to_string()))?;

    if !parsed.host_str().is_some_and(|host| VALID_HOSTS.contains(&host)) {
        return Err(KobopressError::InvalidUrl(INVALID_URL_MESSAGE.to_string()));
    }

    Ok(parsed)
}

/// Builds the output filename for a converted Article.
///
/// Format: `<date>-<title-slug>-<handle>-<hash>.kepub.epub`, where the
/// date is the calendar portion of `publish_date` (today when absent or
/// unparseable), the handle is lowercased, and the hash is a 6 character
/// base-36 digest of the source URL. Empty segments are omitted along
/// with their separator.
///
/// # Example
///
/// ```rust
/// use kobopress_core::build_output_filename;
///
/// let name = build_output_filename(
///     "My Article",
///     "JohnDoe",
///     "https://x.com/johndoe/article/123",
///     Some("2026-01-15T08:00:00.000Z"),
/// );
/// assert!(name.starts_with("2026-01-15-my-article-johndoe-"));
/// assert!(name.ends_with(".kepub.epub"));
/// ```
pub fn build_output_filename(
    title: &str,
    handle: &str,
    source_url: &str,
    publish_date: Option<&str>,
) -> String {
    let date = publish_date.and_then(parse_calendar_date).unwrap_or_else(current_date);
    let slug = sanitize_title(title);
    let handle = handle.trim_start_matches('@').to_lowercase();

    let mut parts = vec![iso_date(date)];
    if !slug.is_empty() {
        parts.push(slug);
    }
    if !handle.is_empty() {
        parts.push(handle);
    }
    parts.push(source_hash(source_url));

    format!("{}.kepub.epub", parts.join("-"))
}

/// Reduce a title to a lowercase hyphenated slug.
fn sanitize_title(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for word in kept.split_whitespace() {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(word);
    }

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect()
}

/// 6-character base-36 digest of the source URL.
///
/// djb2 over the URL bytes. Collision resistance does not matter here;
/// the digest only disambiguates filenames.
fn source_hash(source_url: &str) -> String {
    let mut hash: u32 = 5381;
    for byte in source_url.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u32::from(byte));
    }

    let mut digest = to_base36(hash);
    digest.truncate(6);
    format!("{:0>6}", digest)
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while value > 0 {
        let digit = char::from_digit(value % 36, 36).unwrap_or('0');
        out.insert(0, digit);
        value /= 36;
    }
    out
}
