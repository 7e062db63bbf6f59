//! The end-to-end conversion pipeline.
//!
//! This module strings the stages together: extract the Article from page
//! HTML, download and localize its images, assemble the EPUB archive, and
//! rewrite the chapter into Kobo's annotated form. The main entry point
//! is the [`Converter`] struct, along with the [`convert_html`] function
//! for callers that already hold the page markup.

use crate::epub::{build_epub, rewrite_chapter};
use crate::images::{ImageFetcher, download_images};
use crate::kepub::transform_to_kepub;
use crate::metadata::extract_article;
use crate::parse::Document;
use crate::{Article, Result};

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, SessionFetcher, fetch_file};
#[cfg(feature = "fetch")]
use crate::filename::validate_article_url;

/// Index assigned to the single chapter in `kobo.<chapter>.<seq>` ids.
const CHAPTER_INDEX: usize = 1;

/// Everything produced by one conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The extracted Article, body already rewritten to local image paths.
    pub article: Article,
    /// The finished KEPUB archive bytes.
    pub data: Vec<u8>,
    /// Filename the archive should be saved under.
    pub filename: String,
    /// Image references found in the body before filtering.
    pub images_found: usize,
    /// Images successfully downloaded and embedded.
    pub images_downloaded: usize,
}

/// Converts page HTML into a KEPUB archive.
///
/// The fetcher is only used for image downloads; the page itself has
/// already been loaded by the caller. The page `title` element serves as
/// the fallback when the Article markup carries no title of its own.
pub async fn convert_html(
    html: &str,
    url: &str,
    fetcher: &dyn ImageFetcher,
) -> Result<Conversion> {
    let fallback_title = Document::parse(html)?.title().unwrap_or_default();
    let mut article = extract_article(html, url, &fallback_title)?;

    let images = download_images(&article.body_html, fetcher).await?;
    article.body_html = images.html;

    let epub = build_epub(&article, &images.images)?;
    let data = rewrite_chapter(&epub.data, |xhtml| transform_to_kepub(xhtml, CHAPTER_INDEX))?;

    Ok(Conversion {
        article,
        data,
        filename: epub.filename,
        images_found: images.total_found,
        images_downloaded: images.total_downloaded,
    })
}

/// Converts Article pages fetched over HTTP.
///
/// Holds the fetch configuration so one instance can convert many URLs
/// with the same session cookie and timeout.
///
/// # Example
///
/// ```no_run
/// use kobopress_core::{Converter, FetchConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let converter = Converter::with_config(FetchConfig::default().with_cookie("auth_token=abc"));
///     let conversion = converter.convert_url("https://x.com/jane/article/123").await?;
///     std::fs::write(&conversion.filename, &conversion.data)?;
///     Ok(())
/// }
/// ```
#[cfg(feature = "fetch")]
pub struct Converter {
    fetch_config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl Converter {
    /// Creates a converter with default fetch settings.
    pub fn new() -> Self {
        Self { fetch_config: FetchConfig::default() }
    }

    /// Creates a converter with a custom fetch configuration.
    pub fn with_config(fetch_config: FetchConfig) -> Self {
        Self { fetch_config }
    }

    /// Fetches an Article page and converts it.
    ///
    /// The URL is validated before any network traffic happens; the page
    /// fetch and all image downloads then share one session.
    pub async fn convert_url(&self, url: &str) -> Result<Conversion> {
        validate_article_url(url)?;
        let session = SessionFetcher::new(self.fetch_config.clone())?;
        let html = session.fetch_page(url).await?;
        convert_html(&html, url, &session).await
    }

    /// Converts a locally saved Article page.
    ///
    /// The page HTML comes from `path`; images are still fetched over the
    /// network, and `url` provides the canonical identity for metadata
    /// and the output filename.
    pub async fn convert_file(&self, path: &str, url: &str) -> Result<Conversion> {
        let html = fetch_file(path)?;
        let session = SessionFetcher::new(self.fetch_config.clone())?;
        convert_html(&html, url, &session).await
    }
}

#[cfg(feature = "fetch")]
impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: fetch and convert one URL with default settings.
#[cfg(feature = "fetch")]
pub async fn convert_url(url: &str) -> Result<Conversion> {
    Converter::new().convert_url(url).await
}
