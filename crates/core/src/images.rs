//! Image discovery, download, and rewrite pipeline.
//!
//! Takes the extracted body fragment, finds its images, downloads each
//! unique source once through a caller-supplied [`ImageFetcher`], and
//! rewrites the fragment to reference the downloaded copies under
//! `images/`. Downloads run in batches of four; a failed download removes
//! the affected nodes and is reported only through the result counts,
//! never as an error.
//!
//! The pipeline runs in three phases so that no DOM handle lives across an
//! await point: plan (parse, filter, deduplicate), fetch (URLs and bytes
//! only), apply (re-parse and rewrite). This keeps the returned future
//! `Send` even though the tree type is reference-counted.

use std::collections::HashMap;

use async_trait::async_trait;

use url::Url;

use crate::tree::{self, Fragment};
use crate::Result;

#[cfg(feature = "transcode")]
use crate::KobopressError;

/// Maximum in-flight downloads per batch.
const DOWNLOAD_BATCH_SIZE: usize = 4;

/// Media CDN host whose URLs are rewritten to the largest JPEG variant.
const MEDIA_CDN_HOST: &str = "pbs.twimg.com";

/// URL substring that marks profile pictures rather than article photos.
const PROFILE_IMAGE_MARKER: &str = "profile_images";

/// JPEG quality used when transcoding WebP sources.
#[cfg(feature = "transcode")]
const JPEG_QUALITY: u8 = 90;

/// A downloaded image ready for embedding.
///
/// Created by the pipeline; ownership passes to the EPUB builder which
/// copies the bytes into the archive.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Archive filename, `img-<seq>.<ext>` with a zero-padded sequence.
    pub filename: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Media type as declared in the package manifest.
    pub media_type: &'static str,
}

/// The outcome of running the image pipeline over a body fragment.
#[derive(Debug, Clone)]
pub struct ImageResult {
    /// The body fragment with image references rewritten to local paths.
    pub html: String,
    /// Downloaded assets in document order.
    pub images: Vec<ImageAsset>,
    /// Image references seen before any filtering.
    pub total_found: usize,
    /// Successful downloads; always equals `images.len()`.
    pub total_downloaded: usize,
}

/// Response produced by a fetch capability.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Declared `Content-Type` header value, if any.
    pub content_type: Option<String>,
}

impl FetchResponse {
    /// Whether the status code indicates success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An authenticated HTTP GET capability supplied by the caller.
///
/// Conversions of pages behind a login reuse whatever session state the
/// caller established; the pipeline itself never manages credentials.
/// Implementations must be cheap to share by reference across concurrent
/// downloads.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch a URL, returning status, body, and declared content type.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// One unique download, pre-assigned its document-order sequence number.
#[derive(Debug, Clone)]
struct PlannedJob {
    url: String,
    sequence: usize,
}

/// Fetch outcome for one job; `asset` is `None` when the job failed.
#[derive(Debug)]
struct JobOutcome {
    url: String,
    asset: Option<ImageAsset>,
}

/// The sync planning phase's output.
struct DownloadPlan {
    html: String,
    jobs: Vec<PlannedJob>,
    total_found: usize,
}

/// Download all images referenced by a body fragment.
///
/// Images with an empty `src` or a profile-picture source are removed
/// without being fetched. Remaining sources are normalized (the media CDN
/// is asked for the large JPEG variant), deduplicated, and fetched in
/// batches of four. Every node sharing a source is rewritten together on
/// success or removed together on failure. Filenames follow first-seen
/// document order regardless of completion order.
///
/// A fragment without images returns immediately with no requests made.
///
/// # Example
///
/// ```rust,no_run
/// use kobopress_core::{ImageFetcher, download_images};
///
/// async fn run(fetcher: &dyn ImageFetcher) {
///     let body = r#"<p>Hi</p><img src="https://pbs.twimg.com/media/a.jpg">"#;
///     let result = download_images(body, fetcher).await.unwrap();
///     assert_eq!(result.total_found, 1);
/// }
/// ```
pub async fn download_images(body_html: &str, fetcher: &dyn ImageFetcher) -> Result<ImageResult> {
    let plan = collect_jobs(body_html)?;
    if plan.jobs.is_empty() {
        return Ok(ImageResult {
            html: plan.html,
            images: Vec::new(),
            total_found: plan.total_found,
            total_downloaded: 0,
        });
    }

    let mut outcomes = Vec::with_capacity(plan.jobs.len());
    for chunk in plan.jobs.chunks(DOWNLOAD_BATCH_SIZE) {
        let batch: Vec<_> = chunk.iter().map(|job| fetch_one(job, fetcher)).collect();
        outcomes.extend(futures::future::join_all(batch).await);
    }

    let (html, images) = apply_outcomes(&plan.html, outcomes)?;
    let total_downloaded = images.len();

    Ok(ImageResult { html, images, total_found: plan.total_found, total_downloaded })
}

/// Phase 1: filter unusable images and plan one job per unique source.
fn collect_jobs(body_html: &str) -> Result<DownloadPlan> {
    let fragment = Fragment::parse(body_html);
    let images = fragment.select("img")?;
    let total_found = images.len();

    let mut jobs: Vec<PlannedJob> = Vec::new();
    for img in images {
        let src = tree::get_attr(&img, "src").unwrap_or_default();
        if src.is_empty() || src.contains(PROFILE_IMAGE_MARKER) {
            img.detach();
            continue;
        }

        let url = canonical_image_url(&src);
        if !jobs.iter().any(|job| job.url == url) {
            let sequence = jobs.len() + 1;
            jobs.push(PlannedJob { url, sequence });
        }
    }

    Ok(DownloadPlan { html: fragment.body_inner_html(), jobs, total_found })
}

/// Phase 2: fetch one job, classify its bytes, and build the asset.
async fn fetch_one(job: &PlannedJob, fetcher: &dyn ImageFetcher) -> JobOutcome {
    let failed = JobOutcome { url: job.url.clone(), asset: None };

    let response = match fetcher.get(&job.url).await {
        Ok(response) => response,
        Err(_) => return failed,
    };
    if !response.is_success() {
        return failed;
    }

    let mut data = response.body;
    let mut media_type = detect_media_type(&data, response.content_type.as_deref());

    if media_type == "image/webp" {
        match transcode_webp(&data) {
            Ok(jpeg) => {
                data = jpeg;
                media_type = "image/jpeg";
            }
            Err(_) => return failed,
        }
    }

    let filename = format!("img-{:03}.{}", job.sequence, extension_for(media_type));
    JobOutcome { url: job.url.clone(), asset: Some(ImageAsset { filename, data, media_type }) }
}

/// Phase 3: rewrite every node group according to its job's outcome.
fn apply_outcomes(html: &str, outcomes: Vec<JobOutcome>) -> Result<(String, Vec<ImageAsset>)> {
    let mut filenames: HashMap<String, Option<String>> = HashMap::new();
    let mut assets = Vec::new();
    for outcome in outcomes {
        match outcome.asset {
            Some(asset) => {
                filenames.insert(outcome.url, Some(asset.filename.clone()));
                assets.push(asset);
            }
            None => {
                filenames.insert(outcome.url, None);
            }
        }
    }

    let fragment = Fragment::parse(html);
    for img in fragment.select("img")? {
        let Some(src) = tree::get_attr(&img, "src") else { continue };
        match filenames.get(&canonical_image_url(&src)) {
            Some(Some(filename)) => tree::set_attr(&img, "src", &format!("images/{}", filename)),
            Some(None) => img.detach(),
            None => {}
        }
    }

    Ok((fragment.body_inner_html(), assets))
}

/// Normalize a source URL into its canonical download form.
///
/// Media CDN URLs are asked for the large JPEG rendition; everything else
/// is left untouched. The canonical form is also the deduplication key, so
/// size variants of the same photo collapse into one download.
fn canonical_image_url(src: &str) -> String {
    let Ok(mut url) = Url::parse(src) else {
        return src.to_string();
    };
    if url.host_str() != Some(MEDIA_CDN_HOST) {
        return src.to_string();
    }

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "format" && key != "name")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair("format", "jpg");
        pairs.append_pair("name", "large");
    }

    url.to_string()
}

/// Classify image bytes into a manifest media type.
///
/// A declared content type from the recognized set wins. Otherwise the
/// first bytes are checked for JPEG, PNG, WebP, and GIF signatures in that
/// order, defaulting to JPEG.
fn detect_media_type(data: &[u8], content_type: Option<&str>) -> &'static str {
    if let Some(declared) = content_type {
        match declared.split(';').next().unwrap_or("").trim() {
            "image/jpeg" => return "image/jpeg",
            "image/png" => return "image/png",
            "image/gif" => return "image/gif",
            "image/webp" => return "image/webp",
            _ => {}
        }
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.starts_with(b"GIF8") {
        return "image/gif";
    }

    "image/jpeg"
}

/// File extension for a classified media type.
fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Re-encode a WebP image as JPEG.
#[cfg(feature = "transcode")]
fn transcode_webp(data: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| KobopressError::TranscodeError(e.to_string()))?;
    let rgb = decoded.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|e| KobopressError::TranscodeError(e.to_string()))?;

    Ok(out)
}

/// Without codec support a WebP source cannot be embedded; fail the job.
#[cfg(not(feature = "transcode"))]
fn transcode_webp(_data: &[u8]) -> Result<Vec<u8>> {
    Err(crate::KobopressError::TranscodeError(
        "WebP support requires the transcode feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct MockFetcher {
        responses: HashMap<String, FetchResponse>,
        requests: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self { responses: HashMap::new(), requests: Mutex::new(Vec::new()) }
        }

        fn respond(mut self, url: &str, status: u16, body: &[u8], content_type: Option<&str>) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    status,
                    body: body.to_vec(),
                    content_type: content_type.map(str::to_string),
                },
            );
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requested(&self, url: &str) -> bool {
            self.requests.lock().unwrap().iter().any(|seen| seen == url)
        }
    }

    #[async_trait]
    impl ImageFetcher for MockFetcher {
        async fn get(&self, url: &str) -> Result<FetchResponse> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(response) => Ok(response.clone()),
                None => Ok(FetchResponse { status: 404, body: Vec::new(), content_type: None }),
            }
        }
    }

    #[tokio::test]
    async fn test_no_images_makes_no_requests() {
        let fetcher = MockFetcher::new();
        let result = download_images("<p>Just text, no pictures.</p>", &fetcher).await.unwrap();

        assert_eq!(result.total_found, 0);
        assert_eq!(result.total_downloaded, 0);
        assert!(result.images.is_empty());
        assert!(result.html.contains("Just text"));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_filters_profile_and_missing_sources() {
        let html = r#"
            <p>Text</p>
            <img src="https://pbs.twimg.com/profile_images/1/jane.jpg">
            <img>
        "#;
        let fetcher = MockFetcher::new();
        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_found, 2);
        assert_eq!(result.total_downloaded, 0);
        assert!(!result.html.contains("<img"));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_downloads_rewrite_and_sequence() {
        let html = r#"
            <img src="https://pbs.twimg.com/media/first.jpg">
            <img src="https://example.com/second.png">
        "#;
        let first_canonical = "https://pbs.twimg.com/media/first.jpg?format=jpg&name=large";
        let fetcher = MockFetcher::new()
            .respond(first_canonical, 200, JPEG_BYTES, Some("image/jpeg"))
            .respond("https://example.com/second.png", 200, PNG_BYTES, Some("image/png"));

        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_found, 2);
        assert_eq!(result.total_downloaded, 2);
        assert_eq!(result.images[0].filename, "img-001.jpg");
        assert_eq!(result.images[1].filename, "img-002.png");
        assert_eq!(result.images[0].media_type, "image/jpeg");
        assert!(result.html.contains(r#"src="images/img-001.jpg""#));
        assert!(result.html.contains(r#"src="images/img-002.png""#));
        assert!(fetcher.requested(first_canonical));
    }

    #[tokio::test]
    async fn test_duplicate_sources_fetch_once() {
        let html = r#"
            <img src="https://example.com/photo.jpg">
            <p>Repeated below.</p>
            <img src="https://example.com/photo.jpg">
        "#;
        let fetcher =
            MockFetcher::new().respond("https://example.com/photo.jpg", 200, JPEG_BYTES, None);

        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_found, 2);
        assert_eq!(result.total_downloaded, 1);
        assert_eq!(result.images.len(), 1);
        assert_eq!(fetcher.request_count(), 1);
        assert_eq!(result.html.matches(r#"src="images/img-001.jpg""#).count(), 2);
    }

    #[tokio::test]
    async fn test_failed_download_removes_group() {
        let html = r#"
            <img src="https://example.com/gone.jpg">
            <img src="https://example.com/gone.jpg">
            <p>Survives.</p>
        "#;
        let fetcher = MockFetcher::new();

        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_found, 2);
        assert_eq!(result.total_downloaded, 0);
        assert!(!result.html.contains("<img"));
        assert!(result.html.contains("Survives."));
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_sequence_of_later_jobs() {
        let html = r#"
            <img src="https://example.com/fails.jpg">
            <img src="https://example.com/works.png">
        "#;
        let fetcher =
            MockFetcher::new().respond("https://example.com/works.png", 200, PNG_BYTES, None);

        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_downloaded, 1);
        assert_eq!(result.images[0].filename, "img-002.png");
        assert!(result.html.contains("img-002.png"));
        assert!(!result.html.contains("fails.jpg"));
    }

    #[tokio::test]
    async fn test_more_jobs_than_one_batch() {
        let mut html = String::new();
        let mut fetcher = MockFetcher::new();
        for i in 1..=6 {
            let url = format!("https://example.com/photo-{}.jpg", i);
            html.push_str(&format!(r#"<img src="{}">"#, url));
            fetcher = fetcher.respond(&url, 200, JPEG_BYTES, Some("image/jpeg"));
        }

        let result = download_images(&html, &fetcher).await.unwrap();

        assert_eq!(result.total_downloaded, 6);
        let filenames: Vec<&str> = result.images.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(
            filenames,
            ["img-001.jpg", "img-002.jpg", "img-003.jpg", "img-004.jpg", "img-005.jpg", "img-006.jpg"]
        );
        assert_eq!(fetcher.request_count(), 6);
    }

    #[tokio::test]
    async fn test_webp_garbage_fails_job() {
        // RIFF/WEBP magic with an undecodable payload: without codec
        // support the job fails outright, with it the decode error does.
        let mut webp = b"RIFF\x24\x00\x00\x00WEBP".to_vec();
        webp.extend_from_slice(&[0x00; 16]);

        let html = r#"<img src="https://example.com/anim.webp"><p>Text.</p>"#;
        let fetcher = MockFetcher::new().respond(
            "https://example.com/anim.webp",
            200,
            &webp,
            Some("image/webp"),
        );

        let result = download_images(html, &fetcher).await.unwrap();

        assert_eq!(result.total_found, 1);
        assert_eq!(result.total_downloaded, 0);
        assert!(!result.html.contains("<img"));
    }

    #[test]
    fn test_canonical_url_rewrites_cdn() {
        let canonical = canonical_image_url("https://pbs.twimg.com/media/abc.png?name=small");
        assert_eq!(canonical, "https://pbs.twimg.com/media/abc.png?format=jpg&name=large");
    }

    #[test]
    fn test_canonical_url_leaves_other_hosts() {
        let src = "https://example.com/pic.jpg?name=small";
        assert_eq!(canonical_image_url(src), src);

        let relative = "images/img-001.jpg";
        assert_eq!(canonical_image_url(relative), relative);
    }

    #[test]
    fn test_detect_media_type_trusts_declared() {
        assert_eq!(detect_media_type(JPEG_BYTES, Some("image/png")), "image/png");
        assert_eq!(detect_media_type(&[], Some("image/gif; charset=binary")), "image/gif");
    }

    #[test]
    fn test_detect_media_type_sniffs_on_octet_stream() {
        assert_eq!(detect_media_type(JPEG_BYTES, Some("application/octet-stream")), "image/jpeg");
        assert_eq!(detect_media_type(PNG_BYTES, Some("application/octet-stream")), "image/png");

        let webp = b"RIFF\x00\x00\x00\x00WEBPVP8 ";
        assert_eq!(detect_media_type(webp, None), "image/webp");

        let gif = b"GIF89a";
        assert_eq!(detect_media_type(gif, None), "image/gif");
    }

    #[test]
    fn test_detect_media_type_defaults_to_jpeg() {
        assert_eq!(detect_media_type(b"????", Some("application/octet-stream")), "image/jpeg");
        assert_eq!(detect_media_type(b"", None), "image/jpeg");
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/gif"), "gif");
        assert_eq!(extension_for("image/webp"), "webp");
    }
}
