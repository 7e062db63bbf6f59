//! Article page metadata and body extraction.
//!
//! This module knows the markup conventions of X Article pages: the
//! `data-testid` hooks for the title, rich-text body, and photo
//! attachments, the byline link shapes, and the Draft.js block structure
//! that [`crate::draftjs`] normalizes away. The generic scoring machinery
//! in [`crate::extract`] does the heavy lifting; this module layers the
//! page-specific policy on top.

use std::collections::HashSet;

use regex::Regex;
use url::Url;

use crate::extract::{ExtractConfig, extract_content};
use crate::parse::Document;
use crate::tree::{self, Fragment};
use crate::{Article, Result, draftjs};

/// Author name used when every byline heuristic comes up empty.
const DEFAULT_AUTHOR: &str = "Unknown";

/// Title element candidates, most specific first.
const TITLE_SELECTORS: &[&str] = &[r#"[data-testid="twitterArticleTitle"]"#, "h1"];

/// The rich-text body container used by the fallback extraction stage.
const RICH_TEXT_SELECTOR: &str = r#"[data-testid="twitterArticleRichTextView"]"#;

/// Photo attachment images scanned during re-injection.
const PHOTO_SELECTOR: &str = r#"[data-testid="tweetPhoto"] img"#;

/// Media-CDN images sit outside photo containers on some pages; those
/// count as attachments too.
const MEDIA_IMG_SELECTOR: &str = r#"img[src*="pbs.twimg.com/media"]"#;

/// Avatar containers carry the handle in their test id suffix.
const AVATAR_SELECTOR: &str = r#"[data-testid^="UserAvatar-Container-"]"#;

/// URL substring that marks profile pictures rather than article photos.
const PROFILE_IMAGE_MARKER: &str = "profile_images";

/// Heuristic output shorter than this falls back to the rich-text container.
const MIN_BODY_CHARS: usize = 100;

/// Metadata fields extracted from an Article page.
///
/// `title` is `None` when the page carries no recognizable title element;
/// callers substitute the page `<title>` they already hold.
#[derive(Debug, Clone)]
pub struct ArticleMetadata {
    /// Title from the page's dedicated title element, if present.
    pub title: Option<String>,
    /// Author display name, `"Unknown"` when nothing matched.
    pub author: String,
    /// Author handle without the leading `@`, empty if the URL has none.
    pub handle: String,
    /// Raw `datetime` attribute of the first `<time>` element, or empty.
    pub publish_date: String,
}

/// Extract author, handle, title, and publish date from a page.
///
/// The handle comes from the source URL's first path segment, which is
/// reliable where the page markup is not. The author display name is
/// resolved against that handle in three passes: profile links pointing at
/// `/<handle>`, the avatar-container sibling heuristic, and finally the
/// `og:title` "by" suffix. Each pass degrades silently to the next; the
/// final default is `"Unknown"`.
///
/// # Example
///
/// ```rust
/// use kobopress_core::extract_metadata;
///
/// let html = r#"<html><body>
///     <a href="/janedoe">Jane Doe</a>
///     <time datetime="2026-01-15T10:30:00.000Z">Jan 15</time>
/// </body></html>"#;
///
/// let meta = extract_metadata(html, "https://x.com/janedoe/article/123").unwrap();
/// assert_eq!(meta.handle, "janedoe");
/// assert_eq!(meta.author, "Jane Doe");
/// assert_eq!(meta.publish_date, "2026-01-15T10:30:00.000Z");
/// ```
pub fn extract_metadata(html: &str, source_url: &str) -> Result<ArticleMetadata> {
    let doc = Document::parse(html)?;
    let handle = handle_from_url(source_url);

    let author = author_from_profile_links(&doc, &handle)
        .or_else(|| author_from_avatar(&doc, &handle))
        .or_else(|| author_from_og_title(&doc))
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let title = title_from_document(&doc);
    let publish_date = doc
        .select_first("time")?
        .and_then(|el| el.attr("datetime").map(str::to_string))
        .unwrap_or_default();

    Ok(ArticleMetadata { title, author, handle, publish_date })
}

/// Extract a complete [`Article`] from a rendered page.
///
/// Body selection runs in two stages. Draft.js blocks are normalized into
/// paragraphs first, then the scoring heuristic picks the main content
/// container. When that result is missing or implausibly short the known
/// rich-text container is used verbatim instead. Finally, photo
/// attachments that the heuristic dropped are re-appended inside the
/// body's outer wrapper, and a leading heading that duplicates the title
/// is removed.
///
/// A page that yields no body at all still produces an `Article` with an
/// empty `body_html`; degraded output is preferred over failing the
/// conversion.
pub fn extract_article(html: &str, source_url: &str, fallback_title: &str) -> Result<Article> {
    let metadata = extract_metadata(html, source_url)?;
    let title = metadata.title.unwrap_or_else(|| fallback_title.to_string());

    let normalized = draftjs::normalize(html);
    let body_html = extract_body(&normalized, source_url)?;
    let body_html = strip_duplicate_title(body_html, &title)?;
    let body_html = reinject_photos(&normalized, body_html)?;

    Ok(Article::new(
        title,
        metadata.author,
        metadata.handle,
        metadata.publish_date,
        body_html,
        source_url.to_string(),
    ))
}

/// The first path segment of the source URL, without any `@` prefix.
fn handle_from_url(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next().map(|s| s.to_string()))
        })
        .map(|segment| segment.trim_start_matches('@').to_string())
        .unwrap_or_default()
}

/// First pass: anchors linking to the author's own profile.
///
/// Qualifying anchors link to exactly `/<handle>`, carry visible text that
/// is not itself a handle, and do not contain the middot separator the
/// page uses between byline fragments.
fn author_from_profile_links(doc: &Document, handle: &str) -> Option<String> {
    if handle.is_empty() {
        return None;
    }

    let target = format!("/{}", handle.to_lowercase());
    let links = doc.select("a").ok()?;
    for link in &links {
        let Some(href) = link.attr("href") else { continue };
        let href = href.to_lowercase();
        if href != target || href.contains("/status/") {
            continue;
        }
        let text = link.text().trim().to_string();
        if !text.is_empty() && !text.starts_with('@') && !text.contains('\u{b7}') {
            return Some(text);
        }
    }

    None
}

/// Second pass: the display name next to the author's avatar.
///
/// The avatar container's siblings hold the name as a leaf span. The scan
/// widens one ancestor at a time because the number of wrapper levels
/// between avatar and name varies between page revisions.
fn author_from_avatar(doc: &Document, handle: &str) -> Option<String> {
    let containers = doc.select(AVATAR_SELECTOR).ok()?;
    let container = containers.into_iter().next()?;

    let mut scope = container.parent_element();
    for _ in 0..3 {
        let area = scope?;
        if let Ok(spans) = area.select("span") {
            for span in &spans {
                let is_leaf = span.select("span").map(|inner| inner.is_empty()).unwrap_or(false);
                if !is_leaf {
                    continue;
                }
                let text = span.text().trim().to_string();
                if !text.is_empty()
                    && !text.starts_with('@')
                    && !text.contains('\u{b7}')
                    && !text.eq_ignore_ascii_case(handle)
                {
                    return Some(text);
                }
            }
        }
        scope = area.parent_element();
    }

    None
}

/// Last pass: the `og:title` meta content of the form "Title by Author".
fn author_from_og_title(doc: &Document) -> Option<String> {
    let metas = doc.select(r#"meta[property="og:title"]"#).ok()?;
    let meta = metas.into_iter().next()?;
    let content = meta.attr("content")?;

    let by_pattern = Regex::new(r"\bby\s+(.+)$").unwrap();
    let author = by_pattern.captures(content)?.get(1)?.as_str().trim();
    if author.is_empty() { None } else { Some(author.to_string()) }
}

/// The page's dedicated title element, if any.
fn title_from_document(doc: &Document) -> Option<String> {
    for selector in TITLE_SELECTORS {
        if let Ok(Some(el)) = doc.select_first(selector) {
            let title = el.text().trim().to_string();
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    None
}

/// Two-stage body selection over the normalized page.
fn extract_body(normalized_html: &str, source_url: &str) -> Result<String> {
    let base_url = Url::parse(source_url).ok();
    let doc = Document::parse_with_preprocessing(normalized_html, base_url)?;

    let heuristic = extract_content(&doc, &ExtractConfig::default()).map(|e| e.content).ok();
    let plausible =
        heuristic.as_ref().is_some_and(|content| content.trim().chars().count() >= MIN_BODY_CHARS);
    if plausible {
        return Ok(heuristic.unwrap_or_default());
    }

    if let Some(fallback) = fallback_body(normalized_html)? {
        return Ok(fallback);
    }

    Ok(heuristic.unwrap_or_default())
}

/// The rich-text container's inner markup, if the page has one.
fn fallback_body(normalized_html: &str) -> Result<Option<String>> {
    let doc = Document::parse(normalized_html)?;
    Ok(doc.select_first(RICH_TEXT_SELECTOR)?.map(|container| container.inner_html()))
}

/// Remove a heading that repeats the article title.
///
/// The chapter header renders the title separately, so a body that starts
/// with the same text as an `<h1>`/`<h2>` would show it twice.
fn strip_duplicate_title(body_html: String, title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() || body_html.trim().is_empty() {
        return Ok(body_html);
    }

    let fragment = Fragment::parse(&body_html);
    let mut removed = false;
    for heading in fragment.select("h1, h2")? {
        if heading.text_contents().trim() == title {
            heading.detach();
            removed = true;
        }
    }

    if removed { Ok(fragment.body_inner_html()) } else { Ok(body_html) }
}

/// Append photo attachments the heuristic extraction dropped.
///
/// Scans the full page for photo containers and appends an `<img>` for
/// every source not already present in the body, immediately inside the
/// body's outer wrapper. Profile pictures never qualify.
fn reinject_photos(page_html: &str, body_html: String) -> Result<String> {
    if body_html.trim().is_empty() {
        return Ok(body_html);
    }

    let page = Document::parse(page_html)?;
    let mut photos = page.select(PHOTO_SELECTOR)?;
    photos.extend(page.select(MEDIA_IMG_SELECTOR)?);
    if photos.is_empty() {
        return Ok(body_html);
    }

    let fragment = Fragment::parse(&body_html);
    let existing: HashSet<String> = fragment
        .select("img")?
        .iter()
        .filter_map(|node| tree::get_attr(node, "src"))
        .collect();

    let mut missing: Vec<String> = Vec::new();
    for photo in &photos {
        let Some(src) = photo.attr("src") else { continue };
        if src.is_empty() || src.contains(PROFILE_IMAGE_MARKER) || existing.contains(src) {
            continue;
        }
        if !missing.iter().any(|seen| seen == src) {
            missing.push(src.to_string());
        }
    }
    if missing.is_empty() {
        return Ok(body_html);
    }

    let body = fragment.body();
    let target = body.children().find(|child| child.as_element().is_some()).unwrap_or(body);
    for src in &missing {
        target.append(tree::new_elem("img", &[("src", src)]));
    }

    Ok(fragment.body_inner_html())
}
