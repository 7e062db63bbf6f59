//! Raw-HTML cleanup that runs before parsing and scoring.
//!
//! Everything here operates on the HTML text through streaming rewrites, so
//! multi-megabyte rendered pages never get a full DOM until after the noise
//! is gone.

use std::borrow::Cow;

use lol_html::{ElementContentHandlers, RewriteStrSettings, Selector, element, rewrite_str};
use regex::Regex;
use url::Url;

/// Tags stripped wholesale before content scoring. Rendered article pages
/// carry large amounts of interface chrome in these.
const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "canvas"];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script/style/noscript/iframe/canvas tags
    pub remove_noise_tags: bool,
    /// Whether to remove svg tags (icon chrome on rendered pages)
    pub remove_svg: bool,
    /// Whether to unwrap unlikely candidate containers
    pub remove_unlikely: bool,
    /// Whether to keep positive candidates even if they match unlikely patterns
    pub keep_positive: bool,
    /// Whether to remove hidden elements
    pub remove_hidden: bool,
    /// Whether to convert relative URLs to absolute
    pub convert_urls: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_noise_tags: true,
            remove_svg: true,
            remove_unlikely: true,
            keep_positive: true,
            remove_hidden: true,
            convert_urls: true,
            base_url: None,
        }
    }
}

/// Preprocess HTML by removing unwanted elements and normalizing URLs.
///
/// Whitespace is left untouched: article bodies may contain preformatted
/// blocks whose layout must survive into the chapter.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = html.to_string();

    if config.remove_noise_tags || config.remove_svg {
        processed = remove_noise_elements(&processed, config);
    }

    processed = remove_comments(&processed);

    if config.remove_unlikely {
        processed = remove_unlikely_candidates(&processed, config.keep_positive);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if config.convert_urls
        && let Some(base_url) = &config.base_url
    {
        processed = convert_relative_urls(&processed, base_url);
    }

    processed
}

/// Run one streaming rewrite pass. Falls back to the input unchanged when
/// the rewriter chokes on malformed markup.
fn rewrite_html<'a>(
    html: &str,
    handlers: Vec<(Cow<'a, Selector>, ElementContentHandlers<'a>)>,
) -> String {
    let settings = RewriteStrSettings { element_content_handlers: handlers, ..Default::default() };
    match rewrite_str(html, settings) {
        Ok(output) if !output.is_empty() => output,
        _ => html.to_string(),
    }
}

/// Drop noise tags (and optionally svg) together with their contents.
fn remove_noise_elements(html: &str, config: &PreprocessConfig) -> String {
    let mut tags: Vec<&str> = Vec::new();
    if config.remove_noise_tags {
        tags.extend_from_slice(NOISE_TAGS);
    }
    if config.remove_svg {
        tags.push("svg");
    }

    let handlers = tags
        .into_iter()
        .map(|tag| {
            element!(tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    rewrite_html(html, handlers)
}

fn remove_comments(html: &str) -> String {
    let re = Regex::new(r"<!--.*?-->").unwrap();
    re.replace_all(html, "").to_string()
}

/// Unwrap containers whose class or id marks them as page chrome. With
/// `keep_positive`, a prose-like name on the same attribute vetoes the
/// removal so Draft.js editor wrappers survive.
fn remove_unlikely_candidates(html: &str, keep_positive: bool) -> String {
    let unlikely = Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|modal|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|toolbar)",
    ).unwrap();

    let positive = Regex::new(
        r"(?i)(article|body|content|draft|entry|hentry|h-entry|main|page|post|richtext|text|blog|story|tweet)",
    )
    .unwrap();

    let handlers = vec![element!("*", |el| {
        if let Some(id) = el.get_attribute("id")
            && unlikely.is_match(&id)
            && (!keep_positive || !positive.is_match(&id))
        {
            el.remove_and_keep_content();
            return Ok(());
        }

        if let Some(class) = el.get_attribute("class") {
            for token in class.split_whitespace() {
                if unlikely.is_match(token) && (!keep_positive || !positive.is_match(token)) {
                    el.remove_and_keep_content();
                    return Ok(());
                }
            }
        }

        Ok(())
    })];

    rewrite_html(html, handlers)
}

/// Resolve relative `href`/`src` attributes against the page URL so links
/// and image references stay valid outside the origin site.
pub fn convert_relative_urls(html: &str, base_url: &Url) -> String {
    let handlers = vec![
        element!("a", |el| {
            if let Some(href) = el.get_attribute("href")
                && let Ok(absolute) = base_url.join(&href)
            {
                el.set_attribute("href", absolute.as_str()).ok();
            }
            Ok(())
        }),
        element!("img", |el| {
            if let Some(src) = el.get_attribute("src")
                && let Ok(absolute) = base_url.join(&src)
            {
                el.set_attribute("src", absolute.as_str()).ok();
            }
            Ok(())
        }),
        element!("link", |el| {
            if let Some(href) = el.get_attribute("href")
                && let Ok(absolute) = base_url.join(&href)
            {
                el.set_attribute("href", absolute.as_str()).ok();
            }
            Ok(())
        }),
    ];

    rewrite_html(html, handlers)
}

/// Drop elements styled `display:none` or `visibility:hidden`.
fn remove_hidden_elements(html: &str) -> String {
    let hidden = Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap();

    let handlers = vec![element!("*", |el| {
        if let Some(style) = el.get_attribute("style")
            && hidden.is_match(&style)
        {
            el.remove();
        }
        Ok(())
    })];

    rewrite_html(html, handlers)
}
