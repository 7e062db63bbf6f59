//! Read-only DOM queries over a parsed page.
//!
//! [`Document`] and [`Element`] are the query-side view of an Article
//! page: metadata extraction walks them for `data-testid` hooks and
//! bylines, and the content scorer reads text and attributes through
//! them. Anything that needs to change the markup goes through
//! [`crate::tree`] instead.

use scraper::{Html, Selector};
use url::Url;

use crate::{KobopressError, PreprocessConfig, Result, preprocess};

/// A parsed page, queryable by CSS selector.
///
/// ```rust
/// use kobopress_core::parse::Document;
///
/// let html = r#"<title>Field Notes</title><time datetime="2026-01-15T10:30:00.000Z">Jan 15</time>"#;
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Field Notes".to_string()));
/// assert!(doc.select_first("time[datetime]").unwrap().is_some());
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML as-is, with no cleanup.
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self { html: Html::parse_document(html) })
    }

    /// Parses HTML after the preprocessing passes: noise and chrome
    /// stripping, hidden-element removal, and relative-URL resolution
    /// against `base_url`. Extraction entry points come through here so
    /// scoring sees cleaned markup.
    pub fn parse_with_preprocessing(html: &str, base_url: Option<Url>) -> Result<Self> {
        let config = PreprocessConfig { base_url, ..Default::default() };
        let cleaned = preprocess::preprocess_html(html, &config);
        Ok(Self { html: Html::parse_document(&cleaned) })
    }

    /// Selects all elements matching a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`KobopressError::HtmlParseError`] if the selector is
    /// invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    /// The content of the `<title>` element, if present. Used as the
    /// fallback when a page carries no dedicated article title element.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html.select(&selector).next().map(|el| el.text().collect::<String>())
    }

    /// All text content of the page, concatenated.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| KobopressError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// One element of a [`Document`].
///
/// ```rust
/// use kobopress_core::parse::Document;
///
/// let doc = Document::parse(r#"<a href="/janedoe" role="link">Jane Doe</a>"#).unwrap();
/// let byline = &doc.select("a[role=link]").unwrap()[0];
///
/// assert_eq!(byline.text(), "Jane Doe");
/// assert_eq!(byline.attr("href"), Some("/janedoe"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// The element's inner HTML.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// The element's outer HTML, including its own tag.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// All text content of the element, concatenated.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// An attribute value, or `None` when absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// The lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Stable tree identifier, used by extraction to dedupe candidates.
    pub(crate) fn node_id(&self) -> ego_tree::NodeId {
        self.element.id()
    }

    /// The nearest ancestor that is itself an element.
    pub(crate) fn parent_element(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(scraper::ElementRef::wrap).map(|element| Element { element })
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`KobopressError::HtmlParseError`] if the selector is
    /// invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="/janedoe">Jane Doe</a>
            <time datetime="2026-01-15T10:30:00.000Z">Jan 15</time>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_select_first() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let time = doc.select_first("time[datetime]").unwrap();

        assert!(time.is_some());
        assert_eq!(time.unwrap().attr("datetime"), Some("2026-01-15T10:30:00.000Z"));

        let missing = doc.select_first("video").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("/janedoe"));
        assert_eq!(elements[0].text(), "Jane Doe");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(KobopressError::HtmlParseError(_))));
    }

    #[test]
    fn test_parent_element() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let paragraph = doc.select_first("p.content").unwrap().unwrap();

        let parent = paragraph.parent_element().unwrap();
        assert_eq!(parent.tag_name(), "body");
        assert_eq!(parent.parent_element().unwrap().tag_name(), "html");
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let text = doc.text_content();

        assert!(text.contains("Heading"));
        assert!(text.contains("Paragraph 1"));
        assert!(text.contains("Paragraph 2"));
    }

    #[test]
    fn test_preprocessed_parse_resolves_urls() {
        let base = Url::parse("https://x.com/janedoe/article/123").unwrap();
        let html = r#"<body><a href="/janedoe">Jane</a><script>var x;</script></body>"#;

        let doc = Document::parse_with_preprocessing(html, Some(base)).unwrap();
        let link = doc.select_first("a").unwrap().unwrap();
        assert_eq!(link.attr("href"), Some("https://x.com/janedoe"));
        assert!(doc.select("script").unwrap().is_empty());
    }
}
