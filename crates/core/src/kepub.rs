//! Kobo-flavored chapter rewriting.
//!
//! Kobo readers require each piece of prose to sit inside a `koboSpan`
//! with a positional id; page turns, highlights, and progress tracking all
//! address text through those ids. This module rewrites a finished XHTML
//! chapter into that form: every meaningful text node is wrapped, and the
//! body content is nested in the `book-inner`/`book-columns` containers
//! the renderer paginates with.

use kuchiki::NodeRef;
use regex::Regex;

use crate::Result;
use crate::tree::{self, Fragment};

/// Marker class carried by every generated wrapper span.
const SPAN_CLASS: &str = "koboSpan";

/// Elements whose text must render unmodified.
const SKIP_ELEMENTS: &[&str] = &["pre", "code", "script", "style", "svg", "math"];

const XHTML_NAMESPACE: &str = r#"xmlns="http://www.w3.org/1999/xhtml""#;
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Rewrites a chapter document into Kobo's span-annotated form.
///
/// Wraps each non-whitespace text node under `body` in a
/// `<span class="koboSpan" id="kobo.<chapter>.<seq>">`, skipping text
/// inside preformatted or non-prose elements and text that is already
/// wrapped, then nests the body content in the renderer's column
/// containers. The sequence counter is 1-based and scoped to this call.
///
/// Running the transform on its own output changes nothing: wrapped spans
/// are detected by their marker class and the column containers are only
/// added once.
///
/// # Example
///
/// ```rust
/// use kobopress_core::transform_to_kepub;
///
/// let chapter = "<html><body><p>Hello world</p></body></html>";
/// let kepub = transform_to_kepub(chapter, 1).unwrap();
/// assert!(kepub.contains(r#"<span class="koboSpan" id="kobo.1.1">Hello world</span>"#));
/// assert!(kepub.contains(r#"<div class="book-columns">"#));
/// ```
pub fn transform_to_kepub(xhtml: &str, chapter_index: usize) -> Result<String> {
    let fragment = Fragment::parse(xhtml);
    let body = fragment.body();

    wrap_text_nodes(&body, chapter_index);
    wrap_body_content(&body);

    let mut output = match fragment.select("html")?.into_iter().next() {
        Some(root) => tree::serialize_node(&root),
        None => fragment.to_html(),
    };
    if !output.contains(XHTML_NAMESPACE) {
        output = output.replacen("<html", &format!("<html {}", XHTML_NAMESPACE), 1);
    }
    let output = close_void_elements(&output);

    Ok(format!("{}\n{}", XML_DECLARATION, output))
}

/// Wrap every eligible text node under `body`, returning the wrap count.
fn wrap_text_nodes(body: &NodeRef, chapter_index: usize) -> usize {
    let text_nodes: Vec<NodeRef> =
        body.descendants().filter(|node| node.as_text().is_some()).collect();

    let mut sequence = 1;
    for text_node in text_nodes {
        let Some(text) = text_node.as_text() else { continue };
        let content = text.borrow().clone();

        if content.trim().is_empty() {
            continue;
        }
        if inside_skip_element(&text_node) {
            continue;
        }
        if parent_already_wrapped(&text_node) {
            continue;
        }

        let span = tree::new_elem(
            "span",
            &[("class", SPAN_CLASS), ("id", &format!("kobo.{}.{}", chapter_index, sequence))],
        );
        span.append(NodeRef::new_text(content));
        text_node.insert_before(span);
        text_node.detach();
        sequence += 1;
    }

    sequence - 1
}

fn inside_skip_element(node: &NodeRef) -> bool {
    node.ancestors().any(|ancestor| {
        tree::tag_name(&ancestor).is_some_and(|name| SKIP_ELEMENTS.contains(&name.as_str()))
    })
}

fn parent_already_wrapped(node: &NodeRef) -> bool {
    node.parent().is_some_and(|parent| tree::has_class(&parent, SPAN_CLASS))
}

/// Nest the body content in `book-inner > book-columns`, once.
fn wrap_body_content(body: &NodeRef) {
    if body.children().any(|child| tree::has_class(&child, "book-inner")) {
        return;
    }

    let inner = tree::new_elem("div", &[("class", "book-inner")]);
    let columns = tree::new_elem("div", &[("class", "book-columns")]);

    let children: Vec<NodeRef> = body.children().collect();
    for child in children {
        columns.append(child);
    }
    inner.append(columns);
    body.append(inner);
}

/// Rewrite void elements to self-closing XHTML syntax.
///
/// The HTML serializer emits `<br>` and friends unclosed. Quoted attribute
/// values may contain `/` or `>`, so the attribute run is matched with
/// explicit quoted-string alternates rather than a bare character class;
/// a bare trailing `/` is absorbed, which keeps already-closed tags
/// unchanged.
fn close_void_elements(xhtml: &str) -> String {
    let void_tags =
        Regex::new(r#"<(br|hr|img|input|link|meta)\b((?:"[^"]*"|'[^']*'|[^>"'/])*)\s*/?>"#)
            .unwrap();
    void_tags.replace_all(xhtml, "<${1}${2}/>").into_owned()
}
