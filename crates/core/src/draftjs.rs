//! Draft.js editor-markup normalization.
//!
//! Rendered article bodies come out of a rich-text editor that wraps every
//! paragraph in `div.public-DraftStyleDefault-block` and several layers of
//! positioning divs, all annotated with editor-internal data attributes.
//! This module rewrites that structure into plain paragraphs so both the
//! content heuristic and the fallback container produce clean fragments.

use kuchiki::NodeRef;

use crate::tree::{self, Fragment};

/// Editor-internal attributes stripped from every element.
const EDITOR_DATA_ATTRS: &[&str] = &["data-offset-key", "data-block", "data-editor"];

/// Class marking an editor paragraph block.
const BLOCK_CLASS: &str = "public-DraftStyleDefault-block";

/// Normalizes editor markup in an HTML string.
///
/// Runs the three passes in order: block containers become `<p>` elements,
/// editor data attributes are stripped, and single-child div nesting is
/// collapsed. Returns the rewritten document.
pub fn normalize(html: &str) -> String {
    let fragment = Fragment::parse(html);
    normalize_tree(&fragment);
    fragment.to_html()
}

/// Normalizes editor markup on an already-parsed tree.
pub(crate) fn normalize_tree(fragment: &Fragment) {
    convert_blocks(fragment);
    strip_editor_attrs(fragment);
    unwrap_nested_divs(fragment);
}

/// Convert `div.public-DraftStyleDefault-block` containers into `<p>`.
///
/// Attributes other than `class` and `data-*` migrate to the paragraph;
/// children move over wholesale.
fn convert_blocks(fragment: &Fragment) {
    let selector = format!("div.{}", BLOCK_CLASS);
    let Ok(blocks) = fragment.select(&selector) else {
        return;
    };

    for block in blocks {
        let p = tree::new_elem("p", &[]);

        if let Some(el) = block.as_element() {
            let attrs = el.attributes.borrow();
            for (name, attr) in attrs.map.iter() {
                let local = name.local.as_ref();
                if local == "class" || local.starts_with("data-") {
                    continue;
                }
                tree::set_attr(&p, local, &attr.value);
            }
        }

        while let Some(child) = block.first_child() {
            p.append(child);
        }
        block.insert_before(p);
        block.detach();
    }
}

/// Strip editor data attributes everywhere they appear.
fn strip_editor_attrs(fragment: &Fragment) {
    for attr in EDITOR_DATA_ATTRS {
        let selector = format!("[{}]", attr);
        let Ok(nodes) = fragment.select(&selector) else {
            continue;
        };
        for node in nodes {
            tree::remove_attr(&node, attr);
        }
    }
}

/// Collapse divs that wrap exactly one div and carry no text of their own.
fn unwrap_nested_divs(fragment: &Fragment) {
    let Ok(divs) = fragment.select("div") else {
        return;
    };

    for div in divs {
        if div.parent().is_none() {
            continue;
        }
        if let Some(only_child) = sole_div_child(&div) {
            div.insert_before(only_child);
            div.detach();
        }
    }
}

/// The single div child of a wrapper div, if the wrapper holds nothing else.
fn sole_div_child(div: &NodeRef) -> Option<NodeRef> {
    let mut element_child = None;
    for child in div.children() {
        if child.as_element().is_some() {
            if element_child.is_some() {
                return None;
            }
            element_child = Some(child);
        } else if let Some(text) = child.as_text() {
            if !text.borrow().trim().is_empty() {
                return None;
            }
        }
    }

    let child = element_child?;
    if tree::tag_name(&child).as_deref() == Some("div") { Some(child) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_become_paragraphs() {
        let html = r#"<div class="public-DraftStyleDefault-block" data-offset-key="abc-0-0">Hello world</div>"#;
        let result = normalize(html);

        assert!(result.contains("<p>Hello world</p>"));
        assert!(!result.contains("public-DraftStyleDefault-block"));
        assert!(!result.contains("data-offset-key"));
    }

    #[test]
    fn test_block_conversion_migrates_plain_attributes() {
        let html = r#"<div class="public-DraftStyleDefault-block" id="para-1" data-block="true" dir="ltr">Text</div>"#;
        let result = normalize(html);

        assert!(result.contains(r#"id="para-1""#));
        assert!(result.contains(r#"dir="ltr""#));
        assert!(!result.contains("data-block"));
        assert!(!result.contains("class="));
    }

    #[test]
    fn test_editor_attrs_stripped_outside_blocks() {
        let html = r#"<div data-editor="xyz" data-offset-key="k"><span data-block="true">kept</span></div>"#;
        let result = normalize(html);

        assert!(!result.contains("data-editor"));
        assert!(!result.contains("data-offset-key"));
        assert!(!result.contains("data-block"));
        assert!(result.contains("kept"));
    }

    #[test]
    fn test_nested_div_chain_collapses() {
        let html = r#"<div><div><div><p>Deep text</p></div></div></div>"#;
        let result = normalize(html);

        assert!(result.contains("<p>Deep text</p>"));
        assert_eq!(result.matches("<div>").count(), 1);
    }

    #[test]
    fn test_div_with_own_text_is_kept() {
        let html = r#"<div>prefix <div>inner</div></div>"#;
        let result = normalize(html);

        assert!(result.contains("prefix"));
        assert_eq!(result.matches("<div>").count(), 2);
    }

    #[test]
    fn test_div_with_two_children_is_kept() {
        let html = r#"<div><div>a</div><div>b</div></div>"#;
        let result = normalize(html);
        assert_eq!(result.matches("<div>").count(), 3);
    }

    #[test]
    fn test_formatting_inside_block_survives() {
        let html = r#"<div class="public-DraftStyleDefault-block">Plain <strong>bold</strong> and <em>italic</em></div>"#;
        let result = normalize(html);

        assert!(result.contains("<p>Plain <strong>bold</strong> and <em>italic</em></p>"));
    }
}
