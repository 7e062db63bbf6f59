//! Mutable DOM tree for structural rewriting.
//!
//! This module provides the [`Fragment`] type plus node-level helpers used
//! wherever markup has to be rewritten in place rather than just queried:
//! editor-block normalization, image `src` rewriting, and the KEPUB span
//! transform. Nodes are explicit tree values (element or text, ordered
//! attributes, ordered children) addressed through [`NodeRef`] handles.
//!
//! # Example
//!
//! ```rust
//! use kobopress_core::tree::Fragment;
//!
//! let fragment = Fragment::parse("<p>Hello <b>world</b></p>");
//! let bold = fragment.select("b").unwrap();
//! assert_eq!(bold.len(), 1);
//! assert_eq!(fragment.body_inner_html(), "<p>Hello <b>world</b></p>");
//! ```

use kuchiki::traits::TendrilSink;
use kuchiki::{Attribute, ExpandedName, NodeRef};
use markup5ever::{QualName, namespace_url, ns};

use crate::{KobopressError, Result};

/// A parsed HTML tree that supports structural mutation.
///
/// Parsing always yields a full document (html5ever inserts the `html`,
/// `head`, and `body` scaffolding around bare fragments); callers that work
/// on body fragments serialize back out with [`Fragment::body_inner_html`],
/// which drops the scaffolding again.
pub struct Fragment {
    document: NodeRef,
}

impl Fragment {
    /// Parses HTML (a full document or a bare fragment) into a mutable tree.
    pub fn parse(html: &str) -> Self {
        let document = kuchiki::parse_html().one(html);
        Self { document }
    }

    /// The document root node.
    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    /// The `body` element node.
    pub fn body(&self) -> NodeRef {
        match self.document.select_first("body") {
            Ok(body) => body.as_node().clone(),
            Err(()) => self.document.clone(),
        }
    }

    /// Selects all nodes matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`KobopressError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef>> {
        let matches = self
            .document
            .select(selector)
            .map_err(|()| KobopressError::HtmlParseError(format!("Invalid selector: {}", selector)))?;
        Ok(matches.map(|m| m.as_node().clone()).collect())
    }

    /// Serializes the inner markup of `body`.
    pub fn body_inner_html(&self) -> String {
        inner_html(&self.body())
    }

    /// Serializes the whole document.
    pub fn to_html(&self) -> String {
        serialize_node(&self.document)
    }
}

/// Creates an element node with plain (un-namespaced) attributes.
pub(crate) fn new_elem(name: &str, attributes: &[(&str, &str)]) -> NodeRef {
    NodeRef::new_element(
        QualName::new(None, ns!(html), name.into()),
        attributes.iter().map(|(attr, value)| {
            (ExpandedName::new(ns!(), *attr), Attribute { prefix: None, value: (*value).to_string() })
        }),
    )
}

/// Serializes a node, including its own tag.
pub(crate) fn serialize_node(node: &NodeRef) -> String {
    let mut bytes = Vec::new();
    if node.serialize(&mut bytes).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Serializes the children of a node.
pub(crate) fn inner_html(node: &NodeRef) -> String {
    let mut bytes = Vec::new();
    for child in node.children() {
        if child.serialize(&mut bytes).is_err() {
            return String::new();
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The lowercase tag name of an element node, `None` for non-elements.
pub(crate) fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|el| el.name.local.to_string())
}

/// Gets an attribute value from an element node.
pub(crate) fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    let el = node.as_element()?;
    let attrs = el.attributes.borrow();
    attrs.get(name).map(str::to_string)
}

/// Sets an attribute on an element node. No-op for non-elements.
pub(crate) fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.to_string());
    }
}

/// Removes an attribute from an element node.
pub(crate) fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().remove(name);
    }
}

/// Whether an element's class attribute contains the given class name.
pub(crate) fn has_class(node: &NodeRef, class: &str) -> bool {
    get_attr(node, "class").is_some_and(|c| c.split_whitespace().any(|part| part == class))
}

/// Replaces a node with its own children, preserving order.
pub(crate) fn unwrap_node(node: &NodeRef) {
    while let Some(child) = node.last_child() {
        node.insert_after(child);
    }
    node.detach();
}
