//! # document: mutable view over a parsed page
//!
//! [`PageDocument`] is the "document-like object" both transforms work on: it
//! answers CSS selector queries with element handles and offers the handful of
//! mutations the transforms need (replace children, set or drop attributes,
//! wrap an element in a new container).
//!
//! Parsing goes through `scraper` (html5ever), and mutation works directly on
//! the `ego-tree` arena that `scraper::Html` exposes. Handles are plain
//! [`ElementId`]s, so they stay valid while the tree changes around them.
//!
//! Nodes removed from the tree stay in the arena as orphans. Every query starts
//! from the root element, so orphans are never returned.

use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::DecorateError;
use crate::escape::escape_attribute;

/// Handle to an element inside a [`PageDocument`].
pub type ElementId = NodeId;

/// Compile a CSS selector, keeping the offending text in the error.
pub fn compile_selector(selector: &str) -> Result<Selector, DecorateError> {
    Selector::parse(selector).map_err(|e| DecorateError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    /// Parse a complete page.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Parse a snippet of body content.
    pub fn parse_fragment(source: &str) -> Self {
        Self {
            html: Html::parse_fragment(source),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<ElementId> {
        self.html
            .root_element()
            .select(selector)
            .map(|el| el.id())
            .collect()
    }

    /// Descendants of `scope` matching `selector`, in document order.
    pub fn select_within(&self, scope: ElementId, selector: &Selector) -> Vec<ElementId> {
        self.element(scope)
            .map(|el| el.select(selector).map(|found| found.id()).collect())
            .unwrap_or_default()
    }

    pub fn first_within(&self, scope: ElementId, selector: &Selector) -> Option<ElementId> {
        self.element(scope)?
            .select(selector)
            .next()
            .map(|found| found.id())
    }

    /// Concatenated text of every descendant text node, like DOM `textContent`.
    pub fn text_content(&self, id: ElementId) -> String {
        self.element(id)
            .map(|el| el.text().collect())
            .unwrap_or_default()
    }

    pub fn inner_html(&self, id: ElementId) -> String {
        self.element(id)
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id)?
            .value()
            .attr(&name.to_ascii_lowercase())
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id)
            .map(|el| el.value().classes().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn tag_name(&self, id: ElementId) -> Option<&str> {
        Some(self.element(id)?.value().name())
    }

    pub fn parent_element(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.html.tree.get(id)?.parent()?;
        ElementRef::wrap(parent).map(|el| el.id())
    }

    /// The element itself or its nearest ancestor with the given tag name.
    pub fn closest(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        let node = self.html.tree.get(id)?;
        std::iter::once(node)
            .chain(node.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name().eq_ignore_ascii_case(tag))
            .map(|el| el.id())
    }

    /// Replace every child of `id` with the nodes parsed from `markup`.
    pub fn set_inner_html(&mut self, id: ElementId, markup: &str) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        while let Some(mut child) = node.first_child() {
            child.detach();
        }

        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();
        graft(&mut self.html.tree, id, *root);
    }

    /// Set an attribute, replacing any previous value. Names are lowercased.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        self.rebuild_element(id, |attrs| {
            attrs.retain(|attr| &*attr.name.local != name.as_str());
            attrs.push(Attribute {
                name: attribute_name(&name),
                value: StrTendril::from_slice(value),
            });
        });
    }

    /// Drop an attribute. Returns whether it was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let mut removed = false;
        self.rebuild_element(id, |attrs| {
            let before = attrs.len();
            attrs.retain(|attr| &*attr.name.local != name.as_str());
            removed = attrs.len() != before;
        });
        removed
    }

    /// Insert a new `<tag class="class">` right before `id` and move `id` into it.
    ///
    /// Returns the wrapper, or `None` when `id` is detached or is the root.
    pub fn wrap_in(&mut self, id: ElementId, tag: &str, class: &str) -> Option<ElementId> {
        if self.html.tree.get(id)?.parent().is_none() {
            return None;
        }

        let fragment = Html::parse_fragment(&format!(
            "<{tag} class=\"{}\"></{tag}>",
            escape_attribute(class)
        ));
        let wrapper = fragment
            .root_element()
            .child_elements()
            .next()?
            .value()
            .clone();

        let wrapper_id = self
            .html
            .tree
            .get_mut(id)?
            .insert_before(Node::Element(wrapper))
            .id();
        self.html.tree.get_mut(wrapper_id)?.append_id(id);
        Some(wrapper_id)
    }

    /// Serialize back to markup. Fragments serialize their content only.
    pub fn to_html(&self) -> String {
        if self.html.tree.root().value().is_fragment() {
            self.html.root_element().inner_html()
        } else {
            self.html.html()
        }
    }

    fn element(&self, id: ElementId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    // scraper caches id and classes per element, so attribute edits rebuild
    // the element instead of touching `attrs` in place.
    fn rebuild_element(&mut self, id: ElementId, edit: impl FnOnce(&mut Vec<Attribute>)) {
        let Some(mut node) = self.html.tree.get_mut(id) else {
            return;
        };
        if let Node::Element(element) = node.value() {
            let mut attrs: Vec<Attribute> = element
                .attrs
                .iter()
                .map(|(name, value)| Attribute {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect();
            edit(&mut attrs);
            *element = Element::new(element.name.clone(), attrs);
        }
    }
}

fn attribute_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

/// Copy the children of `source` (from another tree) under `parent`.
fn graft(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let appended = match tree.get_mut(parent) {
            Some(mut parent_node) => parent_node.append(child.value().clone()).id(),
            None => return,
        };
        graft(tree, appended, child);
    }
}
