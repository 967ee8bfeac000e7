//! In-memory page of elements
//!
//! A small element tree standing in for a browser document. It answers
//! selector queries, hosts the voice picker and carries the user's current
//! text selection. Clones share the same tree.

use super::selector::{Complex, Selector};
use super::{Document, ElementId, SelectionSource};
use crate::{Result, SpeechError};
use log::debug;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// One element in the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: HashMap<String, String>,
    /// Own text, not including children
    pub text: String,
    /// Current value of form fields
    pub value: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Text inputs and textareas are read through their value
    pub fn is_form_field(&self) -> bool {
        self.tag == "input" || self.tag == "textarea"
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

#[derive(Debug, Default)]
struct Tree {
    /// Index 0 is the root
    nodes: Vec<Element>,
    selection: String,
}

impl Tree {
    fn node(&self, id: ElementId) -> Result<&Element> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| SpeechError::Other(format!("No element {}", id.0)))
    }

    fn insert(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Pre-order walk, root excluded
    fn document_order(&self) -> Vec<ElementId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ElementId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    fn matches(&self, id: ElementId, complex: &Complex) -> bool {
        let Some((last, ancestors)) = complex.parts.split_last() else {
            return false;
        };
        let element = &self.nodes[id.0];
        if !last.matches(&element.tag, element.id.as_deref(), &element.classes) {
            return false;
        }

        // Match remaining compounds right-to-left against the ancestor chain
        let mut remaining = ancestors.len();
        let mut current = element.parent;
        while remaining > 0 {
            let Some(ancestor) = current.filter(|a| a.0 != 0) else {
                break;
            };
            let node = &self.nodes[ancestor.0];
            if ancestors[remaining - 1].matches(&node.tag, node.id.as_deref(), &node.classes) {
                remaining -= 1;
            }
            current = node.parent;
        }
        remaining == 0
    }

    fn text_content(&self, id: ElementId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push_str(&node.text);
        for child in &node.children {
            self.text_content(*child, out);
        }
    }
}

/// Shared handle to an element tree
#[derive(Debug, Clone)]
pub struct Page {
    tree: Rc<RefCell<Tree>>,
}

impl Page {
    pub fn new() -> Self {
        let tree = Tree {
            nodes: vec![Element::new("html")],
            selection: String::new(),
        };
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    fn tree(&self) -> Ref<'_, Tree> {
        self.tree.borrow()
    }

    fn tree_mut(&self) -> RefMut<'_, Tree> {
        self.tree.borrow_mut()
    }

    /// Append an element under `parent` and return its id
    pub fn append(&self, parent: ElementId, element: Element) -> Result<ElementId> {
        let mut tree = self.tree_mut();
        tree.node(parent)?;
        Ok(tree.insert(parent, element))
    }

    /// Append an element at the top level of the page
    pub fn push(&self, element: Element) -> ElementId {
        self.tree_mut().insert(ElementId(0), element)
    }

    pub fn element(&self, id: ElementId) -> Result<Element> {
        self.tree().node(id).cloned()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        let tree = self.tree();
        let found = tree
            .document_order()
            .into_iter()
            .find(|e| tree.nodes[e.0].id.as_deref() == Some(id));
        found
    }

    /// Set the value of a form field
    pub fn set_value(&self, id: ElementId, value: &str) -> Result<()> {
        let mut tree = self.tree_mut();
        tree.node(id)?;
        tree.nodes[id.0].value = Some(value.to_string());
        Ok(())
    }

    /// Set what the user currently has selected
    pub fn select_text(&self, text: &str) {
        self.tree_mut().selection = text.to_string();
    }

    pub fn clear_selection(&self) {
        self.tree_mut().selection.clear();
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for Page {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let selector = Selector::parse(selector)?;
        let tree = self.tree();

        // Document order, each element once even if several groups match
        let found: Vec<ElementId> = tree
            .document_order()
            .into_iter()
            .filter(|id| {
                selector
                    .alternatives
                    .iter()
                    .any(|complex| tree.matches(*id, complex))
            })
            .collect();

        debug!("Selector matched {} elements", found.len());
        Ok(found)
    }

    fn element_text(&self, id: ElementId) -> Result<String> {
        let tree = self.tree();
        let element = tree.node(id)?;
        if element.is_form_field() {
            return Ok(element.value.clone().unwrap_or_default());
        }
        let mut text = String::new();
        tree.text_content(id, &mut text);
        Ok(text)
    }

    fn append_child(
        &mut self,
        container_id: &str,
        tag: &str,
        label: &str,
        value: &str,
    ) -> Result<bool> {
        let Some(container) = self.get_element_by_id(container_id) else {
            return Ok(false);
        };
        let child = Element::new(tag)
            .with_text(label)
            .with_attribute("value", value);
        self.append(container, child)?;
        Ok(true)
    }
}

impl SelectionSource for Page {
    fn selected_text(&mut self) -> Result<String> {
        Ok(self.tree().selection.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Page {
        let page = Page::new();
        let article = page.push(Element::new("article").with_class("speech"));
        page.append(article, Element::new("h1").with_text("Title")).unwrap();
        page.append(article, Element::new("p").with_text("Body")).unwrap();
        page.push(Element::new("textarea").with_class("speech").with_value("Typed"));
        page.push(Element::new("select").with_id("voices"));
        page
    }

    #[test]
    fn test_document_order() {
        let page = sample();
        let found = page.query_selector_all(".speech").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(page.element_text(found[0]).unwrap(), "TitleBody");
        assert_eq!(page.element_text(found[1]).unwrap(), "Typed");
    }

    #[test]
    fn test_group_deduplicates() {
        let page = sample();
        let found = page.query_selector_all("article, .speech, h1").unwrap();
        let tags: Vec<String> = found
            .iter()
            .map(|id| page.element(*id).unwrap().tag)
            .collect();
        assert_eq!(tags, vec!["article", "h1", "textarea"]);
    }

    #[test]
    fn test_descendant() {
        let page = sample();
        assert_eq!(page.query_selector_all(".speech p").unwrap().len(), 1);
        assert_eq!(page.query_selector_all("select p").unwrap().len(), 0);
        assert_eq!(page.query_selector_all("*").unwrap().len(), 5);
    }

    #[test]
    fn test_append_child() {
        let mut page = sample();
        assert!(page.append_child("voices", "option", "Alex (en-US)", "en-US").unwrap());
        assert!(!page.append_child("missing", "option", "x", "y").unwrap());

        let select = page.get_element_by_id("voices").unwrap();
        let option = page.element(select).unwrap().children()[0];
        let option = page.element(option).unwrap();
        assert_eq!(option.tag, "option");
        assert_eq!(option.text, "Alex (en-US)");
        assert_eq!(option.attributes.get("value").map(String::as_str), Some("en-US"));
    }

    #[test]
    fn test_selection() {
        let mut page = Page::new();
        assert_eq!(page.selected_text().unwrap(), "");
        page.select_text("picked");
        assert_eq!(page.selected_text().unwrap(), "picked");
        page.clear_selection();
        assert_eq!(page.selected_text().unwrap(), "");
    }
}
