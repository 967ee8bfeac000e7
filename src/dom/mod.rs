//! Page access: element lookup, voice picker rendering, text selection

pub mod page;
pub mod selector;

pub use page::{Element, Page};
pub use selector::Selector;

use crate::Result;

/// Handle to an element inside a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub(crate) usize);

/// The host's presentation tree
pub trait Document {
    /// Every element matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    /// The value of form fields, the text content of everything else
    fn element_text(&self, id: ElementId) -> Result<String>;

    /// Append `<tag value="value">label</tag>` to the element with
    /// `container_id`. Returns false when there is no such element.
    fn append_child(&mut self, container_id: &str, tag: &str, label: &str, value: &str)
        -> Result<bool>;
}

/// Source of the user's current text selection
pub trait SelectionSource {
    /// Selected text, empty when nothing is selected
    fn selected_text(&mut self) -> Result<String>;
}

/// Selection source that never has anything selected
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSelection;

impl SelectionSource for NoSelection {
    fn selected_text(&mut self) -> Result<String> {
        Ok(String::new())
    }
}
