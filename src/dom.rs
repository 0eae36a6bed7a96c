//! DOM abstraction the engine is generic over.
//!
//! The binder never owns the document. It reads control state, queries target
//! groups, writes markup and registers listeners through this trait, so the same
//! engine can drive the in-memory [`crate::document::Document`] or any other host
//! that can answer these calls.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::BinderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Change,
    Input,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Change => "change",
            EventKind::Input => "input",
        }
    }
}

/// Handle for one registered listener, unique within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub trait Dom {
    /// Stable element handle. Equality is identity, not structural.
    type Node: Clone + Eq + Hash + Debug;

    /// The outermost search context (the document itself)
    fn root(&self) -> Self::Node;

    /// Elements under `scope` (excluding `scope`) matching `selector`, in document order
    fn query_selector_all(
        &self,
        scope: &Self::Node,
        selector: &str,
    ) -> Result<Vec<Self::Node>, BinderError>;

    /// Lowercase tag name, `None` for non-elements
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn is_checked(&self, node: &Self::Node) -> bool;

    /// Current value of a form control (`select` resolves through its options)
    fn value(&self, node: &Self::Node) -> String;

    fn inner_html(&self, node: &Self::Node) -> String;

    fn set_inner_html(&mut self, node: &Self::Node, html: &str) -> Result<(), BinderError>;

    fn text_content(&self, node: &Self::Node) -> String;

    fn add_listener(&mut self, node: &Self::Node, kind: EventKind) -> ListenerId;

    /// Returns false when the listener was not registered
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}
