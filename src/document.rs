//! # In-Memory Document
//!
//! An html5ever/`markup5ever_rcdom` tree that implements [`Dom`], so pages can be
//! bound, driven and inspected without a browser.
//!
//! ## Key Invariants
//!
//! 1. **Identity**: [`NodeRef`] equality and hashing are pointer identity on the
//!    underlying rcdom handle, never structural.
//! 2. **Live form state lives in attributes**: `checked`, `value` and option
//!    `selected` are read from and written to attributes, so serialization always
//!    shows the state the binder saw.
//! 3. **Events are returned, not run**: user-action methods mutate state and return
//!    the listeners that the action fired, in registration order. The caller hands
//!    them to whichever engine owns them.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, parse_fragment, Attribute, LocalName, Namespace, QualName};
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use regex::Regex;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tendril::StrTendril;

use crate::dom::{Dom, EventKind, ListenerId};
use crate::error::BinderError;
use crate::selector::{SelectorElement, SelectorList};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE HANDLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Identity handle to a node in a [`Document`]
#[derive(Clone)]
pub struct NodeRef(Handle);

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.data {
            NodeData::Element { name, .. } => {
                write!(f, "<{}", name.local)?;
                if let Some(id) = self.attribute("id") {
                    write!(f, " id=\"{}\"", id)?;
                }
                write!(f, ">")
            }
            NodeData::Document => write!(f, "#document"),
            NodeData::Text { .. } => write!(f, "#text"),
            _ => write!(f, "#node"),
        }
    }
}

impl NodeRef {
    fn is_element(&self) -> bool {
        matches!(self.0.data, NodeData::Element { .. })
    }

    fn parent(&self) -> Option<NodeRef> {
        let weak = self.0.parent.take();
        let parent = weak.as_ref().and_then(|w| w.upgrade());
        self.0.parent.set(weak);
        parent.map(NodeRef)
    }

    fn element_siblings(&self) -> Vec<NodeRef> {
        match self.parent() {
            Some(parent) => parent
                .0
                .children
                .borrow()
                .iter()
                .map(|h| NodeRef(h.clone()))
                .filter(|n| n.is_element())
                .collect(),
            None => Vec::new(),
        }
    }

    fn set_attr(&self, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &self.0.data {
            let mut attrs = attrs.borrow_mut();
            if let Some(attr) = attrs.iter_mut().find(|a| &*a.name.local == name) {
                attr.value = StrTendril::from(value);
            } else {
                attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: StrTendril::from(value),
                });
            }
        }
    }

    fn remove_attr(&self, name: &str) {
        if let NodeData::Element { attrs, .. } = &self.0.data {
            attrs.borrow_mut().retain(|a| &*a.name.local != name);
        }
    }

    fn descendants(&self, out: &mut Vec<NodeRef>) {
        for child in self.0.children.borrow().iter() {
            let child = NodeRef(child.clone());
            if child.is_element() {
                out.push(child.clone());
            }
            child.descendants(out);
        }
    }

    fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.0, &mut out);
        out
    }

    fn replace_children(&self, children: Vec<Handle>) {
        for old in self.0.children.borrow().iter() {
            old.parent.set(None);
        }
        for child in &children {
            child.parent.set(Some(Rc::downgrade(&self.0)));
        }
        *self.0.children.borrow_mut() = children;
    }
}

impl SelectorElement for NodeRef {
    fn local_name(&self) -> String {
        match &self.0.data {
            NodeData::Element { name, .. } => name.local.to_string().to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == name)
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().filter(|p| p.is_element())
    }

    fn previous_element_sibling(&self) -> Option<Self> {
        let siblings = self.element_siblings();
        let pos = siblings.iter().position(|s| s == self)?;
        pos.checked_sub(1).map(|p| siblings[p].clone())
    }

    fn next_element_sibling(&self) -> Option<Self> {
        let siblings = self.element_siblings();
        let pos = siblings.iter().position(|s| s == self)?;
        siblings.get(pos + 1).cloned()
    }
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

fn serialize_children(handle: &Handle) -> String {
    let mut bytes = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    if let Err(e) = serialize(&mut bytes, &serializable, opts) {
        tracing::warn!(error = %e, "failed to serialize node children");
        return String::new();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

struct Listener {
    id: ListenerId,
    node: NodeRef,
    kind: EventKind,
}

/// A parsed HTML page with live form state and a listener registry
pub struct Document {
    dom: RcDom,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl Document {
    pub fn parse(html: &str) -> Result<Self, BinderError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| BinderError::HtmlParse {
                reason: e.to_string(),
            })?;
        Ok(Self {
            dom,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    /// All elements in the document matching `selector`
    pub fn query(&self, selector: &str) -> Result<Vec<NodeRef>, BinderError> {
        self.query_selector_all(&self.root(), selector)
    }

    pub fn query_one(&self, selector: &str) -> Result<Option<NodeRef>, BinderError> {
        Ok(self.query(selector)?.into_iter().next())
    }

    pub fn set_attribute(&mut self, node: &NodeRef, name: &str, value: &str) {
        node.set_attr(name, value);
    }

    /// Listeners registered on `node` for `kind`, in registration order
    pub fn dispatch(&self, node: &NodeRef, kind: EventKind) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind && &l.node == node)
            .map(|l| l.id)
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Toggle a checkbox or radio the way a click would. Checking a radio unchecks
    /// the other radios of its name group. Returns the `change` listeners fired,
    /// which is none when the state did not change.
    pub fn set_checked(&mut self, node: &NodeRef, checked: bool) -> Vec<ListenerId> {
        if node.local_name() != "input" {
            return Vec::new();
        }
        let kind = node.attribute("type").unwrap_or_default().to_ascii_lowercase();
        if kind != "checkbox" && kind != "radio" {
            return Vec::new();
        }
        if node.attribute("checked").is_some() == checked {
            return Vec::new();
        }

        if checked {
            if kind == "radio" {
                for peer in self.radio_group(node) {
                    peer.remove_attr("checked");
                }
            }
            node.set_attr("checked", "");
        } else {
            node.remove_attr("checked");
        }
        self.dispatch(node, EventKind::Change)
    }

    /// Choose the option of a `select` whose value is `value`. Unknown values leave
    /// the selection untouched and fire nothing.
    pub fn select_option(&mut self, node: &NodeRef, value: &str) -> Vec<ListenerId> {
        if node.local_name() != "select" {
            return Vec::new();
        }
        let options = select_options(node);
        let Some(chosen) = options.iter().find(|o| option_value(o) == value).cloned() else {
            tracing::warn!(value, "select has no option with this value");
            return Vec::new();
        };
        if self.value(node) == value && chosen.attribute("selected").is_some() {
            return Vec::new();
        }
        for option in &options {
            option.remove_attr("selected");
        }
        chosen.set_attr("selected", "");
        self.dispatch(node, EventKind::Change)
    }

    /// Replace the text of an input or textarea as typing would. Fires `input`
    /// listeners followed by `change` listeners.
    pub fn set_value(&mut self, node: &NodeRef, text: &str) -> Vec<ListenerId> {
        match node.local_name().as_str() {
            "input" => node.set_attr("value", text),
            "textarea" => {
                let text_node = Node::new(NodeData::Text {
                    contents: RefCell::new(StrTendril::from(text)),
                });
                node.replace_children(vec![text_node]);
            }
            _ => return Vec::new(),
        }
        let mut fired = self.dispatch(node, EventKind::Input);
        fired.extend(self.dispatch(node, EventKind::Change));
        fired
    }

    /// Whitespace-collapsed text, the way a copy of the rendered node reads
    pub fn rendered_text(&self, node: &NodeRef) -> String {
        WHITESPACE_RE
            .replace_all(&node.text(), " ")
            .trim()
            .to_string()
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        serialize_children(&self.dom.document)
    }

    fn radio_group(&self, node: &NodeRef) -> Vec<NodeRef> {
        let Some(name) = node.attribute("name") else {
            return vec![node.clone()];
        };
        let form = form_owner(node);
        let scope = form.clone().unwrap_or_else(|| self.root());
        let mut all = Vec::new();
        scope.descendants(&mut all);
        all.into_iter()
            .filter(|n| {
                n.local_name() == "input"
                    && n.attribute("type").map(|t| t.eq_ignore_ascii_case("radio")) == Some(true)
                    && n.attribute("name").as_deref() == Some(name.as_str())
                    && form_owner(n) == form
            })
            .collect()
    }
}

fn form_owner(node: &NodeRef) -> Option<NodeRef> {
    let mut cursor = node.parent_element();
    while let Some(ancestor) = cursor {
        if ancestor.local_name() == "form" {
            return Some(ancestor);
        }
        cursor = ancestor.parent_element();
    }
    None
}

fn select_options(select: &NodeRef) -> Vec<NodeRef> {
    let mut all = Vec::new();
    select.descendants(&mut all);
    all.retain(|n| n.local_name() == "option");
    all
}

fn option_value(option: &NodeRef) -> String {
    option.attribute("value").unwrap_or_else(|| {
        WHITESPACE_RE
            .replace_all(&option.text(), " ")
            .trim()
            .to_string()
    })
}

impl Dom for Document {
    type Node = NodeRef;

    fn root(&self) -> NodeRef {
        NodeRef(self.dom.document.clone())
    }

    fn query_selector_all(
        &self,
        scope: &NodeRef,
        selector: &str,
    ) -> Result<Vec<NodeRef>, BinderError> {
        let list = SelectorList::parse(selector)?;
        let mut all = Vec::new();
        scope.descendants(&mut all);
        all.retain(|n| list.matches(n));
        Ok(all)
    }

    fn tag_name(&self, node: &NodeRef) -> Option<String> {
        node.is_element().then(|| node.local_name())
    }

    fn attribute(&self, node: &NodeRef, name: &str) -> Option<String> {
        node.attribute(name)
    }

    fn is_checked(&self, node: &NodeRef) -> bool {
        node.is_checked()
    }

    fn value(&self, node: &NodeRef) -> String {
        match node.local_name().as_str() {
            "textarea" => node.text(),
            "select" => {
                let options = select_options(node);
                options
                    .iter()
                    .find(|o| o.attribute("selected").is_some())
                    .or_else(|| options.first())
                    .map(option_value)
                    .unwrap_or_default()
            }
            _ => node.attribute("value").unwrap_or_default(),
        }
    }

    fn inner_html(&self, node: &NodeRef) -> String {
        serialize_children(&node.0)
    }

    fn set_inner_html(&mut self, node: &NodeRef, html: &str) -> Result<(), BinderError> {
        if !node.is_element() {
            return Err(BinderError::NotAnElement);
        }
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(node.local_name().as_str()),
        );
        let fragment = parse_fragment(RcDom::default(), Default::default(), context, vec![]).one(html);

        // Fragment parsing yields <html> wrapping the parsed nodes
        let wrapper = fragment
            .document
            .children
            .borrow()
            .first()
            .cloned()
            .ok_or_else(|| BinderError::HtmlParse {
                reason: "fragment produced no content".to_string(),
            })?;
        let parsed: Vec<Handle> = wrapper.children.borrow_mut().drain(..).collect();
        node.replace_children(parsed);
        Ok(())
    }

    fn text_content(&self, node: &NodeRef) -> String {
        node.text()
    }

    fn add_listener(&mut self, node: &NodeRef, kind: EventKind) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push(Listener {
            id,
            node: node.clone(),
            kind,
        });
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }
}
