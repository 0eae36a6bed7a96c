//! Source registry data.
//!
//! A [`Source`] is a control that proposes a value for one or more target groups.
//! Its [`SourceKind`] is decided once, at registration, from the element's tag and
//! type; later events never re-inspect the tag.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::config::BinderConfig;
use crate::dom::{Dom, EventKind};

lazy_static! {
    static ref PRIORITY_RE: Regex = Regex::new(r"^\s*([+-]?\d+)\s*$").unwrap();
}

/// Closed set of control behaviours
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceKind {
    Checkbox,
    /// Radio buttons compete within their `name` group
    Radio { name: Option<String> },
    Select,
    /// Free-text controls: text-like inputs and textareas
    TextInput,
    /// Elements that always propose a literal value (buttons and the like)
    StaticValue,
}

impl SourceKind {
    /// Decide the behaviour of `node`. `None` means the element cannot act as a source.
    pub fn classify<D: Dom>(dom: &D, node: &D::Node, config: &BinderConfig) -> Option<Self> {
        let tag = dom.tag_name(node)?;
        match tag.as_str() {
            "input" => {
                let input_type = dom
                    .attribute(node, "type")
                    .unwrap_or_else(|| "text".to_string())
                    .to_ascii_lowercase();
                match input_type.as_str() {
                    "checkbox" => Some(SourceKind::Checkbox),
                    "radio" => Some(SourceKind::Radio {
                        name: dom.attribute(node, "name"),
                    }),
                    "button" | "submit" | "reset" | "image" => Some(SourceKind::StaticValue),
                    _ => Some(SourceKind::TextInput),
                }
            }
            "select" => Some(SourceKind::Select),
            "textarea" => Some(SourceKind::TextInput),
            "button" => Some(SourceKind::StaticValue),
            _ if dom.attribute(node, &config.value_attr).is_some()
                || dom.attribute(node, "value").is_some() =>
            {
                Some(SourceKind::StaticValue)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Checkbox => "checkbox",
            SourceKind::Radio { .. } => "radio",
            SourceKind::Select => "select",
            SourceKind::TextInput => "text",
            SourceKind::StaticValue => "static",
        }
    }

    /// Events whose firing can change this source's candidate
    pub fn events(&self, live_text: bool) -> &'static [EventKind] {
        match self {
            SourceKind::TextInput if live_text => &[EventKind::Change, EventKind::Input],
            _ => &[EventKind::Change],
        }
    }
}

/// A registered control and its declared bindings
#[derive(Debug, Clone)]
pub struct Source<N> {
    pub node: N,
    pub kind: SourceKind,
    /// Distinct target-group selectors, in declaration order
    pub target_groups: Vec<String>,
    pub priority: i32,
    pub active_value: Option<String>,
    /// `Some("")` is an explicit empty override; `None` means no opinion
    pub inactive_value: Option<String>,
    /// Registration order; breaks priority ties
    pub order: u64,
}

impl<N: Clone> Source<N> {
    /// Read the declarative attributes of `node`. Returns `None` (after logging)
    /// when the node declares no target group or cannot act as a source.
    pub fn from_node<D: Dom<Node = N>>(
        dom: &D,
        node: &N,
        config: &BinderConfig,
        order: u64,
    ) -> Option<Self>
    where
        N: std::fmt::Debug,
    {
        let raw_targets = dom.attribute(node, &config.target_attr).unwrap_or_default();
        let target_groups = parse_target_groups(&raw_targets, &config.target_separator);
        if target_groups.is_empty() {
            tracing::warn!(
                node = ?node,
                attr = %config.target_attr,
                "source declares no target group, skipping"
            );
            return None;
        }

        let Some(kind) = SourceKind::classify(dom, node, config) else {
            tracing::warn!(node = ?node, "element cannot act as a source, skipping");
            return None;
        };

        let raw_priority = dom.attribute(node, &config.priority_attr);
        let priority = parse_priority(raw_priority.as_deref(), config.default_priority);

        let active_value = dom.attribute(node, &config.value_attr);
        let inactive_value = dom.attribute(node, &config.inactive_value_attr);

        Some(Self {
            node: node.clone(),
            kind,
            target_groups,
            priority,
            active_value,
            inactive_value,
            order,
        })
    }

    pub fn feeds(&self, group: &str) -> bool {
        self.target_groups.iter().any(|g| g == group)
    }
}

/// Split a target attribute into distinct, trimmed group selectors
pub fn parse_target_groups(raw: &str, separator: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for part in raw.split(separator) {
        let part = part.trim();
        if part.is_empty() || groups.iter().any(|g| g == part) {
            continue;
        }
        groups.push(part.to_string());
    }
    groups
}

/// Integer priority; absent or unreadable values fall back to `default`
pub fn parse_priority(raw: Option<&str>, default: i32) -> i32 {
    let Some(raw) = raw else {
        return default;
    };
    match PRIORITY_RE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i32>().ok())
    {
        Some(priority) => priority,
        None => {
            tracing::warn!(raw, default, "unreadable priority, using default");
            default
        }
    }
}
