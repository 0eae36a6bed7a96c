//! Binding report
//!
//! A serializable snapshot of what a [`Binder`] currently knows: every registered
//! source with its live proposal, and every target group with its display state.

use serde::Serialize;

use crate::binder::Binder;
use crate::candidate::{evaluate, Proposal};
use crate::dom::Dom;
use crate::error::BinderError;
use crate::source::SourceKind;
use crate::writer::GroupState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub order: u64,
    /// Debug rendering of the element, e.g. `<input id="a">`
    pub element: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    pub targets: Vec<String>,
    pub priority: i32,
    pub active_value: Option<String>,
    pub inactive_value: Option<String>,
    pub proposal: Proposal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub selector: String,
    pub matches: usize,
    #[serde(flatten)]
    pub state: GroupState,
    pub original: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingReport {
    pub sources: Vec<SourceReport>,
    pub groups: Vec<GroupReport>,
}

impl BindingReport {
    pub fn collect<D: Dom>(binder: &Binder<D>, dom: &D) -> Self {
        let sources = binder
            .sources()
            .iter()
            .map(|source| SourceReport {
                order: source.order,
                element: format!("{:?}", source.node),
                kind: source.kind.clone(),
                targets: source.target_groups.clone(),
                priority: source.priority,
                active_value: source.active_value.clone(),
                inactive_value: source.inactive_value.clone(),
                proposal: evaluate(dom, source).proposal,
            })
            .collect();

        let root = dom.root();
        let groups = binder
            .groups()
            .into_iter()
            .map(|selector| GroupReport {
                // an unusable selector reports zero matches
                matches: dom
                    .query_selector_all(&root, &selector)
                    .map(|nodes| nodes.len())
                    .unwrap_or(0),
                state: binder.group_state(&selector),
                original: binder.original(&selector).map(str::to_string),
                selector,
            })
            .collect();

        Self { sources, groups }
    }

    pub fn group(&self, selector: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.selector == selector)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, BinderError> {
        Ok(serde_json::to_value(self)?)
    }
}
