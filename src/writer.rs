//! Target writer
//!
//! Applies a [`Resolution`] to every node of a target group and owns the
//! original-content snapshot cache.
//!
//! ## Invariants
//!
//! - A group's original content is captured once, from the first matching node,
//!   before the first mutation of that group. It is only dropped by [`TargetWriter::clear`].
//! - Groups matching zero nodes are not snapshotted, so the capture happens on the
//!   first write that actually finds nodes.

use serde::Serialize;
use std::collections::HashMap;

use crate::dom::Dom;
use crate::error::BinderError;
use crate::resolve::Resolution;

/// Display state of one target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum GroupState {
    Unresolved,
    /// Showing a value written by resolution or a manual override
    Active(String),
    /// Showing the captured original content
    Original,
}

/// What a single write did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Number of nodes whose markup actually changed
    Written { nodes: usize, changed: usize },
    /// The group's selector matched nothing on this page
    NoTargets,
}

#[derive(Debug, Default)]
pub struct TargetWriter {
    originals: HashMap<String, String>,
    states: HashMap<String, GroupState>,
}

impl TargetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<D: Dom>(
        &mut self,
        dom: &mut D,
        group: &str,
        resolution: &Resolution,
    ) -> Result<WriteOutcome, BinderError> {
        let root = dom.root();
        let targets = dom.query_selector_all(&root, group)?;
        let Some(first) = targets.first() else {
            tracing::warn!(group, "target group matches no elements");
            return Ok(WriteOutcome::NoTargets);
        };

        if !self.originals.contains_key(group) {
            let original = dom.inner_html(first);
            tracing::debug!(group, original = %original, "captured original content");
            self.originals.insert(group.to_string(), original);
        }

        let markup = match resolution {
            Resolution::Value(value) => value.clone(),
            Resolution::Original => self.originals.get(group).cloned().unwrap_or_default(),
        };

        let mut changed = 0;
        for node in &targets {
            if dom.inner_html(node) == markup {
                continue;
            }
            dom.set_inner_html(node, &markup)?;
            changed += 1;
        }

        let state = match resolution {
            Resolution::Value(value) => GroupState::Active(value.clone()),
            Resolution::Original => GroupState::Original,
        };
        self.states.insert(group.to_string(), state);

        tracing::debug!(group, nodes = targets.len(), changed, "wrote target group");
        Ok(WriteOutcome::Written {
            nodes: targets.len(),
            changed,
        })
    }

    pub fn original(&self, group: &str) -> Option<&str> {
        self.originals.get(group).map(String::as_str)
    }

    pub fn state(&self, group: &str) -> GroupState {
        self.states
            .get(group)
            .cloned()
            .unwrap_or(GroupState::Unresolved)
    }

    pub fn clear(&mut self) {
        self.originals.clear();
        self.states.clear();
    }
}
