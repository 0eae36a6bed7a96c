//! Candidate evaluation
//!
//! Turns one source's live control state into the value it proposes for its
//! target groups. Evaluation is pure: it reads the DOM and never writes it.

use serde::Serialize;

use crate::config::DEFAULT_CHECKED_VALUE;
use crate::dom::Dom;
use crate::source::{Source, SourceKind};

/// What a source currently says about its groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stance", content = "value", rename_all = "camelCase")]
pub enum Proposal {
    /// The source is on and wants this value shown
    Active(String),
    /// The source is off but declares an explicit value for that case
    Fallback(String),
    /// The source has no opinion; the group may show its original content
    Defer,
}

/// A source's proposal at one point in time. Never stored across resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub order: u64,
    pub priority: i32,
    pub proposal: Proposal,
}

impl Candidate {
    pub fn is_active(&self) -> bool {
        matches!(self.proposal, Proposal::Active(_))
    }

    /// The proposed value, empty when the source defers
    pub fn value(&self) -> &str {
        match &self.proposal {
            Proposal::Active(v) | Proposal::Fallback(v) => v.as_str(),
            Proposal::Defer => "",
        }
    }
}

/// Evaluate `source` against the current state of `dom`
pub fn evaluate<D: Dom>(dom: &D, source: &Source<D::Node>) -> Candidate {
    let proposal = match &source.kind {
        SourceKind::Checkbox => {
            if dom.is_checked(&source.node) {
                Proposal::Active(
                    source
                        .active_value
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CHECKED_VALUE.to_string()),
                )
            } else {
                match &source.inactive_value {
                    Some(value) => Proposal::Fallback(value.clone()),
                    None => Proposal::Defer,
                }
            }
        }
        SourceKind::Radio { .. } => {
            if dom.is_checked(&source.node) {
                let value = source
                    .active_value
                    .clone()
                    .or_else(|| dom.attribute(&source.node, "value"))
                    .unwrap_or_else(|| DEFAULT_CHECKED_VALUE.to_string());
                Proposal::Active(value)
            } else {
                Proposal::Defer
            }
        }
        SourceKind::Select | SourceKind::TextInput => {
            let value = dom.value(&source.node);
            if value.is_empty() {
                Proposal::Defer
            } else {
                Proposal::Active(value)
            }
        }
        SourceKind::StaticValue => Proposal::Active(
            source
                .active_value
                .clone()
                .or_else(|| dom.attribute(&source.node, "value"))
                .unwrap_or_default(),
        ),
    };

    Candidate {
        order: source.order,
        priority: source.priority,
        proposal,
    }
}
