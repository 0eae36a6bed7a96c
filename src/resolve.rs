//! Winner selection for one target group.
//!
//! 1. Active candidates win, lowest `(priority, order)` first.
//! 2. With no active candidate, an explicit fallback value wins by the same order.
//! 3. Otherwise the group shows its original content.
//!
//! Equal priorities fall back to registration order, so the first registered
//! source wins a tie.

use serde::Serialize;

use crate::candidate::{Candidate, Proposal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Resolution {
    /// Write this markup verbatim
    Value(String),
    /// Restore the group's captured original content
    Original,
}

pub fn resolve_candidates(candidates: &[Candidate]) -> Resolution {
    let rank = |c: &&Candidate| (c.priority, c.order);

    let active = candidates
        .iter()
        .filter(|c| matches!(c.proposal, Proposal::Active(_)))
        .min_by_key(rank);
    if let Some(winner) = active {
        return Resolution::Value(winner.value().to_string());
    }

    let fallback = candidates
        .iter()
        .filter(|c| matches!(c.proposal, Proposal::Fallback(_)))
        .min_by_key(rank);
    match fallback {
        Some(winner) => Resolution::Value(winner.value().to_string()),
        None => Resolution::Original,
    }
}
