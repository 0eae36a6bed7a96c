//! # Form Binder
//!
//! A declarative multi-source to target binding engine. Form controls (checkboxes,
//! radios, selects, text inputs, value-carrying buttons) declare which target groups
//! they feed; the engine resolves every group to a single value and writes it into
//! each matching node.
//!
//! ## Resolution Invariants
//!
//! 1. **Priority**: lower numbers win. Sources that declare none rank at 999.
//!
//! 2. **Tie-break**: equal priorities go to the source registered first.
//!
//! 3. **Fallback**: with no active source a group shows an explicit inactive value
//!    if one is declared, otherwise the content it had before its first write.
//!
//! 4. **Snapshots**: a group's original content is captured once, from the first
//!    matching node, and only discarded by `cleanup`/`destroy`.
//!
//! 5. **Locality**: a change event re-resolves only the groups its source feeds, and
//!    all of them are written before the handler returns.
//!
//! ## Layout
//!
//! - [`Dom`] is the seam: the engine runs over any host that implements it.
//! - [`Document`] is the bundled html5ever-backed host.
//! - [`Session`] replays scripted operator actions against a page.

#[cfg(feature = "napi")]
mod bridge;
mod binder;
mod candidate;
mod config;
mod document;
mod dom;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod report;
mod resolve;
mod selector;
mod session;
mod source;
mod writer;

#[cfg(test)]
mod binder_tests;

pub use binder::Binder;
pub use candidate::{evaluate, Candidate, Proposal};
pub use config::{BinderConfig, DEFAULT_CHECKED_VALUE, DEFAULT_PRIORITY};
pub use document::{Document, NodeRef};
pub use dom::{Dom, EventKind, ListenerId};
pub use error::BinderError;
pub use report::{BindingReport, GroupReport, SourceReport};
pub use resolve::{resolve_candidates, Resolution};
pub use selector::{SelectorElement, SelectorList};
pub use session::{Interaction, Session};
pub use source::{parse_priority, parse_target_groups, Source, SourceKind};
pub use writer::{GroupState, TargetWriter, WriteOutcome};

#[cfg(feature = "napi")]
pub use bridge::{binder_bridge, render_bound_page, render_bound_page_native, RenderedPage};
