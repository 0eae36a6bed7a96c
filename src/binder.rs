//! # Binder Engine
//!
//! One engine instance owns a Binding Set (registered sources), the listener
//! handles it attached, and a [`TargetWriter`] with its snapshot cache. Nothing is
//! global, so independent instances can drive the same document side by side.
//!
//! ## Event flow
//!
//! ```text
//! user action ─► Dom fires ListenerIds ─► Binder::handle_events
//!                                            │
//!                            groups fed by the firing source
//!                                            │
//!                 evaluate ─► resolve_candidates ─► TargetWriter::write
//! ```
//!
//! Only the groups a firing source feeds are recomputed. Every affected group is
//! written before `handle_events` returns.

use std::collections::{HashMap, HashSet};

use crate::candidate::{evaluate, Candidate};
use crate::config::BinderConfig;
use crate::dom::{Dom, ListenerId};
use crate::error::BinderError;
use crate::report::BindingReport;
use crate::resolve::{resolve_candidates, Resolution};
use crate::source::{Source, SourceKind};
use crate::writer::{GroupState, TargetWriter};

pub struct Binder<D: Dom> {
    config: BinderConfig,
    sources: Vec<Source<D::Node>>,
    listeners: HashMap<ListenerId, D::Node>,
    writer: TargetWriter,
    next_order: u64,
}

impl<D: Dom> Binder<D> {
    pub fn new(config: BinderConfig) -> Result<Self, BinderError> {
        config.validate()?;
        Ok(Self {
            config,
            sources: Vec::new(),
            listeners: HashMap::new(),
            writer: TargetWriter::new(),
            next_order: 0,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // REGISTRY
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Discover sources under `root` (the whole document when `None`), replacing any
    /// previous Binding Set, then resolve every group once. Returns the number of
    /// registered sources.
    pub fn init(&mut self, dom: &mut D, root: Option<&D::Node>) -> usize {
        self.detach_all(dom);
        self.sources.clear();

        let scope = root.cloned().unwrap_or_else(|| dom.root());
        let mut seen: HashSet<D::Node> = HashSet::new();
        let mut discovered = Vec::new();
        for selector in &self.config.source_selectors {
            match dom.query_selector_all(&scope, selector) {
                Ok(nodes) => {
                    for node in nodes {
                        if seen.insert(node.clone()) {
                            discovered.push(node);
                        }
                    }
                }
                Err(e) => tracing::warn!(selector = %selector, error = %e, "source selector failed"),
            }
        }

        for node in &discovered {
            self.register(dom, node);
        }

        tracing::info!(
            sources = self.sources.len(),
            groups = self.groups().len(),
            "binder initialized"
        );
        self.resolve_all(dom);
        self.sources.len()
    }

    /// [`Binder::init`] scoped to the first element matching `selector`
    pub fn init_within(&mut self, dom: &mut D, selector: &str) -> Result<usize, BinderError> {
        let root = dom.root();
        let scope = dom
            .query_selector_all(&root, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| BinderError::MissingRoot {
                selector: selector.to_string(),
            })?;
        Ok(self.init(dom, Some(&scope)))
    }

    /// Register one source at runtime and bring its groups up to date. Returns false
    /// when the node is already registered or cannot act as a source.
    pub fn add_element(&mut self, dom: &mut D, node: &D::Node) -> bool {
        if self.is_registered(node) {
            tracing::debug!(node = ?node, "element already registered");
            return false;
        }
        let Some(index) = self.register(dom, node) else {
            return false;
        };
        let groups = self.sources[index].target_groups.clone();
        for group in &groups {
            self.refresh(dom, group);
        }
        true
    }

    /// Drop a source, detach its listeners and re-resolve the groups it fed
    pub fn remove_element(&mut self, dom: &mut D, node: &D::Node) -> bool {
        let Some(index) = self.sources.iter().position(|s| &s.node == node) else {
            return false;
        };
        let removed = self.sources.remove(index);

        let ids: Vec<ListenerId> = self
            .listeners
            .iter()
            .filter(|(_, n)| *n == node)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            self.listeners.remove(&id);
            dom.remove_listener(id);
        }

        tracing::debug!(node = ?node, kind = removed.kind.label(), "source removed");
        for group in &removed.target_groups {
            self.refresh(dom, group);
        }
        true
    }

    pub fn is_registered(&self, node: &D::Node) -> bool {
        self.sources.iter().any(|s| &s.node == node)
    }

    pub fn sources(&self) -> &[Source<D::Node>] {
        &self.sources
    }

    /// Distinct target groups across all sources, in first-seen order
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for source in &self.sources {
            for group in &source.target_groups {
                if !groups.contains(group) {
                    groups.push(group.clone());
                }
            }
        }
        groups
    }

    fn register(&mut self, dom: &mut D, node: &D::Node) -> Option<usize> {
        let source = Source::from_node(&*dom, node, &self.config, self.next_order)?;
        self.next_order += 1;

        for kind in source.kind.events(self.config.live_text) {
            let id = dom.add_listener(node, *kind);
            tracing::trace!(node = ?node, event = kind.as_str(), listener = id.0, "listener attached");
            self.listeners.insert(id, node.clone());
        }
        tracing::debug!(
            node = ?node,
            kind = source.kind.label(),
            priority = source.priority,
            targets = ?source.target_groups,
            "source registered"
        );
        self.sources.push(source);
        Some(self.sources.len() - 1)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // RESOLUTION
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Current candidates of every source feeding `group`, in registration order
    pub fn candidates(&self, dom: &D, group: &str) -> Vec<Candidate> {
        self.sources
            .iter()
            .filter(|s| s.feeds(group))
            .map(|s| evaluate(dom, s))
            .collect()
    }

    pub fn resolve(&self, dom: &D, group: &str) -> Resolution {
        resolve_candidates(&self.candidates(dom, group))
    }

    /// Resolve `group` and write the result. Failures are logged and leave the
    /// group showing its last written content.
    pub fn refresh(&mut self, dom: &mut D, group: &str) {
        let resolution = self.resolve(dom, group);
        if let Err(e) = self.writer.write(dom, group, &resolution) {
            tracing::warn!(group, error = %e, "target group write abandoned");
        }
    }

    pub fn resolve_all(&mut self, dom: &mut D) {
        for group in self.groups() {
            self.refresh(dom, &group);
        }
    }

    /// Write `value` to `group` verbatim, bypassing priority. Holds until the next
    /// resolution of that group.
    pub fn update_targets(&mut self, dom: &mut D, group: &str, value: &str) {
        let resolution = Resolution::Value(value.to_string());
        if let Err(e) = self.writer.write(dom, group, &resolution) {
            tracing::warn!(group, error = %e, "manual target update abandoned");
        }
    }

    pub fn group_state(&self, group: &str) -> GroupState {
        self.writer.state(group)
    }

    pub fn original(&self, group: &str) -> Option<&str> {
        self.writer.original(group)
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // EVENTS
    // ═══════════════════════════════════════════════════════════════════════════════

    /// React to one fired listener. Ids this instance did not attach are ignored and
    /// return false.
    pub fn handle_listener(&mut self, dom: &mut D, id: ListenerId) -> bool {
        let Some(node) = self.listeners.get(&id).cloned() else {
            return false;
        };
        let Some(source) = self.sources.iter().find(|s| s.node == node) else {
            return false;
        };

        let mut groups = source.target_groups.clone();
        // Unchecked radios fire nothing, so peers sharing the name refresh here
        if let SourceKind::Radio { name: Some(name) } = &source.kind {
            for peer in &self.sources {
                if matches!(&peer.kind, SourceKind::Radio { name: Some(n) } if n == name) {
                    for group in &peer.target_groups {
                        if !groups.contains(group) {
                            groups.push(group.clone());
                        }
                    }
                }
            }
        }

        tracing::debug!(node = ?node, groups = ?groups, "source changed");
        for group in &groups {
            self.refresh(dom, group);
        }
        true
    }

    /// Handle every fired listener in order; returns how many belonged to this instance
    pub fn handle_events(&mut self, dom: &mut D, fired: &[ListenerId]) -> usize {
        let mut handled = 0;
        for id in fired {
            if self.handle_listener(dom, *id) {
                handled += 1;
            }
        }
        handled
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════════

    /// Detach every listener, drop the Binding Set and forget all snapshots. Safe to
    /// call repeatedly.
    pub fn cleanup(&mut self, dom: &mut D) {
        let detached = self.detach_all(dom);
        self.sources.clear();
        self.writer.clear();
        self.next_order = 0;
        tracing::debug!(listeners = detached, "binder cleaned up");
    }

    pub fn destroy(mut self, dom: &mut D) {
        self.cleanup(dom);
    }

    pub fn report(&self, dom: &D) -> BindingReport {
        BindingReport::collect(self, dom)
    }

    fn detach_all(&mut self, dom: &mut D) -> usize {
        let count = self.listeners.len();
        for (id, _) in self.listeners.drain() {
            dom.remove_listener(id);
        }
        count
    }
}
