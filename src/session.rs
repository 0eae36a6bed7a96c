//! # Scripted Sessions
//!
//! A [`Session`] pairs a parsed [`Document`] with a [`Binder`] and replays operator
//! actions against it. Each action mutates the document the way the browser would
//! and hands the listeners it fired to the binder before returning, so the page is
//! fully settled after every step.
//!
//! Scripts are JSON arrays of interactions:
//!
//! ```json
//! [
//!   { "action": "check", "selector": "#holiday", "checked": true },
//!   { "action": "choose", "selector": "#reason", "value": "weather" },
//!   { "action": "type", "selector": "#name", "text": "山田" },
//!   { "action": "override", "group": ".notice", "value": "<b>closed</b>" },
//!   { "action": "refresh" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::binder::Binder;
use crate::config::BinderConfig;
use crate::document::{Document, NodeRef};
use crate::dom::{Dom, ListenerId};
use crate::error::BinderError;
use crate::report::BindingReport;

/// One operator action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Interaction {
    /// Click a checkbox or radio into the given state
    Check {
        selector: String,
        #[serde(default = "default_checked")]
        checked: bool,
    },
    /// Pick an option of a select by value
    Choose { selector: String, value: String },
    /// Replace the text of an input or textarea
    Type { selector: String, text: String },
    /// Manual write to a target group, bypassing priority
    Override { group: String, value: String },
    /// Re-resolve every group
    Refresh,
}

fn default_checked() -> bool {
    true
}

pub struct Session {
    document: Document,
    binder: Binder<Document>,
}

impl Session {
    /// Parse `html`, build a binder from `config` and run its initial pass
    pub fn new(html: &str, config: BinderConfig) -> Result<Self, BinderError> {
        let mut document = Document::parse(html)?;
        let mut binder = Binder::new(config)?;
        binder.init(&mut document, None);
        Ok(Self { document, binder })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn apply(&mut self, interaction: &Interaction) -> Result<(), BinderError> {
        tracing::debug!(interaction = ?interaction, "applying interaction");
        let fired: Vec<ListenerId> = match interaction {
            Interaction::Check { selector, checked } => {
                let node = self.element(selector)?;
                self.document.set_checked(&node, *checked)
            }
            Interaction::Choose { selector, value } => {
                let node = self.element(selector)?;
                self.document.select_option(&node, value)
            }
            Interaction::Type { selector, text } => {
                let node = self.element(selector)?;
                self.document.set_value(&node, text)
            }
            Interaction::Override { group, value } => {
                self.binder.update_targets(&mut self.document, group, value);
                Vec::new()
            }
            Interaction::Refresh => {
                self.binder.resolve_all(&mut self.document);
                Vec::new()
            }
        };
        self.binder.handle_events(&mut self.document, &fired);
        Ok(())
    }

    /// Apply a JSON array of interactions in order, stopping at the first failure
    pub fn run_script(&mut self, json: &str) -> Result<usize, BinderError> {
        let script: Vec<Interaction> = serde_json::from_str(json)?;
        for interaction in &script {
            self.apply(interaction)?;
        }
        Ok(script.len())
    }

    /// Rendered text of every element matching `selector`, one entry per node
    pub fn text_of(&self, selector: &str) -> Result<Vec<String>, BinderError> {
        Ok(self
            .document
            .query(selector)?
            .iter()
            .map(|node| self.document.rendered_text(node))
            .collect())
    }

    pub fn html_of(&self, selector: &str) -> Result<Vec<String>, BinderError> {
        Ok(self
            .document
            .query(selector)?
            .iter()
            .map(|node| self.document.inner_html(node))
            .collect())
    }

    pub fn report(&self) -> BindingReport {
        self.binder.report(&self.document)
    }

    pub fn to_html(&self) -> String {
        self.document.to_html()
    }

    /// Tear the binder down and hand back the settled document
    pub fn finish(self) -> Document {
        let Session {
            mut document,
            binder,
        } = self;
        binder.destroy(&mut document);
        document
    }

    fn element(&self, selector: &str) -> Result<NodeRef, BinderError> {
        self.document
            .query_one(selector)?
            .ok_or_else(|| BinderError::MissingElement {
                selector: selector.to_string(),
            })
    }
}
