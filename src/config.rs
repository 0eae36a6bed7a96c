//! Binder configuration
//!
//! The declarative attribute vocabulary a page uses to wire sources to target
//! groups. Two presets exist: the form binder (`data-bind-*`) and the text
//! toggler (`data-toggle-*`). Both run on the same engine.

use serde::{Deserialize, Serialize};

use crate::error::BinderError;
use crate::selector::SelectorList;

/// Rank given to sources that do not declare a priority. Lower wins.
pub const DEFAULT_PRIORITY: i32 = 999;

/// Default active value of a checkbox that declares none
pub const DEFAULT_CHECKED_VALUE: &str = "true";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinderConfig {
    /// Selectors used to discover sources; matches are unioned in this order
    pub source_selectors: Vec<String>,
    /// Attribute holding the target-group selector(s)
    pub target_attr: String,
    pub priority_attr: String,
    /// Attribute holding the value written while the source is on
    pub value_attr: String,
    /// Attribute holding the value written while a checkbox is off
    pub inactive_value_attr: String,
    /// Separates several target groups inside one target attribute
    pub target_separator: String,
    pub default_priority: i32,
    /// Also listen to `input` on free-text sources so keystrokes update live
    pub live_text: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self::form_binder()
    }
}

impl BinderConfig {
    pub fn form_binder() -> Self {
        Self {
            source_selectors: vec!["[data-bind-target]".to_string()],
            target_attr: "data-bind-target".to_string(),
            priority_attr: "data-priority".to_string(),
            value_attr: "data-value".to_string(),
            inactive_value_attr: "data-inactive-value".to_string(),
            target_separator: ";".to_string(),
            default_priority: DEFAULT_PRIORITY,
            live_text: true,
        }
    }

    pub fn text_toggler() -> Self {
        Self {
            source_selectors: vec!["[data-toggle-target]".to_string()],
            target_attr: "data-toggle-target".to_string(),
            priority_attr: "data-toggle-priority".to_string(),
            value_attr: "data-toggle-text".to_string(),
            inactive_value_attr: "data-toggle-off-text".to_string(),
            ..Self::form_binder()
        }
    }

    /// Parse a (possibly partial) JSON configuration. Missing fields fall back to the
    /// form binder preset.
    pub fn from_json(json: &str) -> Result<Self, BinderError> {
        let config: BinderConfig = serde_json::from_str(json)
            .map_err(|e| BinderError::config(format!("unreadable configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BinderError> {
        if self.source_selectors.is_empty() {
            return Err(BinderError::config("no source selectors configured"));
        }
        for selector in &self.source_selectors {
            SelectorList::parse(selector).map_err(|e| {
                BinderError::config(format!("source selector is unusable: {}", e))
            })?;
        }

        let attrs = [
            ("targetAttr", &self.target_attr),
            ("priorityAttr", &self.priority_attr),
            ("valueAttr", &self.value_attr),
            ("inactiveValueAttr", &self.inactive_value_attr),
        ];
        for (field, value) in attrs {
            if value.trim().is_empty() {
                return Err(BinderError::config(format!("{} must not be empty", field)));
            }
        }

        if self.target_separator.is_empty() {
            return Err(BinderError::config("targetSeparator must not be empty"));
        }
        Ok(())
    }
}
