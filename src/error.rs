//! Error taxonomy for the binding engine.
//!
//! Only construction, root lookup, document parsing and session scripting surface
//! these to callers. Failures inside a resolution cycle are logged and the affected
//! group keeps its last written content.

/// Errors that can occur while configuring or driving a binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinderError {
    /// The configuration cannot produce a working engine
    Config { reason: String },
    /// A selector string could not be parsed
    InvalidSelector { selector: String, reason: String },
    /// A required search root did not match any element
    MissingRoot { selector: String },
    /// An interaction addressed a control that is not on the page
    MissingElement { selector: String },
    /// Markup could not be parsed into a document or fragment
    HtmlParse { reason: String },
    /// The operation needs an element but received another node type
    NotAnElement,
    /// Reports or scripts failed to (de)serialize
    Serialization { reason: String },
}

impl BinderError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BinderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "Invalid binder configuration: {}", reason),
            Self::InvalidSelector { selector, reason } => {
                write!(f, "Invalid selector '{}': {}", selector, reason)
            }
            Self::MissingRoot { selector } => {
                write!(f, "Search root '{}' does not match any element", selector)
            }
            Self::MissingElement { selector } => {
                write!(f, "No element matches '{}'", selector)
            }
            Self::HtmlParse { reason } => write!(f, "Failed to parse HTML: {}", reason),
            Self::NotAnElement => write!(f, "Node is not an element"),
            Self::Serialization { reason } => write!(f, "Serialization error: {}", reason),
        }
    }
}

impl std::error::Error for BinderError {}

impl From<serde_json::Error> for BinderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            reason: e.to_string(),
        }
    }
}
