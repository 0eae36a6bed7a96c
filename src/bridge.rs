//! Node-API entry points
//!
//! Hosts hand over a page, an optional configuration and an optional interaction
//! script, and get back the settled markup plus a binding report.

use napi_derive::napi;
use serde::Serialize;

use crate::config::BinderConfig;
use crate::error::BinderError;
use crate::report::BindingReport;
use crate::session::Session;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub html: String,
    pub report: BindingReport,
}

pub fn render_bound_page(
    html: &str,
    config_json: Option<&str>,
    script_json: Option<&str>,
) -> Result<RenderedPage, BinderError> {
    let config = match config_json {
        Some(json) => BinderConfig::from_json(json)?,
        None => BinderConfig::default(),
    };
    let mut session = Session::new(html, config)?;
    if let Some(script) = script_json {
        session.run_script(script)?;
    }
    Ok(RenderedPage {
        html: session.to_html(),
        report: session.report(),
    })
}

#[napi]
pub fn render_bound_page_native(
    html: String,
    config_json: Option<String>,
    script_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let page = render_bound_page(&html, config_json.as_deref(), script_json.as_deref())
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_value(page).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[napi]
pub fn binder_bridge() -> String {
    "Form Binder Native Bridge Connected".to_string()
}
