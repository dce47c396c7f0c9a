//! Template descriptors and the template list.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SproutError};

use super::project::ProjectKind;

/// How a template is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Files are copied and rendered, then whitelisted commands run.
    #[default]
    Normal,
    /// The template package ships its own installer entry.
    Custom,
}

/// A template as listed in the configuration or the remote template list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    /// Display name.
    pub name: String,
    /// Package name in the registry.
    pub npm_name: String,
    /// Version to install, or `latest`.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, rename = "type")]
    pub kind: TemplateKind,
    /// Which kinds of project the template can create.
    #[serde(default)]
    pub tag: Vec<ProjectKind>,
    /// Globs, relative to the project directory, that are never rendered.
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub install_command: Option<String>,
    #[serde(default)]
    pub start_command: Option<String>,
}

fn default_version() -> String {
    crate::package::LATEST.to_string()
}

impl TemplateInfo {
    /// Whether the template can create a project of `kind`.
    ///
    /// Untagged templates create projects.
    pub fn supports(&self, kind: ProjectKind) -> bool {
        if self.tag.is_empty() {
            kind == ProjectKind::Project
        } else {
            self.tag.contains(&kind)
        }
    }
}

/// Templates usable for `kind`, in list order.
pub fn templates_for(templates: &[TemplateInfo], kind: ProjectKind) -> Vec<&TemplateInfo> {
    templates.iter().filter(|t| t.supports(kind)).collect()
}

/// Download a JSON array of templates.
///
/// # Errors
/// Transport failures, non-success statuses and malformed bodies are all
/// reported as [`SproutError::Registry`].
pub fn fetch_template_list(url: &str) -> Result<Vec<TemplateInfo>> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("sprout/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SproutError::registry(url, e))?;

    tracing::debug!("Fetching template list from {}", url);
    let response = client
        .get(url)
        .send()
        .map_err(|e| SproutError::registry(url, e))?;

    if !response.status().is_success() {
        return Err(SproutError::registry(
            url,
            format!("template list returned {}", response.status()),
        ));
    }

    response
        .json::<Vec<TemplateInfo>>()
        .map_err(|e| SproutError::registry(url, format!("invalid template list: {e}")))
}
