//! Project metadata collected before a template is installed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::error::{Result, SproutError};
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};

use super::descriptor::{templates_for, TemplateInfo};

/// Name attempts allowed before giving up.
const NAME_ATTEMPTS: usize = 3;

/// Default version of a new project.
pub const DEFAULT_PROJECT_VERSION: &str = "1.0.0";

/// What is being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    #[default]
    Project,
    Component,
}

impl ProjectKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Component => "component",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Component => "Component",
        }
    }
}

/// Answers gathered for a new project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    pub project_name: String,
    /// Kebab-case form of the name, used in package manifests.
    pub class_name: String,
    pub project_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_description: Option<String>,
    /// Registry name of the chosen template.
    pub project_template: String,
}

impl ProjectInfo {
    pub fn new(kind: ProjectKind, name: &str, version: &str, template: &str) -> Self {
        Self {
            kind,
            project_name: name.to_string(),
            class_name: class_name(name),
            project_version: version.to_string(),
            component_description: None,
            project_template: template.to_string(),
        }
    }

    /// Values available to template placeholders.
    ///
    /// Holds the camel-case fields plus the `name`, `version`, `className`
    /// and `description` aliases that package manifests refer to.
    pub fn render_context(&self) -> Map<String, Value> {
        let mut context = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        context.insert("name".into(), Value::String(self.class_name.clone()));
        context.insert("version".into(), Value::String(self.project_version.clone()));
        context.insert(
            "description".into(),
            Value::String(self.component_description.clone().unwrap_or_default()),
        );
        context
    }
}

/// Valid project names.
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]+([-][a-zA-Z][a-zA-Z0-9]*|[_][a-zA-Z][a-zA-Z0-9]*|[a-zA-Z0-9])*$")
        .expect("NAME_REGEX must compile")
});

/// Whether `name` is acceptable as a project name.
///
/// Names start with a letter, end with a letter or digit, and use `-` or `_`
/// only between alphanumeric runs.
pub fn is_valid_project_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Whether `version` is a valid semantic version.
pub fn is_valid_version(version: &str) -> bool {
    semver::Version::parse(version).is_ok()
}

/// Kebab-case form of a project name (`MyApp_core` → `my-app_core`).
///
/// Every capital becomes `-` plus its lowercase form; a single leading `-`
/// is then dropped. Other characters pass through unchanged.
pub fn class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            out.push('-');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    match out.strip_prefix('-') {
        Some(rest) => rest.to_string(),
        None => out,
    }
}

/// Ask for everything [`ProjectInfo`] needs.
///
/// A valid `name` skips the name prompt; a `template` argument skips the
/// template prompt when it is in the list.
///
/// # Errors
/// Returns [`SproutError::NoTemplates`] when nothing fits the chosen kind,
/// [`SproutError::InvalidProjectName`] after repeated bad names and
/// [`SproutError::InvalidVersion`] for a non-semver version.
pub fn collect_project_info(
    ui: &mut dyn UserInterface,
    templates: &[TemplateInfo],
    name: Option<&str>,
    template: Option<&str>,
) -> Result<ProjectInfo> {
    let kind = ask_kind(ui)?;

    let project_name = match name.filter(|n| is_valid_project_name(n)) {
        Some(n) => n.to_string(),
        None => ask_name(ui, kind)?,
    };

    let version = ui
        .prompt(&Prompt {
            key: "projectVersion".into(),
            question: format!("{} version", kind.label()),
            prompt_type: PromptType::Input,
            default: Some(DEFAULT_PROJECT_VERSION.into()),
        })?
        .as_string();
    let version = version.trim().to_string();
    if !is_valid_version(&version) {
        return Err(SproutError::InvalidVersion { version });
    }

    let candidates = templates_for(templates, kind);
    if candidates.is_empty() {
        return Err(SproutError::NoTemplates);
    }
    let project_template = match template {
        Some(t) => candidates
            .iter()
            .find(|c| c.npm_name == t)
            .map(|c| c.npm_name.clone())
            .ok_or_else(|| SproutError::UnknownTemplate { name: t.to_string() })?,
        None => ask_template(ui, kind, &candidates)?,
    };

    let mut info = ProjectInfo::new(kind, &project_name, &version, &project_template);
    if kind == ProjectKind::Component {
        let description = ui
            .prompt(&Prompt {
                key: "componentDescription".into(),
                question: "Component description".into(),
                prompt_type: PromptType::Input,
                default: Some(String::new()),
            })?
            .as_string();
        info.component_description = Some(description);
    }

    Ok(info)
}

fn ask_kind(ui: &mut dyn UserInterface) -> Result<ProjectKind> {
    let options = [ProjectKind::Project, ProjectKind::Component]
        .iter()
        .map(|k| PromptOption {
            label: k.label().into(),
            value: k.as_str().into(),
        })
        .collect();
    let answer = ui
        .prompt(&Prompt {
            key: "type".into(),
            question: "What do you want to create".into(),
            prompt_type: PromptType::Select { options },
            default: Some(ProjectKind::Project.as_str().into()),
        })?
        .as_string();

    Ok(match answer.as_str() {
        "component" => ProjectKind::Component,
        _ => ProjectKind::Project,
    })
}

fn ask_name(ui: &mut dyn UserInterface, kind: ProjectKind) -> Result<String> {
    let prompt = Prompt {
        key: "projectName".into(),
        question: format!("{} name", kind.label()),
        prompt_type: PromptType::Input,
        default: None,
    };

    let mut last = String::new();
    for _ in 0..NAME_ATTEMPTS {
        last = ui.prompt(&prompt)?.as_string().trim().to_string();
        if is_valid_project_name(&last) {
            return Ok(last);
        }
        ui.warning(&format!("'{}' is not a valid {} name", last, kind.as_str()));
    }
    Err(SproutError::InvalidProjectName { name: last })
}

fn ask_template(
    ui: &mut dyn UserInterface,
    kind: ProjectKind,
    candidates: &[&TemplateInfo],
) -> Result<String> {
    let options = candidates
        .iter()
        .map(|t| PromptOption {
            label: t.name.clone(),
            value: t.npm_name.clone(),
        })
        .collect();
    Ok(ui
        .prompt(&Prompt {
            key: "projectTemplate".into(),
            question: format!("{} template", kind.label()),
            prompt_type: PromptType::Select { options },
            default: candidates.first().map(|t| t.npm_name.clone()),
        })?
        .as_string())
}
