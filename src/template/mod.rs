//! Project templates.
//!
//! A template is a package whose `template/` directory holds the files of a
//! new project. NORMAL templates are copied and rendered by sprout and then
//! set up with whitelisted package-manager commands; CUSTOM templates ship an
//! installer entry that does the work in a subprocess.

pub mod descriptor;
pub mod install;
pub mod project;
pub mod render;

pub use descriptor::{fetch_template_list, templates_for, TemplateInfo, TemplateKind};
pub use install::{check_command, TemplateInstaller, ALLOWED_COMMANDS, TEMPLATE_SUBDIR};
pub use project::{
    class_name, collect_project_info, is_valid_project_name, is_valid_version, ProjectInfo,
    ProjectKind, DEFAULT_PROJECT_VERSION,
};
pub use render::{render_dir, render_file, render_str};
