//! Interactive prompts.

use console::Term;
use dialoguer::{Confirm, Input, Select};

use crate::error::{Result, SproutError};

use super::{Prompt, PromptOption, PromptResult, PromptType};

/// Convert dialoguer errors to SproutError.
fn map_dialoguer_err(e: dialoguer::Error) -> SproutError {
    SproutError::Io(e.into())
}

/// Prompt the user for input.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::Input => prompt_input(prompt, term),
        PromptType::Select { options } => prompt_select(prompt, options, term),
    }
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let default = prompt
        .default
        .as_ref()
        .map(|s| s.to_lowercase() == "true" || s == "y" || s == "yes")
        .unwrap_or(false);

    let result = Confirm::new()
        .with_prompt(&prompt.question)
        .default(default)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_input(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let input = Input::<String>::new().with_prompt(&prompt.question);

    let result: String = if let Some(default) = &prompt.default {
        input
            .default(default.clone())
            .interact_on(term)
            .map_err(map_dialoguer_err)?
    } else {
        input.interact_on(term).map_err(map_dialoguer_err)?
    };

    Ok(PromptResult::String(result))
}

fn prompt_select(prompt: &Prompt, options: &[PromptOption], term: &Term) -> Result<PromptResult> {
    if options.is_empty() {
        return Err(SproutError::Other(anyhow::anyhow!(
            "Nothing to choose from for '{}'",
            prompt.key
        )));
    }

    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
    let default_idx = default_index(prompt, options);

    let selection = Select::new()
        .with_prompt(&prompt.question)
        .items(&labels)
        .default(default_idx)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::String(options[selection].value.clone()))
}

fn default_index(prompt: &Prompt, options: &[PromptOption]) -> usize {
    prompt
        .default
        .as_ref()
        .and_then(|d| options.iter().position(|o| o.value == *d))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<PromptOption> {
        vec![
            PromptOption {
                label: "Project".into(),
                value: "project".into(),
            },
            PromptOption {
                label: "Component".into(),
                value: "component".into(),
            },
        ]
    }

    fn select(default: Option<&str>) -> Prompt {
        Prompt {
            key: "kind".into(),
            question: "Kind".into(),
            prompt_type: PromptType::Select { options: options() },
            default: default.map(String::from),
        }
    }

    #[test]
    fn default_index_matches_value() {
        assert_eq!(default_index(&select(Some("component")), &options()), 1);
    }

    #[test]
    fn default_index_falls_back_to_first() {
        assert_eq!(default_index(&select(None), &options()), 0);
        assert_eq!(default_index(&select(Some("other")), &options()), 0);
    }
}
