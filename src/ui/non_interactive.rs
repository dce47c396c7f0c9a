//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{Result, SproutError};

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

const PROMPT_ENV_PREFIX: &str = "SPROUT_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `SPROUT_PROMPT_<KEY>` variables, then from the
/// prompt's default. A prompt with neither is an error.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        let answer = self
            .env_overrides
            .get(&env_key)
            .or(prompt.default.as_ref())
            .cloned();

        match answer {
            Some(value) if matches!(prompt.prompt_type, PromptType::Confirm) => Ok(
                PromptResult::Bool(PromptResult::String(value).as_bool()),
            ),
            Some(value) => Ok(PromptResult::String(value)),
            None => Err(SproutError::Other(anyhow::anyhow!(
                "Cannot prompt for '{}' in non-interactive mode (no default value)",
                prompt.key
            ))),
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(LineSpinner { mode: self.mode })
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints its final line instead of animating.
struct LineSpinner {
    mode: OutputMode,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }
}
