//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use sprout::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("projectName", "my-app");
//!
//! ui.message("Collecting project info");
//! ui.success("Done!");
//!
//! assert!(ui.has_message("Collecting"));
//! assert!(ui.successes().contains(&"Done!".to_string()));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::Result;

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
///
/// Supports single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked more than once.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Rc<RefCell<Vec<SpinnerRecord>>>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
}

/// What happened to one spinner started through a [`MockUI`].
#[derive(Debug, Clone, Default)]
pub struct SpinnerRecord {
    /// Message the spinner was started with.
    pub message: String,
    /// Final status, if the spinner was finished.
    pub status: Option<SpinnerStatus>,
    /// Final message, if the spinner was finished.
    pub finish_message: Option<String>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue multiple responses for the same prompt key.
    ///
    /// Responses are returned in order; once exhausted, falls back to
    /// `set_prompt_response` or the prompt default.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all prompts that were shown (by key).
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// Snapshot of every spinner started so far.
    pub fn spinners(&self) -> Vec<SpinnerRecord> {
        self.spinners.borrow().clone()
    }

    /// Final statuses of the spinners that were finished, in start order.
    pub fn spinner_statuses(&self) -> Vec<SpinnerStatus> {
        self.spinners
            .borrow()
            .iter()
            .filter_map(|s| s.status)
            .collect()
    }

    /// True when every started spinner was finished.
    pub fn all_spinners_finished(&self) -> bool {
        self.spinners.borrow().iter().all(|s| s.status.is_some())
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    fn answer(prompt: &Prompt, response: String) -> PromptResult {
        if matches!(prompt.prompt_type, PromptType::Confirm) {
            PromptResult::Bool(PromptResult::String(response).as_bool())
        } else {
            PromptResult::String(response)
        }
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        if let Some(response) = self
            .prompt_queues
            .get_mut(&prompt.key)
            .and_then(|q| q.pop_front())
        {
            return Ok(Self::answer(prompt, response));
        }

        if let Some(response) = self.prompt_responses.get(&prompt.key) {
            return Ok(Self::answer(prompt, response.clone()));
        }

        if let Some(default) = &prompt.default {
            return Ok(Self::answer(prompt, default.clone()));
        }

        Ok(Self::answer(prompt, String::new()))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let mut records = self.spinners.borrow_mut();
        records.push(SpinnerRecord {
            message: message.to_string(),
            ..Default::default()
        });
        Box::new(MockSpinner {
            index: records.len() - 1,
            records: Rc::clone(&self.spinners),
            messages: Vec::new(),
        })
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that reports its finish back to the owning [`MockUI`].
#[derive(Debug)]
pub struct MockSpinner {
    index: usize,
    records: Rc<RefCell<Vec<SpinnerRecord>>>,
    messages: Vec<String>,
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    /// Finished successfully.
    Success,
    /// Finished with error.
    Error,
}

impl MockSpinner {
    /// Messages set while spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn finish(&mut self, status: SpinnerStatus, msg: &str) {
        if let Some(record) = self.records.borrow_mut().get_mut(self.index) {
            record.status = Some(status);
            record.finish_message = Some(msg.to_string());
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(SpinnerStatus::Success, msg);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(SpinnerStatus::Error, msg);
    }
}
