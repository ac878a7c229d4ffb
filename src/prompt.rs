//! Interactive prompt sequencer.
//!
//! Parameters carrying an `input` marker may be collected from the user at
//! run time. The sequencer walks the registered parameters in registration
//! order, prompts for the first one still unset, stores the answer and
//! rescans from the start, so dispatch only proceeds once every interactive
//! slot is filled. Strictly sequential: at most one pending prompt exists
//! at any time.

use crate::param::{InputMode, ParamDef};
use crate::resolve::ResolvedOptions;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read user input: {0}")]
    Input(#[from] inquire::InquireError),
}

/// Boundary seam over the terminal line-editing primitive.
pub trait Prompter {
    fn prompt(&mut self, param: &ParamDef) -> Result<String, PromptError>;
}

/// Production prompter backed by `inquire`. Parameters marked `hidden` use
/// a password prompt that never echoes the entered value.
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn prompt(&mut self, param: &ParamDef) -> Result<String, PromptError> {
        let label = format!("{} <{}>:", param.description(), param.name);
        let value = match param.input {
            Some(InputMode::Hidden) => inquire::Password::new(&label)
                .without_confirmation()
                .prompt()?,
            _ => inquire::Text::new(&label).prompt()?,
        };
        Ok(value)
    }
}

/// Fill every registered interactive parameter still unset in `options`.
///
/// Only the parameter name is ever logged; the entered value is not.
pub fn fill_interactive(
    options: &mut ResolvedOptions,
    interactive: &[ParamDef],
    prompter: &mut dyn Prompter,
) -> Result<(), PromptError> {
    loop {
        let Some(param) = interactive.iter().find(|p| !options.contains(&p.name)) else {
            return Ok(());
        };

        debug!("Prompting for parameter {}", param.name);
        let answer = prompter.prompt(param)?;
        options.insert(param.name.clone(), Value::String(answer));
    }
}
