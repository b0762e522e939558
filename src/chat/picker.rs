//! Interactive model selection.

use std::io;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model};

/// Something that can choose a model from a fixed list.
pub trait ModelSelector {
    /// Pick one of `choices`; `current` is the model in use now.
    fn select_model(&mut self, choices: &[KnownModel], current: &Model) -> Result<Model>;
}

/// Prompts on the terminal with a numbered list.
#[derive(Debug, Default)]
pub struct PromptSelector;

impl PromptSelector {
    /// Creates a terminal selector.
    pub fn new() -> Self {
        Self
    }
}

impl ModelSelector for PromptSelector {
    fn select_model(&mut self, choices: &[KnownModel], current: &Model) -> Result<Model> {
        let mut rl = DefaultEditor::new().map_err(readline_error)?;
        println!("Select Model");
        for (i, choice) in choices.iter().enumerate() {
            let marker = if Model::Known(*choice) == *current { "*" } else { " " };
            println!("  {marker} {}) {choice}", i + 1);
        }
        loop {
            let line = rl.readline("> ").map_err(readline_error)?;
            match parse_selection(&line, choices) {
                Some(model) => return Ok(Model::Known(model)),
                None => println!("Enter a number between 1 and {} or a model name.", choices.len()),
            }
        }
    }
}

/// Interprets a reply as a 1-based index or an exact model name.
pub fn parse_selection(input: &str, choices: &[KnownModel]) -> Option<KnownModel> {
    let input = input.trim();
    if let Ok(index) = input.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| choices.get(i)).copied();
    }
    choices.iter().find(|choice| choice.as_str() == input).copied()
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Interrupted | ReadlineError::Eof => Error::abort("model selection cancelled"),
        ReadlineError::Io(err) => Error::io(format!("failed to read selection: {err}"), err),
        err => Error::io(
            format!("failed to read selection: {err}"),
            io::Error::other(err.to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_by_index() {
        assert_eq!(parse_selection("1", &KnownModel::ALL), Some(KnownModel::Gpt4o));
        assert_eq!(parse_selection(" 4 ", &KnownModel::ALL), Some(KnownModel::Gpt4Turbo));
    }

    #[test]
    fn select_by_name() {
        assert_eq!(
            parse_selection("gpt-3.5-turbo", &KnownModel::ALL),
            Some(KnownModel::Gpt35Turbo)
        );
    }

    #[test]
    fn reject_out_of_range_and_unknown() {
        assert_eq!(parse_selection("0", &KnownModel::ALL), None);
        assert_eq!(parse_selection("5", &KnownModel::ALL), None);
        assert_eq!(parse_selection("gpt-5", &KnownModel::ALL), None);
        assert_eq!(parse_selection("", &KnownModel::ALL), None);
    }

    #[test]
    fn cancelled_prompt_is_abort() {
        assert!(readline_error(ReadlineError::Interrupted).is_abort());
        assert!(readline_error(ReadlineError::Eof).is_abort());
    }
}
