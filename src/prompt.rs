use indexmap::IndexMap;
use inquire::{required, validator::MinLengthValidator, Confirm, MultiSelect, Select, Text};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("Prompt for '{question}' failed")]
    #[diagnostic(
        code(uecli::prompt::inquire),
        help("Run with --no-input to use the default values without prompting")
    )]
    Inquire {
        question: String,
        #[source]
        source: inquire::InquireError,
    },

    #[error("Question '{question}' of type {kind:?} needs a list of choices")]
    #[diagnostic(code(uecli::prompt::missing_choices), help("Add `choices = [...]` to the template manifest"))]
    MissingChoices { question: String, kind: QuestionType },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum QuestionType {
    Text,
    Confirm,
    Select,
    MultiSelect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub r#type: QuestionType,
    #[serde(default)]
    pub help: String,
    pub choices: Option<Vec<String>>,
    pub default: Option<Answer>,
}

/// Ordered set of questions declared by a template manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionsFile(pub IndexMap<String, Question>);

/// A value substituted into templates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Answer {
    String(String),
    Bool(bool),
    Array(Vec<String>),
}

fn inquire_error(question: &str) -> impl FnOnce(inquire::InquireError) -> PromptError + '_ {
    move |source| PromptError::Inquire {
        question: question.to_string(),
        source,
    }
}

fn choices_for(name: &str, question: &Question) -> Result<Vec<String>, PromptError> {
    question
        .choices
        .clone()
        .filter(|choices| !choices.is_empty())
        .ok_or_else(|| PromptError::MissingChoices {
            question: name.to_string(),
            kind: question.r#type,
        })
}

/// Asks a single question interactively, pre-filled with `default` when its
/// shape fits the question type.
pub fn ask(name: &str, question: &Question, default: Option<&Answer>) -> Result<Answer, PromptError> {
    match question.r#type {
        QuestionType::Text => {
            let mut prompt = Text::new(name)
                .with_help_message(&question.help)
                .with_validator(required!(format!("{} is required", name)));

            if let Some(Answer::String(value)) = default {
                prompt = prompt.with_default(value);
            }

            let answer = prompt.prompt().map_err(inquire_error(name))?;

            Ok(Answer::String(answer))
        }
        QuestionType::Confirm => {
            let mut prompt = Confirm::new(name).with_help_message(&question.help);

            if let Some(Answer::Bool(value)) = default {
                prompt = prompt.with_default(*value);
            }

            let answer = prompt.prompt().map_err(inquire_error(name))?;

            Ok(Answer::Bool(answer))
        }
        QuestionType::Select => {
            let choices = choices_for(name, question)?;

            let cursor = match default {
                Some(Answer::String(value)) => choices.iter().position(|c| c == value),
                _ => None,
            };

            let answer = Select::new(name, choices)
                .with_help_message(&question.help)
                .with_starting_cursor(cursor.unwrap_or(0))
                .prompt()
                .map_err(inquire_error(name))?;

            Ok(Answer::String(answer))
        }
        QuestionType::MultiSelect => {
            let choices = choices_for(name, question)?;

            let selected: Vec<usize> = match default {
                Some(Answer::Array(values)) => choices
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| values.contains(c))
                    .map(|(i, _)| i)
                    .collect(),
                _ => Vec::new(),
            };

            let answer = MultiSelect::new(name, choices)
                .with_help_message(&question.help)
                .with_default(&selected)
                .with_validator(MinLengthValidator::new(1))
                .prompt()
                .map_err(inquire_error(name))?;

            Ok(Answer::Array(answer))
        }
    }
}

/// The value used without prompting: the given default, or the first choice of a
/// `Select`.
pub fn non_interactive_answer(question: &Question, default: Option<&Answer>) -> Option<Answer> {
    if let Some(default) = default {
        return Some(default.clone());
    }

    match question.r#type {
        QuestionType::Confirm => Some(Answer::Bool(false)),
        QuestionType::Select => question
            .choices
            .as_ref()
            .and_then(|choices| choices.first())
            .map(|choice| Answer::String(choice.clone())),
        QuestionType::MultiSelect => Some(Answer::Array(Vec::new())),
        QuestionType::Text => None,
    }
}

pub fn apply_changes() -> Result<bool, PromptError> {
    Confirm::new("Apply changes?")
        .with_default(true)
        .prompt()
        .map_err(inquire_error("Apply changes?"))
}
