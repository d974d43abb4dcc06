//! Guided questionnaire script and answer types.
//!
//! A script is an ordered list of prompts plus the fixed template used to
//! render the completion summary. Scripts are plain data so a custom one can
//! be loaded from `config.toml`.

use serde::{Deserialize, Serialize};

/// Placeholder used when a prompt does not define its own.
pub const DEFAULT_PLACEHOLDER: &str = "No especificado";

/// One scripted question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Key under which the answer is recorded.
    pub key: String,
    /// Question text shown to the user.
    pub question: String,
    /// Heading for this answer in the summary. Defaults to the key.
    #[serde(default)]
    pub label: Option<String>,
    /// Shown in the summary when the answer is missing.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Prompt {
    pub fn new(key: &str, question: &str) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            label: None,
            placeholder: default_placeholder(),
        }
    }

    pub fn with_label(mut self, label: &str, placeholder: &str) -> Self {
        self.label = Some(label.to_string());
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Fixed template for the completion summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTemplate {
    pub heading: String,
    #[serde(default)]
    pub intro: String,
    /// Prompt whose answer becomes the summary's title line. That prompt is
    /// not repeated in the body.
    #[serde(default)]
    pub title_key: Option<String>,
    #[serde(default)]
    pub title_fallback: String,
    /// When set, a footer line `**{label}:** `{conversation id}`` is added.
    #[serde(default)]
    pub conversation_label: Option<String>,
    #[serde(default)]
    pub closing: String,
}

/// A complete questionnaire definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireScript {
    /// Bold title shown above every question.
    pub title: String,
    /// Word before the position, e.g. "Pregunta" or "Question".
    #[serde(default = "default_step_label")]
    pub step_label: String,
    /// Word between position and total, e.g. "de" or "of".
    #[serde(default = "default_step_separator")]
    pub step_separator: String,
    pub prompts: Vec<Prompt>,
    pub summary: SummaryTemplate,
}

fn default_step_label() -> String {
    "Pregunta".to_string()
}

fn default_step_separator() -> String {
    "de".to_string()
}

/// One recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub key: String,
    pub value: String,
}

/// Answers keyed by prompt key, kept in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(Vec<Answer>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer verbatim, replacing any earlier answer for `key`.
    pub fn record(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|a| a.key == key) {
            Some(existing) => existing.value = value.to_string(),
            None => self.0.push(Answer {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_keep_insertion_order() {
        let mut answers = Answers::new();
        answers.record("b", "2");
        answers.record("a", "1");
        let keys: Vec<&str> = answers.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_answers_record_replaces() {
        let mut answers = Answers::new();
        answers.record("name", "Luna");
        answers.record("name", "Sol");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get("name"), Some("Sol"));
        assert_eq!(answers.get("missing"), None);
    }

    #[test]
    fn test_prompt_label_defaults_to_key() {
        let prompt = Prompt::new("tono_voz", "¿Qué tono?");
        assert_eq!(prompt.label(), "tono_voz");
        assert_eq!(prompt.placeholder, DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn test_script_deserializes_with_defaults() {
        let script: QuestionnaireScript = toml::from_str(
            r#"
title = "Onboarding"

[[prompts]]
key = "name"
question = "What is your name?"

[summary]
heading = "Done"
"#,
        )
        .unwrap();
        assert_eq!(script.step_label, "Pregunta");
        assert_eq!(script.step_separator, "de");
        assert_eq!(script.prompts.len(), 1);
        assert_eq!(script.prompts[0].placeholder, DEFAULT_PLACEHOLDER);
        assert!(script.summary.title_key.is_none());
    }

    #[test]
    fn test_answers_serialize_as_list() {
        let mut answers = Answers::new();
        answers.record("k", "v");
        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"[{"key":"k","value":"v"}]"#);
    }
}
