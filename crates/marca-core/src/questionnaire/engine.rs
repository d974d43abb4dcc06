//! Scripted question/answer state machine.
//!
//! While active, every user turn is consumed as the answer to the current
//! prompt and never reaches the backend. After the last prompt the engine
//! renders a deterministic summary and becomes complete.

use marca_types::error::QuestionnaireError;
use marca_types::questionnaire::{Answers, QuestionnaireScript};
use uuid::Uuid;

/// Lifecycle of one questionnaire run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionnaireState {
    #[default]
    Inactive,
    Active {
        index: usize,
        answers: Answers,
    },
    Complete {
        answers: Answers,
    },
}

/// What the engine emits after consuming an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionnaireStep {
    /// The next scripted question.
    Next { text: String },
    /// Final summary plus the full answer set.
    Complete { summary: String, answers: Answers },
}

/// Drives one [`QuestionnaireScript`].
#[derive(Debug, Clone)]
pub struct QuestionnaireEngine {
    script: QuestionnaireScript,
    state: QuestionnaireState,
    conversation_id: Option<Uuid>,
}

impl QuestionnaireEngine {
    pub fn new(script: QuestionnaireScript) -> Self {
        Self {
            script,
            state: QuestionnaireState::Inactive,
            conversation_id: None,
        }
    }

    /// Include the conversation id footer in the completion summary.
    pub fn with_conversation_id(mut self, id: Uuid) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn script(&self) -> &QuestionnaireScript {
        &self.script
    }

    pub fn state(&self) -> &QuestionnaireState {
        &self.state
    }

    /// Put the engine back into an earlier state, e.g. after a failed write.
    pub fn restore(&mut self, state: QuestionnaireState) {
        self.state = state;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, QuestionnaireState::Active { .. })
    }

    /// One-based position of the pending question and the total count.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.state {
            QuestionnaireState::Active { index, .. } => {
                Some((index + 1, self.script.prompts.len()))
            }
            _ => None,
        }
    }

    /// Begin (or restart) the questionnaire and return the first question.
    pub fn start(&mut self) -> Result<String, QuestionnaireError> {
        if self.script.prompts.is_empty() {
            return Err(QuestionnaireError::EmptyScript);
        }
        self.state = QuestionnaireState::Active {
            index: 0,
            answers: Answers::new(),
        };
        Ok(self.question_text(0))
    }

    /// Record `text` as the answer to the pending question and advance.
    pub fn answer(&mut self, text: &str) -> Result<QuestionnaireStep, QuestionnaireError> {
        let (index, mut answers) = match std::mem::take(&mut self.state) {
            QuestionnaireState::Active { index, answers } => (index, answers),
            other => {
                self.state = other;
                return Err(QuestionnaireError::NotActive);
            }
        };

        answers.record(&self.script.prompts[index].key, text);
        let next = index + 1;

        if next < self.script.prompts.len() {
            self.state = QuestionnaireState::Active {
                index: next,
                answers,
            };
            return Ok(QuestionnaireStep::Next {
                text: self.question_text(next),
            });
        }

        let summary = render_summary(&self.script, &answers, self.conversation_id.as_ref());
        self.state = QuestionnaireState::Complete {
            answers: answers.clone(),
        };
        Ok(QuestionnaireStep::Complete { summary, answers })
    }

    fn question_text(&self, index: usize) -> String {
        let script = &self.script;
        format!(
            "**{}** ({} {} {} {})\n\n{}",
            script.title,
            script.step_label,
            index + 1,
            script.step_separator,
            script.prompts.len(),
            script.prompts[index].question,
        )
    }
}

/// Render the completion summary for `answers`.
///
/// Blank answers are replaced by the prompt's placeholder.
pub fn render_summary(
    script: &QuestionnaireScript,
    answers: &Answers,
    conversation_id: Option<&Uuid>,
) -> String {
    let template = &script.summary;
    let answered = |key: &str| answers.get(key).filter(|v| !v.trim().is_empty());

    let mut blocks = vec![template.heading.clone()];
    if !template.intro.is_empty() {
        blocks.push(template.intro.clone());
    }
    blocks.push("---".to_string());

    if let Some(title_key) = &template.title_key {
        let title = answered(title_key.as_str()).unwrap_or(template.title_fallback.as_str());
        blocks.push(format!("### **{title}**"));
    }

    for prompt in &script.prompts {
        if template.title_key.as_deref() == Some(prompt.key.as_str()) {
            continue;
        }
        let value = answered(prompt.key.as_str()).unwrap_or(prompt.placeholder.as_str());
        blocks.push(format!("**{}:**\n{}", prompt.label(), value));
    }

    let footer = match (&template.conversation_label, conversation_id) {
        (Some(label), Some(id)) => Some(format!("**{label}:** `{id}`")),
        _ => None,
    };
    if footer.is_some() || !template.closing.is_empty() {
        blocks.push("---".to_string());
    }
    blocks.extend(footer);
    if !template.closing.is_empty() {
        blocks.push(template.closing.clone());
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marca_types::questionnaire::{Prompt, SummaryTemplate};

    fn three_step_script() -> QuestionnaireScript {
        QuestionnaireScript {
            title: "Onboarding".to_string(),
            step_label: "Pregunta".to_string(),
            step_separator: "de".to_string(),
            prompts: vec![
                Prompt::new("name", "¿Nombre?"),
                Prompt::new("color", "¿Color?").with_label("Color", "Sin color"),
                Prompt::new("values", "¿Valores?").with_label("Valores", "No especificados"),
            ],
            summary: SummaryTemplate {
                heading: "**Listo**".to_string(),
                intro: String::new(),
                title_key: Some("name".to_string()),
                title_fallback: "Sin nombre".to_string(),
                conversation_label: Some("ID".to_string()),
                closing: "Fin.".to_string(),
            },
        }
    }

    #[test]
    fn test_three_step_walk() {
        let mut engine = QuestionnaireEngine::new(three_step_script());
        assert!(!engine.is_active());

        let first = engine.start().unwrap();
        assert_eq!(first, "**Onboarding** (Pregunta 1 de 3)\n\n¿Nombre?");
        assert_eq!(engine.progress(), Some((1, 3)));

        let step = engine.answer("Luna").unwrap();
        assert_eq!(
            step,
            QuestionnaireStep::Next {
                text: "**Onboarding** (Pregunta 2 de 3)\n\n¿Color?".to_string()
            }
        );

        engine.answer("azul").unwrap();
        assert_eq!(engine.progress(), Some((3, 3)));

        let QuestionnaireStep::Complete { summary, answers } = engine.answer("").unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(answers.len(), 3);
        assert_eq!(answers.get("name"), Some("Luna"));
        assert_eq!(answers.get("values"), Some(""));
        assert!(summary.contains("### **Luna**"));
        assert!(summary.contains("**Color:**\nazul"));
        assert!(summary.contains("**Valores:**\nNo especificados"));
        assert!(!engine.is_active());
        assert!(matches!(engine.state(), QuestionnaireState::Complete { .. }));
    }

    #[test]
    fn test_answer_when_inactive() {
        let mut engine = QuestionnaireEngine::new(three_step_script());
        assert_eq!(engine.answer("x"), Err(QuestionnaireError::NotActive));
        assert_eq!(engine.state(), &QuestionnaireState::Inactive);
    }

    #[test]
    fn test_answer_after_complete() {
        let mut engine = QuestionnaireEngine::new(three_step_script());
        engine.start().unwrap();
        for answer in ["a", "b", "c"] {
            engine.answer(answer).unwrap();
        }
        assert_eq!(engine.answer("d"), Err(QuestionnaireError::NotActive));
        assert!(matches!(engine.state(), QuestionnaireState::Complete { .. }));
    }

    #[test]
    fn test_empty_script_cannot_start() {
        let mut script = three_step_script();
        script.prompts.clear();
        let mut engine = QuestionnaireEngine::new(script);
        assert_eq!(engine.start(), Err(QuestionnaireError::EmptyScript));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_restart_discards_answers() {
        let mut engine = QuestionnaireEngine::new(three_step_script());
        engine.start().unwrap();
        engine.answer("first").unwrap();
        engine.start().unwrap();
        assert_eq!(
            engine.state(),
            &QuestionnaireState::Active {
                index: 0,
                answers: Answers::new()
            }
        );
    }

    #[test]
    fn test_restore_previous_state() {
        let mut engine = QuestionnaireEngine::new(three_step_script());
        let before = engine.state().clone();
        engine.start().unwrap();
        engine.restore(before);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_summary_layout() {
        let id = Uuid::nil();
        let mut answers = Answers::new();
        answers.record("color", "verde");
        let summary = render_summary(&three_step_script(), &answers, Some(&id));
        assert_eq!(
            summary,
            format!(
                "**Listo**\n\n---\n\n### **Sin nombre**\n\n**Color:**\nverde\n\n\
                 **Valores:**\nNo especificados\n\n---\n\n**ID:** `{id}`\n\nFin."
            )
        );
    }

    #[test]
    fn test_summary_is_deterministic() {
        let mut answers = Answers::new();
        answers.record("values", "honestidad");
        answers.record("name", "Sol");
        let script = three_step_script();
        assert_eq!(
            render_summary(&script, &answers, None),
            render_summary(&script, &answers, None)
        );
    }

    #[test]
    fn test_summary_without_footer_or_closing() {
        let mut script = three_step_script();
        script.summary.conversation_label = None;
        script.summary.closing.clear();
        script.summary.title_key = None;
        let summary = render_summary(&script, &Answers::new(), Some(&Uuid::nil()));
        assert!(summary.starts_with("**Listo**\n\n---\n\n**name:**\nNo especificado"));
        assert!(summary.ends_with("**Valores:**\nNo especificados"));
    }
}
