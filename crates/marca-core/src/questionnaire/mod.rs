//! Guided questionnaire.
//!
//! [`QuestionnaireEngine`] walks a [`QuestionnaireScript`] one answer at a
//! time. The built-in script lives in [`branding`].
//!
//! [`QuestionnaireScript`]: marca_types::questionnaire::QuestionnaireScript

pub mod branding;
pub mod engine;

pub use engine::{QuestionnaireEngine, QuestionnaireState, QuestionnaireStep, render_summary};
