//! Default ten-question brand-profile questionnaire (Spanish).

use marca_types::questionnaire::{Prompt, QuestionnaireScript, SummaryTemplate};

pub const BRANDING_TITLE: &str = "Cuestionario de Branding";

/// Key of the brand-name prompt, used as the summary title.
pub const BRAND_NAME_KEY: &str = "nombre_marca";

pub fn branding_script() -> QuestionnaireScript {
    let prompts = vec![
        Prompt::new(BRAND_NAME_KEY, "¿Cómo se llama tu marca?")
            .with_label("Nombre de Marca", "Tu Marca"),
        Prompt::new(
            "oferta_valor",
            "¿Qué problema resuelves o qué beneficio ofreces a tus clientes?",
        )
        .with_label("Oferta de Valor", "No especificada"),
        Prompt::new(
            "perfil_cliente",
            "Describe a tu cliente ideal (edad, intereses, necesidades principales).",
        )
        .with_label("Cliente Ideal", "No especificado"),
        Prompt::new(
            "valores_marca",
            "¿Cuáles son los 3 valores fundamentales de tu marca?",
        )
        .with_label("Valores Fundamentales", "No especificados"),
        Prompt::new(
            "personalidad_marca",
            "Si tu marca fuera una persona, ¿cómo sería? (formal/casual, tradicional/moderna, divertida/seria)",
        )
        .with_label("Personalidad de Marca", "No especificada"),
        Prompt::new(
            "tono_voz",
            "¿Qué tono de comunicación prefieres? (profesional, amigable, inspirador, técnico)",
        )
        .with_label("Tono de Voz", "No especificado"),
        Prompt::new(
            "colores_identidad",
            "¿Qué colores representan mejor tu marca? (máximo 3)",
        )
        .with_label("Colores de Identidad", "No especificados"),
        Prompt::new(
            "estilo_visual",
            "¿Qué estilo visual prefieres? (minimalista, moderno, clásico, audaz)",
        )
        .with_label("Estilo Visual", "No especificado"),
        Prompt::new(
            "objetivo_principal",
            "¿Cuál es tu objetivo principal con esta marca? (ventas, reconocimiento, comunidad, educar)",
        )
        .with_label("Objetivo Principal", "No especificado"),
        Prompt::new(
            "diferenciador",
            "¿Qué hace única a tu marca? ¿Por qué deberían elegirte?",
        )
        .with_label("Diferenciador Único", "No especificado"),
    ];

    QuestionnaireScript {
        title: BRANDING_TITLE.to_string(),
        step_label: "Pregunta".to_string(),
        step_separator: "de".to_string(),
        prompts,
        summary: SummaryTemplate {
            heading: "**¡Cuestionario Completado!**".to_string(),
            intro: "Has completado exitosamente el perfil de branding de tu marca. \
                    Aquí está tu resumen:"
                .to_string(),
            title_key: Some(BRAND_NAME_KEY.to_string()),
            title_fallback: "Tu Marca".to_string(),
            conversation_label: Some("ID de Chat".to_string()),
            closing: "Puedes usar esta información para desarrollar tu identidad de marca, \
                      crear contenido y comunicarte consistentemente con tu audiencia."
                .to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{QuestionnaireEngine, QuestionnaireStep};
    use uuid::Uuid;

    #[test]
    fn test_branding_script_shape() {
        let script = branding_script();
        assert_eq!(script.prompts.len(), 10);
        assert_eq!(script.prompts[0].key, BRAND_NAME_KEY);
        let mut keys: Vec<&str> = script.prompts.iter().map(|p| p.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn test_first_question_text() {
        let mut engine = QuestionnaireEngine::new(branding_script());
        assert_eq!(
            engine.start().unwrap(),
            "**Cuestionario de Branding** (Pregunta 1 de 10)\n\n¿Cómo se llama tu marca?"
        );
    }

    #[test]
    fn test_full_run_summary() {
        let id = Uuid::now_v7();
        let mut engine = QuestionnaireEngine::new(branding_script()).with_conversation_id(id);
        engine.start().unwrap();

        let mut last = None;
        for (i, answer) in ["Aurora", "Café de origen", "", "", "", "", "", "", "", "Tostado propio"]
            .iter()
            .enumerate()
        {
            let step = engine.answer(answer).unwrap();
            if i < 9 {
                assert!(matches!(step, QuestionnaireStep::Next { .. }));
            }
            last = Some(step);
        }

        let Some(QuestionnaireStep::Complete { summary, answers }) = last else {
            panic!("expected completion");
        };
        assert_eq!(answers.get(BRAND_NAME_KEY), Some("Aurora"));
        assert!(summary.starts_with("**¡Cuestionario Completado!**\n\nHas completado exitosamente"));
        assert!(summary.contains("### **Aurora**"));
        assert!(summary.contains("**Oferta de Valor:**\nCafé de origen"));
        assert!(summary.contains("**Cliente Ideal:**\nNo especificado"));
        assert!(summary.contains("**Valores Fundamentales:**\nNo especificados"));
        assert!(summary.contains("**Personalidad de Marca:**\nNo especificada"));
        assert!(summary.contains("**Diferenciador Único:**\nTostado propio"));
        assert!(summary.contains(&format!("**ID de Chat:** `{id}`")));
        assert!(!summary.contains("Nombre de Marca"));
        assert!(summary.ends_with("consistentemente con tu audiencia."));
    }
}
