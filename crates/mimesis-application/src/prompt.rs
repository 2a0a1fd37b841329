//! Renders a persona's prompt template into the messages sent to the chat model.

use mimesis_core::error::{PersonaError, Result};
use mimesis_core::persona::PromptTemplate;
use minijinja::{context, Environment};

/// Rendered system and human messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub question: String,
}

/// minijinja-backed renderer for [`PromptTemplate`]s.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Renders the default directive first, then the system message around
    /// it and the retrieved passages, then the human message.
    pub fn render(
        &self,
        template: &PromptTemplate,
        name: &str,
        passages: &[String],
        question: &str,
    ) -> Result<RenderedPrompt> {
        let default = self.render_part("default", &template.default, context! { name => name })?;
        let system = self.render_part(
            "system",
            &template.system,
            context! {
                name => name,
                default => default,
                context => passages.join("\n\n"),
            },
        )?;
        let question = self.render_part(
            "human",
            &template.human,
            context! { name => name, question => question },
        )?;

        Ok(RenderedPrompt { system, question })
    }

    fn render_part(&self, part: &str, source: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .render_str(source, ctx)
            .map_err(|e| PersonaError::generation(format!("{} prompt template error: {}", part, e)))
    }
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimesis_core::persona::default_prompt_template;

    #[test]
    fn test_render_default_template() {
        let rendered = PromptRenderer::new()
            .render(
                &default_prompt_template(),
                "Alice",
                &["I keep the lighthouse.".to_string(), "I was born in Maine.".to_string()],
                "Where do you live?",
            )
            .unwrap();

        assert!(rendered.system.contains("You are Alice."));
        assert!(rendered.system.contains("I keep the lighthouse.\n\nI was born in Maine."));
        assert!(!rendered.system.contains("{{"));
        assert_eq!(rendered.question, "Where do you live?");
    }

    #[test]
    fn test_no_html_escaping() {
        let template = PromptTemplate {
            system: "{{ context }}".to_string(),
            human: "{{ question }}".to_string(),
            default: String::new(),
        };
        let rendered = PromptRenderer::new()
            .render(&template, "Bob", &["<tag> & \"quotes\"".to_string()], "a < b?")
            .unwrap();
        assert_eq!(rendered.system, "<tag> & \"quotes\"");
        assert_eq!(rendered.question, "a < b?");
    }

    #[test]
    fn test_broken_template_is_generation_error() {
        let template = PromptTemplate {
            system: "{% if %}".to_string(),
            human: "{{ question }}".to_string(),
            default: String::new(),
        };
        let err = PromptRenderer::new()
            .render(&template, "Bob", &[], "hi")
            .unwrap_err();
        assert!(matches!(err, PersonaError::GenerationFailed(_)));
    }
}
