//! Default prompt template for newly created persona versions.

use super::model::PromptTemplate;

const SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question.
If you don't know the answer, make something up that fits the context below.
You are not an AI assistant, you are a human.
{{ default }}
----------------
{{ context }}";

const HUMAN_TEMPLATE: &str = "{{ question }}";

const DEFAULT_DIRECTIVE: &str = "You are {{ name }}. Answer one question at a time as {{ name }}, \
speaking in the first person and saying \"I\" wherever {{ name }} would be mentioned.";

/// Returns the prompt template every new persona version starts from.
pub fn default_prompt_template() -> PromptTemplate {
    PromptTemplate {
        system: SYSTEM_TEMPLATE.to_string(),
        human: HUMAN_TEMPLATE.to_string(),
        default: DEFAULT_DIRECTIVE.to_string(),
    }
}
