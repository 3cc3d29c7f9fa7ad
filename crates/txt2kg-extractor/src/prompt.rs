//! LLM prompt construction for triple extraction

use txt2kg_llm::ChatMessage;

/// Placeholder replaced by the chunk text in extraction templates
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Default system prompt: asks for a bare JSON array of triples
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a knowledge graph builder that extracts structured information from text.
Extract subject-predicate-object triples from the following text.

Guidelines:
- Extract only factual triples present in the text
- Normalize entity names to their canonical form
- Return ONLY a JSON array with objects containing "subject", "predicate", "object" fields
- Each triple should represent a clear relationship between two entities
- Focus on the most important relationships in the text
- Do not include any explanatory text, just the JSON array
- Example format: [{"subject": "John", "predicate": "works_at", "object": "Microsoft"}]"#;

/// Default user prompt template
pub const DEFAULT_EXTRACTION_PROMPT: &str = "Extract triples from this text:\n\n{text}";

/// Builds the chat messages sent for each chunk
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBuilder {
    system_prompt: String,
    extraction_template: String,
    custom: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            extraction_template: DEFAULT_EXTRACTION_PROMPT.to_string(),
            custom: false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl PromptBuilder {
    /// Create a builder with the default prompts
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system prompt; blank values keep the default
    pub fn with_system_prompt(mut self, prompt: Option<&str>) -> Self {
        if let Some(prompt) = non_blank(prompt) {
            self.system_prompt = prompt.to_string();
            self.custom = true;
        }
        self
    }

    /// Replace the user prompt template; blank values keep the default
    ///
    /// A template without a `{text}` placeholder gets the text appended.
    pub fn with_extraction_prompt(mut self, template: Option<&str>) -> Self {
        if let Some(template) = non_blank(template) {
            self.extraction_template = if template.contains(TEXT_PLACEHOLDER) {
                template.to_string()
            } else {
                format!("{}\n\nText:\n{}", template, TEXT_PLACEHOLDER)
            };
            self.custom = true;
        }
        self
    }

    /// True when either prompt was overridden
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Messages for one chunk
    pub fn build(&self, chunk: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(self.extraction_template.replace(TEXT_PLACEHOLDER, chunk)),
        ]
    }
}
