use crate::core::config::defaults::{CONTEXT_SLOT, PROMPT_TEMPLATE, QUESTION_SLOT};
use crate::core::errors::RagError;

/// A prompt with a `{context}` slot followed by a `{question}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    context_at: usize,
    question_at: usize,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, RagError> {
        let template = template.into();
        let context_at = template
            .find(CONTEXT_SLOT)
            .ok_or_else(|| RagError::Config(format!("prompt template lacks {}", CONTEXT_SLOT)))?;
        let question_at = template[context_at + CONTEXT_SLOT.len()..]
            .find(QUESTION_SLOT)
            .map(|offset| context_at + CONTEXT_SLOT.len() + offset)
            .ok_or_else(|| {
                RagError::Config(format!(
                    "prompt template lacks {} after {}",
                    QUESTION_SLOT, CONTEXT_SLOT
                ))
            })?;

        Ok(Self {
            template,
            context_at,
            question_at,
        })
    }

    /// The raw template text, slots included.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fills both slots in one pass; slot-like text inside `context` is left untouched.
    pub fn render(&self, context: &str, question: &str) -> String {
        let head = &self.template[..self.context_at];
        let middle = &self.template[self.context_at + CONTEXT_SLOT.len()..self.question_at];
        let tail = &self.template[self.question_at + QUESTION_SLOT.len()..];

        let mut prompt = String::with_capacity(
            head.len() + context.len() + middle.len() + question.len() + tail.len(),
        );
        prompt.push_str(head);
        prompt.push_str(context);
        prompt.push_str(middle);
        prompt.push_str(question);
        prompt.push_str(tail);
        prompt
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        let context_at = PROMPT_TEMPLATE.find(CONTEXT_SLOT).unwrap_or(0);
        let question_at = PROMPT_TEMPLATE.find(QUESTION_SLOT).unwrap_or(0);
        Self {
            template: PROMPT_TEMPLATE.to_string(),
            context_at,
            question_at,
        }
    }
}
