use std::sync::Arc;

use serde::Serialize;

use super::prompt::PromptTemplate;
use super::tokens::TokenCounter;
use crate::core::config::defaults::CONTEXT_SEPARATOR;
use crate::core::errors::RagError;
use crate::retrieval::RankedFragment;

/// The outcome of packing ranked fragments into a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledContext {
    /// Accepted fragment texts joined with the context separator.
    pub context: String,
    /// The template rendered with `context` and the question.
    pub prompt: String,
    /// Accepted fragment texts, nearest first.
    pub fragments: Vec<String>,
    /// Template, question, accepted fragments and the separators between them.
    pub token_count: usize,
}

/// Packs ranked fragments under a token ceiling.
///
/// Fragments are taken nearest first while the running total stays strictly below the budget.
/// The first fragment that would reach or exceed it ends assembly; later, smaller fragments are
/// not considered.
pub struct ContextAssembler {
    counter: Arc<dyn TokenCounter>,
    separator: String,
}

impl ContextAssembler {
    pub fn new(counter: Arc<dyn TokenCounter>, separator: impl Into<String>) -> Self {
        Self {
            counter,
            separator: separator.into(),
        }
    }

    pub fn with_default_separator(counter: Arc<dyn TokenCounter>) -> Self {
        Self::new(counter, CONTEXT_SEPARATOR)
    }

    pub fn counter(&self) -> &Arc<dyn TokenCounter> {
        &self.counter
    }

    pub fn assemble(
        &self,
        question: &str,
        ranked: &[RankedFragment<'_>],
        template: &PromptTemplate,
        max_token_count: usize,
    ) -> Result<AssembledContext, RagError> {
        let mut running =
            self.counter.count_tokens(template.as_str())? + self.counter.count_tokens(question)?;
        let separator_cost = self.counter.count_tokens(&self.separator)?;
        let mut fragments = Vec::new();

        for candidate in ranked {
            let joint = if fragments.is_empty() { 0 } else { separator_cost };
            let projected = running + joint + self.counter.count_tokens(&candidate.fragment.text)?;
            if projected >= max_token_count {
                tracing::debug!(
                    index = candidate.index,
                    projected,
                    max_token_count,
                    "Context budget reached"
                );
                break;
            }
            fragments.push(candidate.fragment.text.clone());
            running = projected;
        }

        let context = fragments.join(&self.separator);
        let prompt = template.render(&context, question);
        tracing::debug!(
            accepted = fragments.len(),
            offered = ranked.len(),
            token_count = running,
            "Assembled context"
        );

        Ok(AssembledContext {
            context,
            prompt,
            fragments,
            token_count: running,
        })
    }
}
