//! Context management: token counting, prompt templates and budgeted assembly.

mod assembler;
mod prompt;
mod tokens;

pub use assembler::{AssembledContext, ContextAssembler};
pub use prompt::PromptTemplate;
pub use tokens::{
    build_token_counter, EstimateTokenCounter, HuggingFaceTokenCounter, TiktokenTokenCounter, TokenCounter,
    WhitespaceTokenCounter,
};
