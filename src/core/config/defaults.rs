//! Default values for every configuration field.

/// Separator between a fragment's date tag and its body (an en dash with spaces).
pub const DATE_SEPARATOR: &str = " – ";

/// Lines starting with this marker are section headings and never become fragments.
pub const SECTION_MARKER: &str = "==";

/// Rule placed between fragments inside the assembled context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n###\n\n";

pub const CONTEXT_SLOT: &str = "{context}";
pub const QUESTION_SLOT: &str = "{question}";

pub const PROMPT_TEMPLATE: &str = "Answer the question as truthfully as possible using the dated events below. \
If the answer is not contained within the events, say \"I don't know.\"\n\n\
Events:\n{context}\n\n\
Question: {question}\n\
Answer:";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const COMPLETION_MODEL: &str = "gpt-4o-mini";

pub const EMBEDDING_BATCH_SIZE: usize = 100;
pub const EMBEDDING_CONCURRENCY: usize = 1;
pub const EMBEDDING_TIMEOUT_SECS: u64 = 60;
pub const HASHING_DIMENSIONS: usize = 256;

pub const MAX_OUTPUT_TOKENS: u32 = 300;
pub const COMPLETION_TIMEOUT_SECS: u64 = 120;

pub const MAX_CONTEXT_TOKENS: usize = 3500;
pub const SEARCH_TOP_K: usize = 5;

pub const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
pub const FETCH_TIMEOUT_SECS: u64 = 30;

pub const SERVER_HOST: &str = "127.0.0.1";
