//! Query-time orchestration over a built corpus.
//!
//! - `search`: embed the question and rank the corpus
//! - `prepare`: `search` plus budgeted context assembly
//! - `answer_question`: `prepare` plus one completion call

use std::sync::Arc;

use serde::Serialize;

use crate::context::{build_token_counter, AssembledContext, ContextAssembler, PromptTemplate, TokenCounter};
use crate::core::config::{AlmanacConfig, RetrievalSettings};
use crate::core::errors::RagError;
use crate::corpus::Corpus;
use crate::embedding::{build_vectorizer, EmbeddingService};
use crate::llm::{build_completion, CompletionProvider};
use crate::retrieval::{self, DistanceMetric, RankedFragment, SearchHit};

/// A completion reply together with the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub prompt: String,
}

pub struct RagEngine {
    corpus: Arc<Corpus>,
    embeddings: EmbeddingService,
    assembler: ContextAssembler,
    template: PromptTemplate,
    completion: Arc<dyn CompletionProvider>,
    metric: DistanceMetric,
    max_context_tokens: usize,
    max_output_tokens: u32,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        corpus: Arc<Corpus>,
        embeddings: EmbeddingService,
        counter: Arc<dyn TokenCounter>,
        completion: Arc<dyn CompletionProvider>,
        retrieval: &RetrievalSettings,
        max_output_tokens: u32,
    ) -> Result<Self, RagError> {
        Ok(Self {
            corpus,
            embeddings,
            assembler: ContextAssembler::new(counter, retrieval.context_separator.clone()),
            template: PromptTemplate::new(retrieval.prompt_template.clone())?,
            completion,
            metric: retrieval.metric,
            max_context_tokens: retrieval.max_context_tokens,
            max_output_tokens,
            top_k: retrieval.top_k,
        })
    }

    /// Wires the configured vectorizer, token counter and completion provider around `corpus`.
    pub fn from_config(config: &AlmanacConfig, corpus: Arc<Corpus>) -> Result<Self, RagError> {
        let vectorizer = build_vectorizer(&config.embedding)?;
        let embeddings = EmbeddingService::from_settings(vectorizer, &config.embedding);
        let counter = build_token_counter(&config.tokenizer, &config.completion.model)?;
        let completion = build_completion(&config.completion)?;

        Self::new(
            corpus,
            embeddings,
            counter,
            completion,
            &config.retrieval,
            config.completion.max_output_tokens,
        )
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn default_top_k(&self) -> usize {
        self.top_k
    }

    /// The `top_k` nearest fragments to `question`.
    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<SearchHit>, RagError> {
        let query = self.embeddings.embed_one(question).await?;
        let ranked = retrieval::top_k(&query, &self.corpus, self.metric, top_k)?;
        Ok(ranked.iter().map(SearchHit::from).collect())
    }

    /// Ranks the whole corpus and packs it under the context budget. No completion is requested.
    pub async fn prepare(&self, question: &str) -> Result<AssembledContext, RagError> {
        let query = self.embeddings.embed_one(question).await?;
        let ranked: Vec<RankedFragment<'_>> = retrieval::rank(&query, &self.corpus, self.metric)?;
        self.assembler
            .assemble(question, &ranked, &self.template, self.max_context_tokens)
    }

    /// Answers `question` with exactly one completion call.
    ///
    /// A completion failure is logged and yields an empty answer with the attempted prompt.
    /// Every other failure propagates.
    pub async fn answer_question(&self, question: &str) -> Result<Answer, RagError> {
        let assembled = self.prepare(question).await?;
        tracing::info!(
            fragments = assembled.fragments.len(),
            token_count = assembled.token_count,
            provider = self.completion.name(),
            "Requesting completion"
        );

        match self
            .completion
            .complete(&assembled.prompt, self.max_output_tokens)
            .await
        {
            Ok(answer) => Ok(Answer {
                answer,
                prompt: assembled.prompt,
            }),
            Err(RagError::Completion(reason)) => {
                tracing::warn!(provider = self.completion.name(), "Completion failed: {}", reason);
                Ok(Answer {
                    answer: String::new(),
                    prompt: assembled.prompt,
                })
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WhitespaceTokenCounter;
    use crate::corpus::Preprocessor;
    use crate::embedding::{HashingVectorizer, Vectorizer};
    use crate::llm::CannedCompletion;
    use crate::rag::CorpusBuilder;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LINES: [&str; 5] = [
        "January 1 – Croatia adopts the euro as its currency.",
        "March 10 – Silicon Valley Bank collapses.",
        "Regulators close the bank within two days.",
        "May 6 – The coronation of Charles III takes place in London.",
        "July 7 – Heavy monsoon rains flood northern India.",
    ];

    struct CountingCompletion {
        calls: AtomicUsize,
        reply: Result<String, fn() -> RagError>,
    }

    #[async_trait]
    impl CompletionProvider for CountingCompletion {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(&self, _prompt: &str, _max_output_tokens: u32) -> Result<String, RagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    struct DownVectorizer;

    #[async_trait]
    impl Vectorizer for DownVectorizer {
        fn model_name(&self) -> &str {
            "down"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::Vectorization("service unavailable".to_string()))
        }
    }

    fn settings(max_context_tokens: usize) -> RetrievalSettings {
        RetrievalSettings {
            max_context_tokens,
            prompt_template: "Events:\n{context}\nQ: {question}\nA:".to_string(),
            context_separator: "\n".to_string(),
            ..RetrievalSettings::default()
        }
    }

    async fn engine(completion: Arc<dyn CompletionProvider>, max_context_tokens: usize) -> RagEngine {
        let embeddings = EmbeddingService::new(Arc::new(HashingVectorizer::new(256)), 2, 2);
        let corpus = CorpusBuilder::new(Preprocessor::default(), embeddings.clone())
            .build(LINES)
            .await
            .expect("build");
        RagEngine::new(
            Arc::new(corpus),
            embeddings,
            Arc::new(WhitespaceTokenCounter),
            completion,
            &settings(max_context_tokens),
            50,
        )
        .expect("engine")
    }

    #[tokio::test]
    async fn search_puts_the_matching_fragment_first() {
        let engine = engine(Arc::new(CannedCompletion::new("")), 1_000).await;

        let hits = engine
            .search("Croatia adopts the euro as its currency", 2)
            .await
            .expect("search");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[0].date_tag.as_deref(), Some("January 1"));
    }

    #[tokio::test]
    async fn answer_returns_reply_and_prompt_from_one_call() {
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Ok("On January 1.".to_string()),
        });
        let engine = engine(completion.clone(), 1_000).await;

        let answer = engine
            .answer_question("When did Croatia adopt the euro?")
            .await
            .expect("answer");

        assert_eq!(answer.answer, "On January 1.");
        assert!(answer.prompt.starts_with("Events:\nJanuary 1 – Croatia adopts the euro"));
        assert!(answer.prompt.ends_with("Q: When did Croatia adopt the euro?\nA:"));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completion_failure_yields_empty_answer_with_prompt() {
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Err(|| RagError::Completion("rate limited".to_string())),
        });
        let engine = engine(completion.clone(), 1_000).await;

        let answer = engine.answer_question("What happened in May?").await.expect("swallowed");

        assert_eq!(answer.answer, "");
        assert!(answer.prompt.contains("Q: What happened in May?"));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_completion_errors_from_the_provider_propagate() {
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Err(|| RagError::Config("bad provider".to_string())),
        });
        let engine = engine(completion, 1_000).await;

        let err = engine.answer_question("anything").await.unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[tokio::test]
    async fn vectorization_failure_at_query_time_propagates() {
        let engine = RagEngine::new(
            Arc::new(Corpus::empty()),
            EmbeddingService::new(Arc::new(DownVectorizer), 1, 1),
            Arc::new(WhitespaceTokenCounter),
            Arc::new(CannedCompletion::new("unused")),
            &settings(1_000),
            50,
        )
        .expect("engine");

        let err = engine.answer_question("anything").await.unwrap_err();
        assert!(matches!(err, RagError::Vectorization(_)));
    }

    #[tokio::test]
    async fn prepare_stays_under_the_budget() {
        let roomy = engine(Arc::new(CannedCompletion::new("")), 1_000).await;
        let full = roomy.prepare("What happened?").await.expect("prepare");
        assert_eq!(full.fragments.len(), LINES.len());

        let tight = engine(Arc::new(CannedCompletion::new("")), 20).await;
        let assembled = tight.prepare("What happened?").await.expect("prepare");
        assert!(assembled.fragments.len() < LINES.len());
        assert!(assembled.token_count < 20);
    }

    #[tokio::test]
    async fn query_width_mismatch_is_reported() {
        let embeddings = EmbeddingService::new(Arc::new(HashingVectorizer::new(8)), 2, 1);
        let corpus = Corpus::new(
            vec![crate::corpus::Fragment::from_tagged_text("May 4 – A", " – ")],
            vec![vec![1.0, 0.0, 0.0]],
        )
        .expect("corpus");
        let engine = RagEngine::new(
            Arc::new(corpus),
            embeddings,
            Arc::new(WhitespaceTokenCounter),
            Arc::new(CannedCompletion::new("")),
            &settings(1_000),
            50,
        )
        .expect("engine");

        let err = engine.search("A", 1).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 8 }));
    }
}
