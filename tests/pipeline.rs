use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use almanac::context::WhitespaceTokenCounter;
use almanac::core::config::RetrievalSettings;
use almanac::corpus::{CorpusSource, CorpusStore, CsvCorpusStore, Preprocessor};
use almanac::embedding::{EmbeddingService, HashingVectorizer};
use almanac::llm::{CannedCompletion, CompletionProvider};
use almanac::rag::{CorpusBuilder, RagEngine};
use almanac::RagError;

struct UnavailableCompletion;

#[async_trait]
impl CompletionProvider for UnavailableCompletion {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _prompt: &str, _max_output_tokens: u32) -> Result<String, RagError> {
        Err(RagError::Completion("503 Service Unavailable".to_string()))
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/events_2023.txt")
}

fn embeddings() -> EmbeddingService {
    EmbeddingService::new(Arc::new(HashingVectorizer::new(256)), 3, 2)
}

fn retrieval(max_context_tokens: usize) -> RetrievalSettings {
    RetrievalSettings {
        max_context_tokens,
        ..RetrievalSettings::default()
    }
}

#[tokio::test]
async fn build_persist_reload_and_answer() {
    let lines = CorpusSource::File(fixture())
        .read_lines(5)
        .await
        .expect("fixture lines");

    let corpus = CorpusBuilder::new(Preprocessor::default(), embeddings())
        .build(&lines)
        .await
        .expect("build");

    assert_eq!(corpus.len(), 8);
    let texts: Vec<&str> = corpus.fragments().iter().map(|f| f.text.as_str()).collect();
    assert!(texts.contains(&"February 6 – The death toll exceeds 50,000 people."));
    assert!(texts.contains(&"August 23 – India becomes the fourth country to soft-land on the Moon."));
    assert!(corpus.fragments().iter().all(|f| f.date_tag.is_some()));

    let dir = tempfile::tempdir().expect("tempdir");
    let store = CsvCorpusStore::new(dir.path().join("corpus.csv"));
    let handle = store.save(&corpus).expect("save");
    let reloaded = store.load(&handle).expect("load");
    assert_eq!(reloaded, corpus);

    let engine = RagEngine::new(
        Arc::new(reloaded),
        embeddings(),
        Arc::new(WhitespaceTokenCounter),
        Arc::new(CannedCompletion::new("It landed on August 23.")),
        &retrieval(3_500),
        300,
    )
    .expect("engine");

    let hits = engine
        .search("Chandrayaan-3 lands near the lunar south pole", 3)
        .await
        .expect("search");
    assert_eq!(hits[0].date_tag.as_deref(), Some("August 23"));
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let answer = engine
        .answer_question("When did Chandrayaan-3 land near the lunar south pole?")
        .await
        .expect("answer");
    assert_eq!(answer.answer, "It landed on August 23.");
    assert!(answer.prompt.contains("August 23 – Chandrayaan-3 lands near the lunar south pole."));
}

#[tokio::test]
async fn tight_budget_keeps_only_the_nearest_fragments() {
    let lines = CorpusSource::File(fixture())
        .read_lines(5)
        .await
        .expect("fixture lines");
    let corpus = CorpusBuilder::new(Preprocessor::default(), embeddings())
        .build(&lines)
        .await
        .expect("build");

    let counter = WhitespaceTokenCounter;
    let template = RetrievalSettings::default().prompt_template;
    let question = "Which bank collapsed in March?";
    let overhead = {
        use almanac::context::TokenCounter;
        counter.count_tokens(&template).expect("count") + counter.count_tokens(question).expect("count")
    };

    let engine = RagEngine::new(
        Arc::new(corpus),
        embeddings(),
        Arc::new(counter),
        Arc::new(CannedCompletion::new("")),
        &retrieval(overhead + 20),
        300,
    )
    .expect("engine");

    let assembled = engine.prepare(question).await.expect("prepare");
    assert!(assembled.token_count < overhead + 20);
    assert!(!assembled.fragments.is_empty());
    assert!(assembled.fragments.len() < 8);
    assert_eq!(
        assembled.fragments[0],
        "March 10 – Silicon Valley Bank collapses in the largest bank failure since 2008."
    );

    let starved = RagEngine::new(
        Arc::new(engine.corpus().clone()),
        embeddings(),
        Arc::new(WhitespaceTokenCounter),
        Arc::new(CannedCompletion::new("")),
        &retrieval(overhead),
        300,
    )
    .expect("engine");
    let assembled = starved.prepare(question).await.expect("prepare");
    assert!(assembled.fragments.is_empty());
    assert!(assembled.prompt.contains("Question: Which bank collapsed in March?"));
}

#[tokio::test]
async fn completion_outage_returns_empty_answer_with_prompt() {
    let lines = CorpusSource::File(fixture())
        .read_lines(5)
        .await
        .expect("fixture lines");
    let corpus = CorpusBuilder::new(Preprocessor::default(), embeddings())
        .build(&lines)
        .await
        .expect("build");

    let engine = RagEngine::new(
        Arc::new(corpus),
        embeddings(),
        Arc::new(WhitespaceTokenCounter),
        Arc::new(UnavailableCompletion),
        &retrieval(3_500),
        300,
    )
    .expect("engine");

    let answer = engine
        .answer_question("What happened at Westminster Abbey?")
        .await
        .expect("completion failures are not raised");

    assert_eq!(answer.answer, "");
    assert!(answer.prompt.contains("May 6 – The coronation of Charles III"));
}
