use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::Router;
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use almanac::core::config::{AppPaths, ConfigService};
use almanac::core::logging;
use almanac::corpus::{CorpusSource, CorpusStore, CsvCorpusStore, Preprocessor};
use almanac::embedding::{build_vectorizer, EmbeddingService};
use almanac::rag::CorpusBuilder;
use almanac::server;
use almanac::state::{resolve_corpus_path, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "almanac",
    version,
    about = "Answer questions about dated events with retrieval-augmented prompts"
)]
struct Cli {
    /// Configuration file to use instead of the discovered config.yml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preprocess and embed a timeline, then persist it as CSV
    Build(BuildArgs),
    /// Answer a question from the persisted corpus
    Ask(AskArgs),
    /// Print the fragments nearest to a query
    Search(SearchArgs),
    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Local text file, one event per line
    #[arg(long, conflicts_with_all = ["url", "wikipedia"])]
    input: Option<PathBuf>,

    /// Web page to fetch and strip to text
    #[arg(long, conflicts_with = "wikipedia")]
    url: Option<String>,

    /// Wikipedia article title, e.g. "2022"
    #[arg(long)]
    wikipedia: Option<String>,

    /// Where to write the corpus CSV
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AskArgs {
    question: String,

    /// Corpus CSV to load
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Print the prompt sent to the completion model
    #[arg(long, default_value_t = false)]
    show_prompt: bool,

    /// Only print the assembled prompt (skip the completion call)
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,

    /// Number of fragments to print
    #[arg(long)]
    top_k: Option<usize>,

    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    /// Port to bind; 0 picks a free port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let mut config = ConfigService::new(paths);
    if let Some(path) = cli.config {
        config = config.with_config_path(path);
    }

    match cli.command {
        Command::Build(args) => build(&config, args).await,
        Command::Ask(args) => ask(&config, args).await,
        Command::Search(args) => search(&config, args).await,
        Command::Serve(args) => serve(&config, args).await,
    }
}

async fn build(service: &ConfigService, args: BuildArgs) -> anyhow::Result<()> {
    let config = service.load().context("Failed to load configuration")?;

    let source = if let Some(path) = args.input {
        CorpusSource::File(path)
    } else if let Some(url) = args.url {
        CorpusSource::Url(url)
    } else if let Some(title) = args.wikipedia {
        CorpusSource::Wikipedia {
            api_url: config.corpus.wikipedia_api.clone(),
            title,
        }
    } else {
        CorpusSource::from_settings(&config.corpus).ok_or_else(|| {
            anyhow!("No corpus source: pass --input, --url or --wikipedia, or set corpus.source_url")
        })?
    };

    let lines = source
        .read_lines(config.corpus.fetch_timeout_secs)
        .await
        .with_context(|| format!("Failed to read {}", source))?;

    let vectorizer = build_vectorizer(&config.embedding)?;
    let embeddings = EmbeddingService::from_settings(vectorizer, &config.embedding);
    let builder = CorpusBuilder::new(Preprocessor::from_settings(&config.corpus), embeddings);
    let corpus = builder
        .build(&lines)
        .await
        .context("Failed to build corpus")?;

    let out = resolve_corpus_path(&config, service.paths(), args.out);
    let saved = CsvCorpusStore::new(out)
        .save(&corpus)
        .context("Failed to save corpus")?;

    println!(
        "Wrote {} fragments ({} dimensions) to {}",
        corpus.len(),
        corpus.dimensions(),
        saved.display()
    );
    Ok(())
}

async fn ask(service: &ConfigService, args: AskArgs) -> anyhow::Result<()> {
    let state = AppState::initialize(service, args.corpus)?;

    if args.dry_run {
        let assembled = state.engine.prepare(&args.question).await?;
        println!("{}", assembled.prompt);
        return Ok(());
    }

    let answer = state.engine.answer_question(&args.question).await?;
    if args.show_prompt {
        println!("--- Prompt ---\n{}\n--- Answer ---", answer.prompt);
    }
    println!("{}", answer.answer);
    Ok(())
}

async fn search(service: &ConfigService, args: SearchArgs) -> anyhow::Result<()> {
    let state = AppState::initialize(service, args.corpus)?;
    let top_k = args.top_k.unwrap_or_else(|| state.engine.default_top_k());

    for hit in state.engine.search(&args.query, top_k).await? {
        println!("{:.4}\t{}", hit.distance, hit.text);
    }
    Ok(())
}

async fn serve(service: &ConfigService, args: ServeArgs) -> anyhow::Result<()> {
    let state = AppState::initialize(service, args.corpus)?;

    let host = args
        .host
        .unwrap_or_else(|| state.config.server.host.clone());
    let port = args.port.unwrap_or(state.config.server.port);
    let bind_addr = format!("{}:{}", host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("ALMANAC_PORT={}", addr.port());
    tracing::info!(fragments = state.engine.corpus().len(), "Listening on {}", addr);

    let app: Router = server::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
