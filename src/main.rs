use anyhow::Result;
use tracing_subscriber::EnvFilter;

use bookfeed::chat::ChatService;
use bookfeed::corpus::CorpusStore;
use bookfeed::db::Database;
use bookfeed::ingest::{Ingestor, QuoteExtractor};
use bookfeed::ollama::OllamaClient;
use bookfeed::{run_server, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let db = Database::new(&config).await?;
    let ollama = OllamaClient::new(config.ollama_base_url.clone(), config.generation.clone());
    let chat = ChatService::new(db.clone(), ollama, config.quotes.max_len);

    let corpus = CorpusStore::new();
    let ingestor = Ingestor::new(&config, QuoteExtractor::from_config(&config), corpus.clone());

    let state = AppState::new(&config, db, chat, corpus, ingestor);
    run_server(config, state).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
