use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookfeed::config::AppConfig;
use bookfeed::corpus::CorpusStore;
use bookfeed::feed::assemble;
use bookfeed::ingest::QuoteExtractor;

#[derive(Parser, Debug)]
#[command(name = "extract")]
#[command(about = "Extract quotable sentences from EPUB files without starting the server")]
struct Cli {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Print every extracted quote as a JSON array on stdout. Progress lines go to stderr.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Print a shuffled sample of this many quotes after the summary.
    #[arg(long, default_value_t = 0)]
    sample: usize,
    #[arg(long)]
    min_len: Option<usize>,
    #[arg(long)]
    max_len: Option<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(min_len) = cli.min_len {
        config.quotes.min_len = min_len;
    }
    if let Some(max_len) = cli.max_len {
        config.quotes.max_len = max_len;
    }

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let failures = run(&cli, &config, &mut stdout.lock(), &mut stderr.lock())?;

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Extracts every file in `cli.files` and returns how many failed. With `--json` only the quote
/// array is written to `out` and status lines go to `err`.
fn run<'a>(cli: &Cli, config: &AppConfig, out: &'a mut dyn Write, err: &'a mut dyn Write) -> Result<usize> {
    let extractor = QuoteExtractor::from_config(config);
    let corpus = CorpusStore::new();
    let mut failures = 0usize;

    for path in &cli.files {
        match extractor.extract_file(path) {
            Ok(book) => {
                let status = if cli.json { &mut *err } else { &mut *out };
                writeln!(
                    status,
                    "[ok] {} -> \"{}\" quotes={}",
                    path.display(),
                    book.title,
                    book.quotes.len()
                )?;
                corpus.add(&book.title, book.quotes);
            }
            Err(extract_err) => {
                failures += 1;
                writeln!(err, "[failed] {}: {}", path.display(), extract_err)?;
            }
        }
    }

    if cli.json {
        let quotes = assemble(&corpus, 0, corpus.quote_count().max(1), None);
        writeln!(out, "{}", serde_json::to_string_pretty(&quotes)?)?;
    } else if cli.sample > 0 {
        for quote in assemble(&corpus, 0, cli.sample, None) {
            writeln!(
                out,
                "\n{} ({}, {})\n  {}",
                quote.book_title, quote.chapter, quote.position, quote.preview
            )?;
        }
    }

    let summary = if cli.json { &mut *err } else { &mut *out };
    writeln!(
        summary,
        "Extraction complete. books={} quotes={} failed={}",
        corpus.titles().len(),
        corpus.quote_count(),
        failures
    )?;

    Ok(failures)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
