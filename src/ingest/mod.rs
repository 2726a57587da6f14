pub mod classify;
pub mod epub;
pub mod markup;
pub mod segment;

use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::corpus::CorpusStore;
use crate::error::ExtractionError;
use crate::models::{Quote, UploadOutcome};

pub use classify::{HeuristicRule, QuoteClassifier};
pub use epub::EpubBook;
pub use segment::Segmenter;

/// One content section of a book in reading order.
#[derive(Debug, Clone)]
pub struct Section {
    pub heading: Option<String>,
    pub markup: String,
}

/// A structured, titled document. `sections` consumes the document: it can be walked once.
pub trait Document {
    type Sections: Iterator<Item = Result<Section, ExtractionError>>;

    fn metadata(&self, key: &str) -> Option<String>;

    fn sections(self) -> Self::Sections;
}

#[derive(Debug, Clone)]
pub struct ExtractedBook {
    pub title: String,
    pub quotes: Vec<Quote>,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteExtractor {
    segmenter: Segmenter,
    classifier: QuoteClassifier,
}

impl QuoteExtractor {
    pub fn new(segmenter: Segmenter, classifier: QuoteClassifier) -> Self {
        Self {
            segmenter,
            classifier,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Segmenter::new(config.quotes.min_len),
            QuoteClassifier::new(config.quotes.min_len, config.quotes.max_len),
        )
    }

    pub fn extract<D: Document>(&self, document: D) -> Result<ExtractedBook, ExtractionError> {
        let title = document
            .metadata("title")
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or(ExtractionError::MissingTitle)?;

        let mut quotes = Vec::new();
        for (i, section) in document.sections().enumerate() {
            let section = section?;
            let chapter = section
                .heading
                .unwrap_or_else(|| format!("Chapter {}", i + 1));

            let text = markup::normalize_text(&markup::plain_text(&section.markup));
            let sentences = self.segmenter.segment(&text);

            for (j, sentence) in sentences.iter().enumerate() {
                if !self.classifier.is_interesting(sentence) {
                    continue;
                }
                quotes.push(Quote {
                    id: Uuid::new_v4().to_string(),
                    preview: sentence.clone(),
                    full_text: surrounding_context(&sentences, j),
                    book_title: title.clone(),
                    chapter: chapter.clone(),
                    position: format!("Part {}, Paragraph {}", i + 1, j + 1),
                });
            }
        }

        Ok(ExtractedBook { title, quotes })
    }

    pub fn extract_file(&self, path: &Path) -> Result<ExtractedBook, ExtractionError> {
        self.extract(EpubBook::open(path)?)
    }
}

fn surrounding_context(sentences: &[String], index: usize) -> String {
    let start = index.saturating_sub(1);
    let end = (index + 2).min(sentences.len());
    sentences[start..end].join(" ")
}

/// Stores uploaded files and loads the quotes they contain into the corpus, one file at a time.
#[derive(Clone)]
pub struct Ingestor {
    upload_dir: PathBuf,
    extractor: QuoteExtractor,
    corpus: CorpusStore,
}

impl Ingestor {
    pub fn new(config: &AppConfig, extractor: QuoteExtractor, corpus: CorpusStore) -> Self {
        Self {
            upload_dir: config.upload_dir(),
            extractor,
            corpus,
        }
    }

    pub async fn ingest_upload(&self, file_name: &str, bytes: &[u8]) -> UploadOutcome {
        let Some(safe_name) = sanitize_file_name(file_name) else {
            return rejected(file_name, "unsupported file type");
        };

        let path = self.upload_dir.join(&safe_name);
        if let Err(err) = self.save(&path, bytes).await {
            tracing::error!("failed to store upload {}: {:#}", file_name, err);
            return rejected(file_name, &err.to_string());
        }

        tracing::info!("processing uploaded file: {}", file_name);
        let extractor = self.extractor.clone();
        let extraction =
            tokio::task::spawn_blocking(move || extractor.extract_file(&path)).await;

        match extraction {
            Ok(Ok(book)) => {
                let quote_count = book.quotes.len();
                tracing::info!(
                    "successfully processed {}: {} quotes extracted",
                    book.title,
                    quote_count
                );
                self.corpus.add(&book.title, book.quotes);
                UploadOutcome::Loaded {
                    file_name: file_name.to_string(),
                    title: book.title,
                    quote_count,
                }
            }
            Ok(Err(err)) => {
                tracing::error!("failed to process {}: {}", file_name, err);
                rejected(file_name, &err.to_string())
            }
            Err(err) => {
                tracing::error!("extraction task for {} panicked: {}", file_name, err);
                rejected(file_name, "extraction task failed")
            }
        }
    }

    async fn save(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("failed to create {}", self.upload_dir.display()))?;
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn rejected(file_name: &str, reason: &str) -> UploadOutcome {
    UploadOutcome::Rejected {
        file_name: file_name.to_string(),
        reason: reason.to_string(),
    }
}

/// Final path component of a client-supplied name, if it names an `.epub` file.
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let name = file_name.rsplit(['/', '\\']).next()?.trim();
    let is_epub = Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("epub"))
        .unwrap_or(false);
    if !is_epub || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}
