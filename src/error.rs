use thiserror::Error;

/// A request the caller can fix by sending different input.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An operation referenced something (a book title) that is not loaded.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotFoundError(pub String);

/// A single document could not be turned into quotes. Reported per file; never fatal for a batch.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is not a valid EPUB archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("EPUB is missing {0}")]
    MissingEntry(String),

    #[error("failed to parse {path}: {message}")]
    Xml { path: String, message: String },

    #[error("EPUB container does not declare a package document")]
    MissingPackage,

    #[error("section {path} is not valid UTF-8")]
    Encoding { path: String },

    #[error("document has no title metadata")]
    MissingTitle,
}

/// The generation service could not produce a reply.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Failure of a chat exchange: either the reply could not be generated or it could not be stored.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("failed to store comment: {0}")]
    Storage(#[source] anyhow::Error),
}
