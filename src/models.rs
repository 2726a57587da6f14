use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub id: String,
    pub preview: String,
    pub full_text: String,
    pub book_title: String,
    pub chapter: String,
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub quote_id: String,
    pub book_title: String,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub quote_id: String,
    pub book_title: String,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
    pub context: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            user_message: comment.user_message,
            ai_response: comment.ai_response,
            timestamp: comment.timestamp,
        }
    }
}

/// Result of handling one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Loaded {
        file_name: String,
        title: String,
        quote_count: usize,
    },
    Rejected {
        file_name: String,
        reason: String,
    },
}

impl UploadOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            UploadOutcome::Loaded { file_name, .. } | UploadOutcome::Rejected { file_name, .. } => {
                file_name
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub successful_uploads: Vec<String>,
    pub failed_uploads: Vec<String>,
}

impl UploadReport {
    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Loaded { file_name, .. } => {
                self.successful_uploads.push(file_name.clone())
            }
            UploadOutcome::Rejected { file_name, .. } => self.failed_uploads.push(file_name.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub items_per_page: Option<String>,
    pub books: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub status: &'static str,
    pub feed: Vec<Quote>,
    pub has_more: bool,
    pub next_page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: UploadReport,
    pub feed: Vec<Quote>,
    pub books: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveBookRequest {
    pub book: Option<String>,
}

/// Incoming chat payload. Every field is required; they are optional here so that a missing field
/// becomes a validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub context: Option<String>,
    pub book_title: Option<String>,
    pub quote_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub message: String,
    pub context: String,
    pub book_title: String,
    pub quote_id: String,
}

impl ChatRequest {
    pub fn validate(self) -> Result<ChatPrompt, crate::error::ValidationError> {
        match (self.message, self.context, self.book_title, self.quote_id) {
            (Some(message), Some(context), Some(book_title), Some(quote_id)) => Ok(ChatPrompt {
                message,
                context,
                book_title,
                quote_id,
            }),
            _ => Err(crate::error::ValidationError::new("Missing required fields")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BooksResponse {
    pub books: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveBookResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_requires_every_field() {
        let request = ChatRequest {
            message: Some("hi".to_string()),
            context: Some("ctx".to_string()),
            book_title: Some("Book".to_string()),
            quote_id: None,
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn chat_request_accepts_empty_strings() {
        let request = ChatRequest {
            message: Some(String::new()),
            context: Some("ctx".to_string()),
            book_title: Some("Book".to_string()),
            quote_id: Some("q1".to_string()),
        };
        let prompt = request.validate().unwrap();
        assert_eq!(prompt.quote_id, "q1");
    }

    #[test]
    fn upload_report_splits_outcomes() {
        let mut report = UploadReport::default();
        report.record(&UploadOutcome::Loaded {
            file_name: "a.epub".to_string(),
            title: "A".to_string(),
            quote_count: 3,
        });
        report.record(&UploadOutcome::Rejected {
            file_name: "b.txt".to_string(),
            reason: "unsupported file type".to_string(),
        });

        assert_eq!(report.successful_uploads, vec!["a.epub"]);
        assert_eq!(report.failed_uploads, vec!["b.txt"]);
    }
}
