use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use askama::Template;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::corpus::CorpusStore;
use crate::db::Database;
use crate::error::{ChatError, NotFoundError, ValidationError};
use crate::feed::{assemble, parse_title_filter};
use crate::ingest::Ingestor;
use crate::models::{
    BooksResponse, ChatReply, ChatRequest, CommentView, CommentsResponse, FeedQuery, FeedResponse,
    RemoveBookRequest, RemoveBookResponse, UploadReport, UploadResponse,
};

#[derive(Clone)]
pub struct AppState {
    db: Database,
    chat: ChatService,
    corpus: CorpusStore,
    ingestor: Ingestor,
    static_dir: PathBuf,
    items_per_page: usize,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        db: Database,
        chat: ChatService,
        corpus: CorpusStore,
        ingestor: Ingestor,
    ) -> Self {
        Self {
            db,
            chat,
            corpus,
            ingestor,
            static_dir: config.static_dir.clone(),
            items_per_page: config.items_per_page,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_page))
        .route("/upload", post(upload_handler))
        .route("/feed", get(feed_handler))
        .route("/books", get(books_handler))
        .route("/remove-book", post(remove_book_handler))
        .route("/chat", post(chat_handler))
        .route("/comments/:quote_id", get(comments_handler))
        .nest_service("/static", assets)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: AppConfig, state: AppState) -> Result<()> {
    tokio::fs::create_dir_all(config.upload_dir()).await?;

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let template = IndexTemplate {
        books: state.corpus.titles().into_iter().collect(),
        items_per_page: state.items_per_page,
    };
    let body = template.render()?;

    Ok(Html(body))
}

async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ValidationError::new("No file part"))?;

    let mut report = UploadReport::default();
    let mut saw_files = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::from_multipart(err, state.max_upload_bytes))?
    {
        if field.name() != Some("files") {
            continue;
        }
        saw_files = true;

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::from_multipart(err, state.max_upload_bytes))?;

        let outcome = state.ingestor.ingest_upload(&file_name, &bytes).await;
        if let crate::models::UploadOutcome::Rejected { reason, .. } = &outcome {
            tracing::warn!("upload {} rejected: {}", outcome.file_name(), reason);
        }
        report.record(&outcome);
    }

    if !saw_files {
        return Err(ValidationError::new("No file part").into());
    }

    let books: Vec<String> = state.corpus.titles().into_iter().collect();
    tracing::info!(
        "loaded books: {:?}, total quotes: {}",
        books,
        state.corpus.quote_count()
    );

    Ok(Json(UploadResponse {
        status: "success",
        report,
        feed: assemble(&state.corpus, 0, state.items_per_page, None),
        books,
    }))
}

async fn feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let page = parse_count(query.page.as_deref(), "page", 0)?;
    let items_per_page = parse_count(
        query.items_per_page.as_deref(),
        "items_per_page",
        state.items_per_page,
    )?;
    if items_per_page == 0 {
        return Err(ValidationError::new("items_per_page must be greater than zero").into());
    }

    let filter = parse_title_filter(query.books.as_deref().unwrap_or(""));
    tracing::info!(
        "feed request - page: {}, items: {}, books: {:?}",
        page,
        items_per_page,
        filter
    );

    let feed = assemble(&state.corpus, page, items_per_page, Some(&filter));
    let has_more = feed.len() == items_per_page;

    Ok(Json(FeedResponse {
        status: "success",
        feed,
        has_more,
        next_page: has_more.then_some(page + 1),
    }))
}

async fn books_handler(State(state): State<AppState>) -> Json<BooksResponse> {
    Json(BooksResponse {
        books: state.corpus.titles().into_iter().collect(),
    })
}

async fn remove_book_handler(
    State(state): State<AppState>,
    payload: Result<Json<RemoveBookRequest>, JsonRejection>,
) -> Result<Json<RemoveBookResponse>, ApiError> {
    let Json(request) = payload.map_err(|err| ValidationError::new(err.body_text()))?;

    let title = request
        .book
        .filter(|book| !book.trim().is_empty())
        .ok_or_else(|| ValidationError::new("No book title provided"))?;

    if !state.corpus.remove(&title) {
        return Err(NotFoundError("Book not found".to_string()).into());
    }

    tracing::info!("removed book: {}", title);
    Ok(Json(RemoveBookResponse {
        success: true,
        message: format!("Successfully removed {title}"),
    }))
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|err| ValidationError::new(err.body_text()))?;
    let prompt = request.validate()?;

    let comment = state.chat.respond(prompt).await?;

    Ok(Json(ChatReply {
        success: true,
        response: comment.ai_response,
        timestamp: comment.timestamp,
    }))
}

async fn comments_handler(
    State(state): State<AppState>,
    Path(quote_id): Path<String>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let comments = state.db.comments_for_quote(&quote_id).await?;

    Ok(Json(CommentsResponse {
        success: true,
        comments: comments.into_iter().map(CommentView::from).collect(),
    }))
}

fn parse_count(raw: Option<&str>, name: &str, default: usize) -> Result<usize, ValidationError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| ValidationError::new(format!("{name} must be a non-negative integer"))),
        None => Ok(default),
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    books: Vec<String>,
    items_per_page: usize,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: format!("File is too large. Maximum size is {}", format_size(limit)),
            };
        }
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.body_text(),
        }
    }
}

fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;

    if bytes >= MIB {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: value.to_string(),
        }
    }
}

impl From<NotFoundError> for ApiError {
    fn from(value: NotFoundError) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: value.to_string(),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(value: ChatError) -> Self {
        let status = match value {
            ChatError::Generation(_) => StatusCode::BAD_GATEWAY,
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("chat error: {}", value);
        Self {
            status,
            message: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        tracing::error!("request failed: {:#}", value);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value.to_string(),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(value: askama::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
