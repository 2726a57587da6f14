pub mod chat;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod ollama;
pub mod server;

pub use config::AppConfig;
pub use server::{router, run_server, AppState};
