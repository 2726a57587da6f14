use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::config::AppConfig;
use crate::models::{Comment, NewComment};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let options = SqliteConnectOptions::from_str(&config.sqlite_dsn())?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("failed to open comment database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quote_id TEXT NOT NULL,
                book_title TEXT NOT NULL,
                user_message TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                context TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_comments_quote_id ON comments (quote_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_comment(&self, comment: &NewComment) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (quote_id, book_title, user_message, ai_response, timestamp, context)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.quote_id)
        .bind(&comment.book_title)
        .bind(&comment.user_message)
        .bind(&comment.ai_response)
        .bind(comment.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(&comment.context)
        .execute(&self.pool)
        .await
        .context("failed to insert comment")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn comments_for_quote(&self, quote_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, quote_id, book_title, user_message, ai_response, timestamp, context
            FROM comments
            WHERE quote_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to load comments")?;

        Ok(rows.into_iter().map(row_to_comment).collect())
    }
}

fn row_to_comment(row: SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        quote_id: row.get("quote_id"),
        book_title: row.get("book_title"),
        user_message: row.get("user_message"),
        ai_response: row.get("ai_response"),
        timestamp: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("timestamp"))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        context: row.get("context"),
    }
}
