use chrono::Utc;

use crate::db::Database;
use crate::error::{ChatError, GenerationError};
use crate::models::{ChatPrompt, NewComment};
use crate::ollama::OllamaClient;

const PERSONAS: [&str; 6] = [
    "The Witty Intellectual (clever wordplay, loves an \"actually...\" moment)",
    "The Enthusiastic Reactor (all-in excitement, \"THIS!!\")",
    "The Chill Observer (low-key, \"ngl\" and \"fr\")",
    "The Devil's Advocate (opens with \"hot take but...\")",
    "The Meme Lord (riffs on trending formats)",
    "The Thread Explainer (breaks it down point by point)",
];

const ELLIPSIS: &str = "...";

#[derive(Clone)]
pub struct ChatService {
    db: Database,
    ollama: OllamaClient,
    max_reply_len: usize,
}

impl ChatService {
    pub fn new(db: Database, ollama: OllamaClient, max_reply_len: usize) -> Self {
        Self {
            db,
            ollama,
            max_reply_len,
        }
    }

    /// Generates a short in-character reply to a comment on a quote.
    pub async fn generate(
        &self,
        user_message: &str,
        context: &str,
        book_title: &str,
    ) -> Result<String, GenerationError> {
        let prompt = build_persona_prompt(user_message, context, book_title);
        let raw = self.ollama.generate_text(&prompt).await?;
        Ok(truncate_reply(&raw, self.max_reply_len))
    }

    /// Generates a reply and appends the exchange to the comment log.
    pub async fn respond(&self, prompt: ChatPrompt) -> Result<NewComment, ChatError> {
        let reply = self
            .generate(&prompt.message, &prompt.context, &prompt.book_title)
            .await?;

        let comment = NewComment {
            quote_id: prompt.quote_id,
            book_title: prompt.book_title,
            user_message: prompt.message,
            ai_response: reply,
            timestamp: Utc::now(),
            context: prompt.context,
        };

        self.db
            .insert_comment(&comment)
            .await
            .map_err(ChatError::Storage)?;

        Ok(comment)
    }
}

pub fn build_persona_prompt(user_message: &str, context: &str, book_title: &str) -> String {
    let personas = PERSONAS
        .iter()
        .map(|persona| format!("- {persona}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You're a regular person replying in a social media thread about a book quote. \
Sound casual and real.

The quote is from \"{book_title}\": {context}

Someone just posted: \"{user_message}\"

Pick one of these personalities at random and reply as them:
{personas}

Keep the reply:
- casual and conversational
- about the quote, without getting formal
- on topic, fun, and actually helpful
- free of emojis and hashtags, and not over the top

Reply:"
    )
}

/// Caps `reply` at `max_len` characters.
///
/// Within the first `max_len - 3` characters the cut goes after the last `.`, `!` or `?`; with no
/// such mark it goes at the last whitespace and `...` is appended. Works on characters, so a
/// multi-byte character is never split. A cap of three characters or fewer is a plain cut.
pub fn truncate_reply(reply: &str, max_len: usize) -> String {
    if reply.chars().count() <= max_len {
        return reply.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return reply.chars().take(max_len).collect();
    }

    let window_chars = max_len.saturating_sub(ELLIPSIS.len());
    let window_end = reply
        .char_indices()
        .nth(window_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(reply.len());
    let window = &reply[..window_end];

    if let Some(pos) = window.rfind(['.', '!', '?']) {
        if pos > 0 {
            return window[..=pos].to_string();
        }
    }

    match window.rfind(char::is_whitespace) {
        Some(pos) => format!("{}{ELLIPSIS}", window[..pos].trim_end()),
        None => format!("{window}{ELLIPSIS}"),
    }
}
