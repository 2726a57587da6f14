use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::Quote;

/// In-memory quotes of every loaded book, keyed by book title.
///
/// Cloning shares the same underlying map. Feed reads take the read lock; `add` and `remove`
/// take the write lock, so a feed never observes a half-applied upload or removal.
#[derive(Clone, Default)]
pub struct CorpusStore {
    books: Arc<RwLock<HashMap<String, Vec<Quote>>>>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds quotes under `title`. Uploading the same title again appends instead of replacing.
    pub fn add(&self, title: &str, quotes: Vec<Quote>) {
        debug_assert!(quotes.iter().all(|quote| quote.book_title == title));
        self.write().entry(title.to_string()).or_default().extend(quotes);
    }

    pub fn remove(&self, title: &str) -> bool {
        self.write().remove(title).is_some()
    }

    pub fn titles(&self) -> BTreeSet<String> {
        self.read().keys().cloned().collect()
    }

    pub fn quote_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Quote>>> {
        self.books.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Quote>>> {
        self.books.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) fn sample_quotes(title: &str, count: usize) -> Vec<Quote> {
    (0..count)
        .map(|n| Quote {
            id: format!("{title}-{n}"),
            preview: format!("Sentence {n} of {title}."),
            full_text: format!("Sentence {n} of {title}."),
            book_title: title.to_string(),
            chapter: "Chapter 1".to_string(),
            position: format!("Part 1, Paragraph {}", n + 1),
        })
        .collect()
}
