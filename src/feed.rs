use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::corpus::CorpusStore;
use crate::models::Quote;

/// One page of a freshly shuffled feed.
///
/// Every call shuffles the whole selection again, so consecutive pages may repeat or skip quotes.
/// That keeps the feed random; callers must not rely on pages partitioning the corpus.
pub fn assemble(
    corpus: &CorpusStore,
    page: usize,
    page_size: usize,
    filter: Option<&BTreeSet<String>>,
) -> Vec<Quote> {
    assemble_with_rng(corpus, page, page_size, filter, &mut rand::thread_rng())
}

pub fn assemble_with_rng<R: Rng + ?Sized>(
    corpus: &CorpusStore,
    page: usize,
    page_size: usize,
    filter: Option<&BTreeSet<String>>,
    rng: &mut R,
) -> Vec<Quote> {
    let mut items: Vec<Quote> = {
        let books = corpus.read();
        match filter.filter(|titles| !titles.is_empty()) {
            Some(titles) => titles
                .iter()
                .filter_map(|title| books.get(title))
                .flatten()
                .cloned()
                .collect(),
            None => books.values().flatten().cloned().collect(),
        }
    };

    tracing::debug!(
        "assembling feed page {} (size {}) from {} quotes",
        page,
        page_size,
        items.len()
    );

    items.shuffle(rng);

    let start = page.saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(items.len());
    items.drain(start..end).collect()
}

/// Splits a comma-separated title list, dropping blank entries.
pub fn parse_title_filter(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect()
}
