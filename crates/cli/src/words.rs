use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use typeahead_core::{lookup_fn, SharedLookup};

/// Case-insensitive substring lookup over a newline-separated word list.
///
/// The file is re-read on every lookup so edits show up on the next search;
/// a missing or unreadable file surfaces as a lookup error.
pub fn word_lookup(path: PathBuf, latency: Duration) -> SharedLookup<String, std::io::Error> {
    Arc::new(lookup_fn(move |query: String| {
        let path = path.clone();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let contents = tokio::fs::read_to_string(&path).await?;
            let matches = matching_words(&contents, &query);
            debug!("{} words match {query:?}", matches.len());
            Ok::<_, std::io::Error>(matches)
        }
    }))
}

fn matching_words(contents: &str, query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    contents
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .filter(|word| word.to_lowercase().contains(&needle))
        .map(str::to_string)
        .collect()
}
