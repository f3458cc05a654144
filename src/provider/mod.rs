use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::book::{BookProvider, BookSearchResult};
use crate::config::Config;
use crate::transport::{Transport, TransportError};

pub mod google_books;
pub mod open_library;

pub use google_books::GoogleBooks;
pub use open_library::OpenLibrary;

#[derive(Debug, Error)]
pub enum BookSearchError {
    #[error("Invalid URL configuration: {0}")]
    InvalidUrl(String),

    #[error("API key is missing")]
    ApiKeyMissing,

    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    #[error("Failed to parse response: {0}")]
    Decoding(#[source] serde_json::Error),

    #[error("No results found")]
    NoResults,
}

/// What a provider returns when the catalog answers with zero entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResponse {
    /// Succeed with an empty list.
    Empty,
    /// Fail with [`BookSearchError::NoResults`].
    NoResults,
}

impl EmptyResponse {
    fn apply(self, entries: usize) -> Result<(), BookSearchError> {
        match (self, entries) {
            (EmptyResponse::NoResults, 0) => Err(BookSearchError::NoResults),
            _ => Ok(()),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn kind(&self) -> BookProvider;

    /// Runs one catalog query. Results keep the catalog's ranking.
    async fn search(&self, query: &str) -> Result<Vec<BookSearchResult>, BookSearchError>;
}

pub fn all(config: &Config, transport: Arc<dyn Transport>) -> Vec<Box<dyn SearchProvider>> {
    vec![
        Box::new(GoogleBooks::from_config(config, transport.clone())),
        Box::new(OpenLibrary::from_config(config, transport)),
    ]
}

fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url, BookSearchError> {
    let mut url =
        Url::parse(base).map_err(|err| BookSearchError::InvalidUrl(format!("{base}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(BookSearchError::InvalidUrl(base.to_owned()));
    }
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

async fn fetch<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: Url,
) -> Result<T, BookSearchError> {
    let body = transport.get(url).await.map_err(BookSearchError::Network)?;
    serde_json::from_slice(&body).map_err(BookSearchError::Decoding)
}
