use std::{pin::Pin, time::Duration};

use log::warn;
use thiserror::Error;
use tokio::{sync::mpsc, time::timeout};
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream};

use crate::book::{BookProvider, BookSearchResult};
use crate::provider::{BookSearchError, SearchProvider};

pub type SearchStream = Pin<Box<dyn Stream<Item = ProviderOutcome> + Send>>;

#[derive(Debug, Error)]
pub enum FanOutError {
    #[error(transparent)]
    Search(#[from] BookSearchError),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider: BookProvider,
    pub result: Result<Vec<BookSearchResult>, FanOutError>,
}

/// Queries every provider concurrently. Outcomes arrive in completion order and
/// the stream ends once every provider has answered or timed out.
pub fn search_all(
    providers: Vec<Box<dyn SearchProvider>>,
    query: &str,
    deadline: Option<Duration>,
) -> SearchStream {
    let (tx, rx) = mpsc::unbounded_channel();

    for provider in providers {
        let tx = tx.clone();
        let query = query.to_owned();
        tokio::spawn(async move {
            let kind = provider.kind();
            let result = match deadline {
                Some(deadline) => timeout(deadline, provider.search(&query))
                    .await
                    .map_err(|_| FanOutError::TimedOut(deadline))
                    .and_then(|r| r.map_err(FanOutError::from)),
                None => provider.search(&query).await.map_err(FanOutError::from),
            };

            if let Err(err) = &result {
                warn!("Failed to search({}, {:?}): {}", kind, &query, err);
            }
            let _ = tx.send(ProviderOutcome {
                provider: kind,
                result,
            });
        });
    }

    Box::pin(UnboundedReceiverStream::new(rx))
}
