use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use self::parse::{Doc, SearchResponse};
use super::{endpoint, fetch, BookSearchError, EmptyResponse, SearchProvider};
use crate::book::{usable_title, Book, BookDetails, BookImageLinks, BookProvider, BookSearchResult};
use crate::config::{Config, OPEN_LIBRARY_COVERS, OPEN_LIBRARY_ENDPOINT};
use crate::transport::Transport;

mod parse;

const LIMIT: &str = "20";
const WORKS_PREFIX: &str = "/works/";
const MAX_CATEGORIES: usize = 5;

pub struct OpenLibrary {
    transport: Arc<dyn Transport>,
    endpoint: String,
    covers: String,
    empty_response: EmptyResponse,
}

impl OpenLibrary {
    pub fn new(transport: Arc<dyn Transport>) -> OpenLibrary {
        OpenLibrary {
            transport,
            endpoint: OPEN_LIBRARY_ENDPOINT.to_owned(),
            covers: OPEN_LIBRARY_COVERS.to_owned(),
            empty_response: EmptyResponse::NoResults,
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> OpenLibrary {
        OpenLibrary::new(transport)
            .with_endpoint(&config.open_library_endpoint)
            .with_covers(&config.open_library_covers)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> OpenLibrary {
        self.endpoint = endpoint.to_owned();
        self
    }

    /// Base that cover ids are appended to.
    pub fn with_covers(mut self, covers: &str) -> OpenLibrary {
        self.covers = covers.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_empty_response(mut self, policy: EmptyResponse) -> OpenLibrary {
        self.empty_response = policy;
        self
    }

    fn cover(&self, cover_id: i64, size: char) -> String {
        format!("{}/{}-{}.jpg", self.covers, cover_id, size)
    }

    fn to_result(&self, doc: Doc) -> Option<BookSearchResult> {
        let Some(title) = usable_title(doc.title.clone()) else {
            debug!("Open Library: dropping untitled doc {}", doc.key);
            return None;
        };

        let book = Book::new(
            work_id(&doc.key),
            title,
            doc.author_name.as_deref(),
            doc.cover_i.map(|id| self.cover(id, 'M')),
        );

        Some(BookSearchResult {
            book,
            details: self.to_details(doc),
        })
    }

    /// Maps a raw doc onto the canonical record.
    ///
    /// `key` loses its `/works/` prefix and becomes `id`. `title` falls back to "Unknown".
    /// `author_name` goes to `authors` as-is, without the placeholder `Book` uses.
    /// `first_publish_year` becomes `published_date` as a bare year. `number_of_pages_median`
    /// goes to `page_count`. `ratings_average` and `ratings_count` copy through.
    /// `publisher` contributes its first entry. `subject` becomes `categories`, cut to five.
    /// `cover_i` is expanded into the four image tiers. `isbn` is split by length into
    /// `isbn10` and `isbn13`. `description` is never available from this endpoint.
    fn to_details(&self, doc: Doc) -> BookDetails {
        let image_links = doc.cover_i.map(|id| BookImageLinks {
            thumbnail: Some(self.cover(id, 'S')),
            small: Some(self.cover(id, 'S')),
            medium: Some(self.cover(id, 'M')),
            large: Some(self.cover(id, 'L')),
        });
        let isbns = doc.isbn.as_deref().unwrap_or_default();

        BookDetails {
            id: work_id(&doc.key),
            title: doc.title.unwrap_or_else(|| "Unknown".to_owned()),
            authors: doc.author_name,
            publisher: doc.publisher.and_then(|p| p.into_iter().next()),
            published_date: doc.first_publish_year.map(|year| year.to_string()),
            description: None,
            page_count: doc.number_of_pages_median,
            average_rating: doc.ratings_average,
            ratings_count: doc.ratings_count,
            categories: doc
                .subject
                .map(|s| s.into_iter().take(MAX_CATEGORIES).collect()),
            image_links,
            isbn10: isbn_of_length(isbns, 10),
            isbn13: isbn_of_length(isbns, 13),
            provider: BookProvider::OpenLibrary,
        }
    }
}

#[async_trait]
impl SearchProvider for OpenLibrary {
    fn kind(&self) -> BookProvider {
        BookProvider::OpenLibrary
    }

    async fn search(&self, query: &str) -> Result<Vec<BookSearchResult>, BookSearchError> {
        let url = endpoint(&self.endpoint, &[("q", query), ("limit", LIMIT)])?;
        debug!("{}: GET {}", self.kind(), url);

        let response: SearchResponse = fetch(self.transport.as_ref(), url).await?;
        debug!(
            "{}: {} of {} docs from offset {}",
            self.kind(),
            response.docs.len(),
            response.num_found,
            response.start
        );
        self.empty_response.apply(response.docs.len())?;

        Ok(response
            .docs
            .into_iter()
            .filter_map(|doc| self.to_result(doc))
            .collect())
    }
}

fn work_id(key: &str) -> String {
    key.strip_prefix(WORKS_PREFIX).unwrap_or(key).to_owned()
}

fn isbn_of_length(isbns: &[String], length: usize) -> Option<String> {
    isbns.iter().find(|i| i.chars().count() == length).cloned()
}
