use std::fmt;

use serde::Serialize;

const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Catalog that produced a record. Ids are only unique within one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BookProvider {
    GoogleBooks,
    OpenLibrary,
}

impl fmt::Display for BookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookProvider::GoogleBooks => write!(f, "Google Books"),
            BookProvider::OpenLibrary => write!(f, "Open Library"),
        }
    }
}

/// Summary used for list rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
}

impl Book {
    /// Builds a summary, using the first author or a placeholder.
    pub fn new(
        id: String,
        title: String,
        authors: Option<&[String]>,
        cover_url: Option<String>,
    ) -> Book {
        Book {
            id,
            title,
            author: authors
                .and_then(|a| a.first())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned()),
            cover_url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookImageLinks {
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl BookImageLinks {
    /// Largest tier that is present.
    pub fn best_available(&self) -> Option<&str> {
        self.large
            .as_deref()
            .or(self.medium.as_deref())
            .or(self.small.as_deref())
            .or(self.thumbnail.as_deref())
    }
}

/// Provider-agnostic detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    pub id: String,
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    /// Either a bare year or a full date, depending on the catalog.
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub image_links: Option<BookImageLinks>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub provider: BookProvider,
}

impl BookDetails {
    pub fn author_line(&self) -> String {
        match self.authors.as_deref() {
            Some(authors) if !authors.is_empty() => authors.join(", "),
            _ => UNKNOWN_AUTHOR.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSearchResult {
    pub book: Book,
    pub details: BookDetails,
}

impl BookSearchResult {
    pub fn id(&self) -> &str {
        &self.book.id
    }
}

/// A title is usable when it is present and not blank.
pub(crate) fn usable_title(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}
