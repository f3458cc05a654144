//! Book catalog search across Google Books and Open Library, normalized into one model.

pub mod book;
pub mod config;
pub mod provider;
pub mod search;
pub mod transport;

pub use book::{Book, BookDetails, BookImageLinks, BookProvider, BookSearchResult};
pub use provider::{BookSearchError, EmptyResponse, GoogleBooks, OpenLibrary, SearchProvider};
pub use transport::{ReqwestTransport, Transport, TransportError};
