use std::env;
use std::time::Duration;

pub const GOOGLE_BOOKS_ENDPOINT: &str = "https://www.googleapis.com/books/v1/volumes";
pub const OPEN_LIBRARY_ENDPOINT: &str = "https://openlibrary.org/search.json";
pub const OPEN_LIBRARY_COVERS: &str = "https://covers.openlibrary.org/b/id";

pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_BOOKS_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub google_books_endpoint: String,
    pub open_library_endpoint: String,
    pub open_library_covers: String,
    /// Per-provider deadline for fan-out searches. `None` leaves it to the transport.
    pub deadline: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            google_api_key: None,
            google_books_endpoint: GOOGLE_BOOKS_ENDPOINT.to_owned(),
            open_library_endpoint: OPEN_LIBRARY_ENDPOINT.to_owned(),
            open_library_covers: OPEN_LIBRARY_COVERS.to_owned(),
            deadline: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            google_api_key: non_empty(env::var(GOOGLE_API_KEY_VAR).ok()),
            ..Config::default()
        }
    }
}

/// Blank credentials count as not configured.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
