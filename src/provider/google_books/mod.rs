use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use url::Url;

use self::parse::{ImageLinks, IndustryIdentifier, Volume, VolumesResponse};
use super::{endpoint, fetch, BookSearchError, EmptyResponse, SearchProvider};
use crate::book::{usable_title, Book, BookDetails, BookImageLinks, BookProvider, BookSearchResult};
use crate::config::{non_empty, Config, GOOGLE_BOOKS_ENDPOINT};
use crate::transport::Transport;

mod parse;

/// Page-curl effect the catalog bakes into its cover URLs.
const CURL_EFFECT: &str = "&edge=curl";
const UNKNOWN_TITLE: &str = "Unknown";

pub struct GoogleBooks {
    transport: Arc<dyn Transport>,
    api_key: Option<String>,
    endpoint: String,
    empty_response: EmptyResponse,
}

impl GoogleBooks {
    pub fn new(transport: Arc<dyn Transport>, api_key: Option<String>) -> GoogleBooks {
        GoogleBooks {
            transport,
            api_key: non_empty(api_key),
            endpoint: GOOGLE_BOOKS_ENDPOINT.to_owned(),
            empty_response: EmptyResponse::Empty,
        }
    }

    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> GoogleBooks {
        GoogleBooks::new(transport, config.google_api_key.clone())
            .with_endpoint(&config.google_books_endpoint)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> GoogleBooks {
        self.endpoint = endpoint.to_owned();
        self
    }

    pub fn with_empty_response(mut self, policy: EmptyResponse) -> GoogleBooks {
        self.empty_response = policy;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchProvider for GoogleBooks {
    fn kind(&self) -> BookProvider {
        BookProvider::GoogleBooks
    }

    async fn search(&self, query: &str) -> Result<Vec<BookSearchResult>, BookSearchError> {
        let key = self.api_key.as_deref().ok_or(BookSearchError::ApiKeyMissing)?;
        let url = endpoint(&self.endpoint, &[("q", query), ("key", key)])?;
        debug!("{}: GET {}", self.kind(), redact_key(&url));

        let response: VolumesResponse = fetch(self.transport.as_ref(), url).await?;
        debug!(
            "{}: {} volumes ({})",
            self.kind(),
            response.items.len(),
            response.kind.as_deref().unwrap_or("unknown kind")
        );
        self.empty_response.apply(response.items.len())?;

        Ok(response.items.into_iter().filter_map(to_result).collect())
    }
}

fn to_result(volume: Volume) -> Option<BookSearchResult> {
    let Some(title) = usable_title(volume.volume_info.title.clone()) else {
        debug!("Google Books: dropping untitled volume {}", volume.id);
        return None;
    };

    let cover = volume
        .volume_info
        .image_links
        .as_ref()
        .and_then(|links| links.thumbnail.as_deref())
        .map(strip_curl);

    let book = Book::new(
        volume.id.clone(),
        title,
        volume.volume_info.authors.as_deref(),
        cover,
    );

    Some(BookSearchResult {
        book,
        details: to_details(volume),
    })
}

/// Maps a raw volume onto the canonical record.
///
/// | source                          | destination                              |
/// |---------------------------------|------------------------------------------|
/// | `id`                            | `id`                                     |
/// | `title`                         | `title`, "Unknown" when absent           |
/// | `authors`                       | `authors`                                |
/// | `publisher`                     | `publisher`                              |
/// | `publishedDate`                 | `published_date`                         |
/// | `description`                   | `description`                            |
/// | `pageCount`                     | `page_count`                             |
/// | `averageRating`                 | `average_rating`                         |
/// | `ratingsCount`                  | `ratings_count`                          |
/// | `categories`                    | `categories`                             |
/// | `imageLinks`                    | `image_links`, curl effect removed       |
/// | `industryIdentifiers`           | `isbn10` / `isbn13`, first of each type  |
/// | anything else                   | dropped                                  |
fn to_details(volume: Volume) -> BookDetails {
    let info = volume.volume_info;
    let (isbn10, isbn13) = isbns(info.industry_identifiers.as_deref().unwrap_or_default());

    BookDetails {
        id: volume.id,
        title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
        authors: info.authors,
        publisher: info.publisher,
        published_date: info.published_date,
        description: info.description,
        page_count: info.page_count,
        average_rating: info.average_rating,
        ratings_count: info.ratings_count,
        categories: info.categories,
        image_links: info.image_links.map(image_links),
        isbn10,
        isbn13,
        provider: BookProvider::GoogleBooks,
    }
}

fn image_links(links: ImageLinks) -> BookImageLinks {
    let clean = |url: Option<String>| url.as_deref().map(strip_curl);

    BookImageLinks {
        thumbnail: clean(links.thumbnail.or(links.small_thumbnail)),
        small: clean(links.small),
        medium: clean(links.medium),
        large: clean(links.large.or(links.extra_large)),
    }
}

/// First ISBN_10 and first ISBN_13, in that order. Other identifier types are ignored.
fn isbns(identifiers: &[IndustryIdentifier]) -> (Option<String>, Option<String>) {
    let first_of = |kind: &str| {
        identifiers
            .iter()
            .find(|i| i.kind.as_deref() == Some(kind) && i.identifier.is_some())
            .and_then(|i| i.identifier.clone())
    };

    (first_of("ISBN_10"), first_of("ISBN_13"))
}

pub fn strip_curl(url: &str) -> String {
    let mut url = url.to_owned();
    while url.contains(CURL_EFFECT) {
        url = url.replace(CURL_EFFECT, "");
    }
    url
}

fn redact_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "REDACTED".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect::<Vec<_>>();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::FakeTransport;
    use crate::transport::TransportError;

    const DUNE: &str = r#"{
        "kind": "books#volumes",
        "items": [
            {
                "kind": "books#volume",
                "id": "B1hSG45JCX4C",
                "etag": "x",
                "selfLink": "https://www.googleapis.com/books/v1/volumes/B1hSG45JCX4C",
                "volumeInfo": {
                    "title": "Dune",
                    "authors": ["Frank Herbert", "Brian Herbert"],
                    "publisher": "Penguin",
                    "publishedDate": "2003-08-01",
                    "description": "Desert planet.",
                    "industryIdentifiers": [
                        {"type": "OTHER", "identifier": "UOM:39015"},
                        {"type": "ISBN_13", "identifier": "9781101658055"},
                        {"type": "ISBN_10", "identifier": "1101658053"},
                        {"type": "ISBN_13", "identifier": "9999999999999"},
                        {"type": "ISBN_10", "identifier": "0000000000"}
                    ],
                    "pageCount": 896,
                    "dimensions": {"height": "20 cm"},
                    "categories": ["Fiction"],
                    "averageRating": 4.5,
                    "ratingsCount": 120,
                    "imageLinks": {
                        "smallThumbnail": "http://books.google.com/c?id=1&zoom=5&edge=curl&source=gbs_api",
                        "thumbnail": "http://books.google.com/c?id=1&zoom=1&edge=curl&source=gbs_api",
                        "extraLarge": "http://books.google.com/c?id=1&zoom=6&edge=curl"
                    }
                }
            },
            {
                "id": "untitled",
                "volumeInfo": {"authors": ["Nobody"]}
            },
            {
                "id": "bare",
                "volumeInfo": {"title": "Bare"}
            }
        ]
    }"#;

    fn provider(transport: Arc<FakeTransport>) -> GoogleBooks {
        GoogleBooks::new(transport, Some("secret".to_owned()))
    }

    #[tokio::test]
    async fn maps_volumes_in_source_order() {
        let results = provider(FakeTransport::body(DUNE)).search("dune").await.unwrap();

        let ids = results.iter().map(|r| r.id()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["B1hSG45JCX4C", "bare"]);

        let dune = &results[0];
        assert_eq!(dune.book.title, "Dune");
        assert_eq!(dune.book.author, "Frank Herbert");
        assert_eq!(
            dune.book.cover_url.as_deref(),
            Some("http://books.google.com/c?id=1&zoom=1&source=gbs_api")
        );

        let details = &dune.details;
        assert_eq!(details.provider, BookProvider::GoogleBooks);
        assert_eq!(details.authors.as_ref().map(Vec::len), Some(2));
        assert_eq!(details.publisher.as_deref(), Some("Penguin"));
        assert_eq!(details.published_date.as_deref(), Some("2003-08-01"));
        assert_eq!(details.description.as_deref(), Some("Desert planet."));
        assert_eq!(details.page_count, Some(896));
        assert_eq!(details.average_rating, Some(4.5));
        assert_eq!(details.ratings_count, Some(120));
        assert_eq!(details.categories, Some(vec!["Fiction".to_owned()]));
        assert_eq!(details.isbn10.as_deref(), Some("1101658053"));
        assert_eq!(details.isbn13.as_deref(), Some("9781101658055"));

        let links = details.image_links.as_ref().unwrap();
        assert_eq!(
            links.thumbnail.as_deref(),
            Some("http://books.google.com/c?id=1&zoom=1&source=gbs_api")
        );
        assert_eq!(links.small, None);
        assert_eq!(links.medium, None);
        assert_eq!(
            links.large.as_deref(),
            Some("http://books.google.com/c?id=1&zoom=6")
        );
    }

    #[tokio::test]
    async fn absent_fields_stay_absent() {
        let results = provider(FakeTransport::body(DUNE)).search("dune").await.unwrap();
        let bare = &results[1];

        assert_eq!(bare.book.author, "Unknown Author");
        assert_eq!(bare.book.cover_url, None);
        assert_eq!(bare.details.authors, None);
        assert_eq!(bare.details.publisher, None);
        assert_eq!(bare.details.page_count, None);
        assert_eq!(bare.details.image_links, None);
        assert_eq!(bare.details.isbn10, None);
        assert_eq!(bare.details.isbn13, None);
    }

    #[tokio::test]
    async fn sends_query_and_key() {
        let transport = FakeTransport::body(r#"{"kind":"books#volumes","items":[]}"#);
        provider(transport.clone()).search("le guin").await.unwrap();

        let requested = transport.requested();
        assert_eq!(requested.len(), 1);
        assert_eq!(
            requested[0].as_str(),
            "https://www.googleapis.com/books/v1/volumes?q=le+guin&key=secret"
        );
    }

    #[tokio::test]
    async fn empty_items_is_empty_list() {
        let results = provider(FakeTransport::body(r#"{"kind":"books#volumes","items":[]}"#))
            .search("zzzz")
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn missing_items_is_empty_list() {
        let results = provider(FakeTransport::body(r#"{"kind":"books#volumes","totalItems":0}"#))
            .search("zzzz")
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn empty_items_can_fail() {
        let err = provider(FakeTransport::body(r#"{"items":[]}"#))
            .with_empty_response(EmptyResponse::NoResults)
            .search("zzzz")
            .await
            .unwrap_err();
        assert!(matches!(err, BookSearchError::NoResults));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        for key in [None, Some("".to_owned())] {
            let transport = FakeTransport::body(DUNE);
            let google = GoogleBooks::new(transport.clone(), key);

            let err = google.search("dune").await.unwrap_err();

            assert!(matches!(err, BookSearchError::ApiKeyMissing));
            assert!(transport.requested().is_empty());
            assert!(!google.is_configured());
        }
    }

    #[tokio::test]
    async fn malformed_body_is_decoding_error() {
        let err = provider(FakeTransport::body("<html>quota</html>"))
            .search("dune")
            .await
            .unwrap_err();
        assert!(matches!(err, BookSearchError::Decoding(_)));
        assert!(err.to_string().starts_with("Failed to parse response"));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let err = provider(FakeTransport::status(503))
            .search("dune")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookSearchError::Network(TransportError::Status(503))
        ));
    }

    #[tokio::test]
    async fn malformed_endpoint_is_invalid_url() {
        let transport = FakeTransport::body(DUNE);
        let err = provider(transport.clone())
            .with_endpoint("::not a url::")
            .search("dune")
            .await
            .unwrap_err();
        assert!(matches!(err, BookSearchError::InvalidUrl(_)));
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn strip_curl_is_idempotent() {
        let once = strip_curl("http://x/c?id=1&edge=curl&zoom=1");
        assert_eq!(once, "http://x/c?id=1&zoom=1");
        assert_eq!(strip_curl(&once), once);

        let nested = strip_curl("http://x/c?id=1&edge=&edge=curlcurl");
        assert_eq!(nested, "http://x/c?id=1");
        assert_eq!(strip_curl(&nested), nested);

        assert_eq!(strip_curl("http://x/c?id=1"), "http://x/c?id=1");
    }

    #[test]
    fn first_isbn_of_each_type_wins() {
        let ids = [
            ("ISBN_13", Some("A13")),
            ("ISSN", Some("X")),
            ("ISBN_10", None),
            ("ISBN_10", Some("A10")),
            ("ISBN_13", Some("B13")),
            ("ISBN_10", Some("B10")),
        ]
        .into_iter()
        .map(|(kind, id)| IndustryIdentifier {
            kind: Some(kind.to_owned()),
            identifier: id.map(str::to_owned),
        })
        .collect::<Vec<_>>();

        assert_eq!(isbns(&ids), (Some("A10".to_owned()), Some("A13".to_owned())));
        assert_eq!(isbns(&[]), (None, None));
    }

    #[test]
    fn thumbnail_falls_back_to_small_thumbnail() {
        let links = image_links(ImageLinks {
            small_thumbnail: Some("st&edge=curl".to_owned()),
            large: Some("l".to_owned()),
            extra_large: Some("xl".to_owned()),
            ..ImageLinks::default()
        });
        assert_eq!(links.thumbnail.as_deref(), Some("st"));
        assert_eq!(links.large.as_deref(), Some("l"));
        assert_eq!(links.best_available(), Some("l"));
    }

    #[test]
    fn details_title_falls_back_to_unknown() {
        let details = to_details(Volume {
            id: "x".to_owned(),
            volume_info: Default::default(),
        });
        assert_eq!(details.title, "Unknown");
    }

    #[test]
    fn redacts_api_key() {
        let url = Url::parse("https://www.googleapis.com/books/v1/volumes?q=dune&key=secret").unwrap();
        assert_eq!(
            redact_key(&url).as_str(),
            "https://www.googleapis.com/books/v1/volumes?q=dune&key=REDACTED"
        );
    }
}
