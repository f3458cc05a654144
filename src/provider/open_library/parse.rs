use serde::Deserialize;

/// `search.json` envelope. The envelope is camelCase, docs are snake_case.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    pub docs: Vec<Doc>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Doc {
    /// Work key, e.g. `/works/OL45804W`.
    pub key: String,
    pub title: Option<String>,
    pub author_name: Option<Vec<String>>,
    pub first_publish_year: Option<i32>,
    pub number_of_pages_median: Option<u32>,
    pub cover_i: Option<i64>,
    pub isbn: Option<Vec<String>>,
    pub publisher: Option<Vec<String>>,
    pub subject: Option<Vec<String>>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<u32>,
}
