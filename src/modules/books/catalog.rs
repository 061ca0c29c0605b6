//! Remote book catalog lookups (Open Library books API).

use std::collections::HashMap;

use anyhow::{bail, Context};
use async_trait::async_trait;
use bookshelf_kernel::settings::CatalogSettings;
use reqwest::Url;
use serde::Deserialize;

use super::models::BookPayload;

/// Fetches book metadata by ISBN from an external catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// `Ok(None)` when the catalog has no record for `isbn`.
    async fn lookup(&self, isbn: &str) -> anyhow::Result<Option<BookInfo>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Cover {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

/// A catalog record as returned under the `ISBN:{isbn}` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookInfo {
    #[serde(default)]
    pub authors: Vec<Named>,
    #[serde(default)]
    pub publishers: Vec<Named>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "page_count")]
    pub number_of_pages: Option<String>,
    pub cover: Option<Cover>,
}

/// The catalog sends page counts as numbers, older records as strings.
fn page_count<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    }))
}

/// Map a catalog record onto a new book for `isbn`.
///
/// The publisher is taken from the first author's name whenever the record
/// lists any publisher.
pub fn map_book_info(info: BookInfo, isbn: &str) -> BookPayload {
    let first_author = info.authors.first().map(|author| author.name.clone());
    let publisher = if info.publishers.is_empty() {
        None
    } else {
        first_author.clone()
    };

    BookPayload {
        id: None,
        genre: None,
        author: first_author,
        image: info.cover.and_then(|cover| cover.medium),
        title: info.title,
        subtitle: info.subtitle,
        publisher,
        year: info.publish_date,
        pages: info.number_of_pages,
        isbn: Some(isbn.to_string()),
    }
}

const ISBN_SLOT: &str = "__isbn__";

/// The configured lookup URL with `isbn` percent-encoded into its query.
fn lookup_url(settings: &CatalogSettings, isbn: &str) -> anyhow::Result<Url> {
    let template = settings.lookup_url(ISBN_SLOT);
    let mut url = Url::parse(&template)
        .with_context(|| format!("invalid catalog lookup url '{}'", template))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.replace(ISBN_SLOT, isbn)))
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url)
}

/// [`CatalogClient`] backed by the Open Library books API.
pub struct OpenLibraryClient {
    http: reqwest::Client,
    settings: CatalogSettings,
}

impl OpenLibraryClient {
    pub fn new(settings: CatalogSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl CatalogClient for OpenLibraryClient {
    async fn lookup(&self, isbn: &str) -> anyhow::Result<Option<BookInfo>> {
        let url = lookup_url(&self.settings, isbn)?;
        tracing::debug!(%url, "querying catalog");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("catalog request for ISBN {} failed", isbn))?;

        if !response.status().is_success() {
            bail!("catalog lookup for ISBN {} returned HTTP {}", isbn, response.status());
        }

        let mut records: HashMap<String, BookInfo> = response
            .json()
            .await
            .with_context(|| format!("failed to parse catalog response for ISBN {}", isbn))?;

        Ok(records.remove(&format!("ISBN:{}", isbn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> serde_json::Value {
        serde_json::json!({
            "title": "The Hobbit",
            "subtitle": "or There and Back Again",
            "authors": [{ "name": "J.R.R. Tolkien", "url": "https://openlibrary.org/authors/OL26320A" }],
            "publishers": [{ "name": "Houghton Mifflin" }],
            "publish_date": "1966",
            "number_of_pages": 287,
            "cover": {
                "small": "https://covers.openlibrary.org/b/id/1-S.jpg",
                "medium": "https://covers.openlibrary.org/b/id/1-M.jpg",
                "large": "https://covers.openlibrary.org/b/id/1-L.jpg"
            }
        })
    }

    #[test]
    fn page_count_accepts_numbers_and_strings() {
        let info: BookInfo = serde_json::from_value(record()).unwrap();
        assert_eq!(info.number_of_pages.as_deref(), Some("287"));

        let mut raw = record();
        raw["number_of_pages"] = serde_json::json!("310");
        let info: BookInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(info.number_of_pages.as_deref(), Some("310"));

        let info: BookInfo = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(info.number_of_pages, None);
    }

    #[test]
    fn mapping_copies_fields_and_uses_medium_cover() {
        let info: BookInfo = serde_json::from_value(record()).unwrap();
        let payload = map_book_info(info, "0261102214");

        assert_eq!(payload.author.as_deref(), Some("J.R.R. Tolkien"));
        assert_eq!(payload.title.as_deref(), Some("The Hobbit"));
        assert_eq!(payload.year.as_deref(), Some("1966"));
        assert_eq!(payload.pages.as_deref(), Some("287"));
        assert_eq!(
            payload.image.as_deref(),
            Some("https://covers.openlibrary.org/b/id/1-M.jpg")
        );
        assert_eq!(payload.isbn.as_deref(), Some("0261102214"));
        assert!(payload.id.is_none());
    }

    #[test]
    fn publisher_comes_from_the_first_author() {
        let info: BookInfo = serde_json::from_value(record()).unwrap();
        let payload = map_book_info(info, "0261102214");
        assert_eq!(payload.publisher.as_deref(), Some("J.R.R. Tolkien"));

        let mut raw = record();
        raw["publishers"] = serde_json::json!([]);
        let info: BookInfo = serde_json::from_value(raw).unwrap();
        assert_eq!(map_book_info(info, "0261102214").publisher, None);
    }

    #[test]
    fn lookup_url_encodes_the_isbn_into_bibkeys() {
        let url = lookup_url(&CatalogSettings::default(), "12&jscmd=x#5").unwrap();

        assert_eq!(url.host_str(), Some("openlibrary.org"));
        assert_eq!(url.fragment(), None);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("bibkeys".to_string(), "ISBN:12&jscmd=x#5".to_string()),
                ("format".to_string(), "json".to_string()),
                ("jscmd".to_string(), "data".to_string()),
            ]
        );
    }

    #[test]
    fn sparse_records_fail_validation() {
        let info = BookInfo {
            title: Some("Untitled".into()),
            ..Default::default()
        };
        assert!(map_book_info(info, "1").into_book().is_err());
    }
}
