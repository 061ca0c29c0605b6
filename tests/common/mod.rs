#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf_app::modules::books::catalog::{BookInfo, CatalogClient, Cover, Named};
use bookshelf_app::Services;
use bookshelf_authz::{BasicCredentials, BcryptHasher};
use bookshelf_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Catalog double that counts lookups.
#[derive(Default)]
pub struct StubCatalog {
    records: HashMap<String, BookInfo>,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn with_record(mut self, isbn: &str, info: BookInfo) -> Self {
        self.records.insert(isbn.to_string(), info);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn lookup(&self, isbn: &str) -> anyhow::Result<Option<BookInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.get(isbn).cloned())
    }
}

pub fn hobbit_info() -> BookInfo {
    BookInfo {
        authors: vec![Named {
            name: "J.R.R. Tolkien".into(),
        }],
        publishers: vec![Named {
            name: "Houghton Mifflin".into(),
        }],
        title: Some("The Hobbit".into()),
        subtitle: Some("or There and Back Again".into()),
        publish_date: Some("1966".into()),
        number_of_pages: Some("287".into()),
        cover: Some(Cover {
            medium: Some("https://covers.openlibrary.org/b/id/6979861-M.jpg".into()),
            ..Default::default()
        }),
    }
}

pub struct TestApp {
    router: Router,
    pub catalog: Arc<StubCatalog>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_catalog(StubCatalog::default().with_record("0261102214", hobbit_info()))
    }

    pub fn with_catalog(catalog: StubCatalog) -> Self {
        let settings = Settings::default();
        let catalog = Arc::new(catalog);
        let services = Services::in_memory(&settings)
            .with_catalog(catalog.clone())
            .with_hasher(Arc::new(BcryptHasher::new(4)));
        let router = bookshelf_app::build_app(&services, &settings).unwrap();
        Self { router, catalog }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        credentials: Option<(&str, &str)>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = credentials {
            builder = builder.header(
                header::AUTHORIZATION,
                BasicCredentials::new(username, password).to_header_value(),
            );
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, credentials: (&str, &str)) -> TestResponse {
        self.send(Method::GET, uri, None, Some(credentials)).await
    }

    /// Register through the public endpoint and return the created user.
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let response = self
            .send(
                Method::POST,
                "/api/users",
                Some(user_body(username, password)),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Create through the public endpoint and return the created book.
    pub async fn create_book(&self, body: Value) -> Value {
        let response = self
            .send(Method::POST, "/api/books", Some(body), None)
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

pub fn user_body(username: &str, password: &str) -> Value {
    json!({
        "username": username,
        "name": format!("{} Reader", username),
        "birthdate": "1990-04-12",
        "password": password
    })
}

pub fn book_body(title: &str, isbn: &str) -> Value {
    json!({
        "genre": "Fiction",
        "author": "Julio Cortázar",
        "image": "https://covers.example/rayuela.jpg",
        "title": title,
        "subtitle": "Novel",
        "publisher": "Sudamericana",
        "year": "1963",
        "pages": "600",
        "isbn": isbn
    })
}

pub fn error_code(response: &TestResponse) -> &str {
    response.body["error"]["code"].as_str().unwrap_or_default()
}
