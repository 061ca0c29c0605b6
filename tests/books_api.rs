mod common;

use axum::http::{header, Method, StatusCode};
use common::{book_body, error_code, StubCatalog, TestApp};
use serde_json::json;

const ALICE: (&str, &str) = ("alice", "wonderland");

async fn app_with_reader() -> TestApp {
    let app = TestApp::new();
    app.register(ALICE.0, ALICE.1).await;
    app
}

#[tokio::test]
async fn creating_a_book_is_public_and_assigns_an_id() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(book_body("Rayuela", "9788437604572")),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["id"], 1);
    assert_eq!(response.body["title"], "Rayuela");
    assert_eq!(response.body["isbn"], "9788437604572");
}

#[tokio::test]
async fn reading_books_requires_credentials() {
    let app = TestApp::new();
    app.create_book(book_body("Rayuela", "1")).await;

    let response = app.send(Method::GET, "/api/books/1", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response), "unauthorized");
    let challenge = response.headers[header::WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Basic realm=\"bookshelf\""));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app_with_reader().await;

    let response = app.get("/api/books", ("alice", "not-it")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_returns_the_stored_book_or_404() {
    let app = app_with_reader().await;
    let created = app.create_book(book_body("Rayuela", "1")).await;

    let found = app.get("/api/books/1", ALICE).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body, created);

    let missing = app.get("/api/books/99", ALICE).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&missing), "not_found");
}

#[tokio::test]
async fn create_lists_every_missing_field() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/api/books",
            Some(json!({ "title": "Untitled", "isbn": "1" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response), "validation_error");
    let fields: Vec<&str> = response.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"author"));
    assert!(fields.contains(&"publisher"));
    assert!(!fields.contains(&"title"));
}

#[tokio::test]
async fn create_rejects_an_id_that_is_already_stored() {
    let app = TestApp::new();
    app.create_book(book_body("Rayuela", "1")).await;

    let mut body = book_body("Bestiario", "2");
    body["id"] = json!(1);
    let response = app
        .send(Method::POST, "/api/books", Some(body), None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "identifier_must_be_absent");
}

#[tokio::test]
async fn list_filters_sorts_and_pages() {
    let app = app_with_reader().await;
    for (title, isbn) in [("Rayuela", "1"), ("Bestiario", "2"), ("Final del juego", "3")] {
        app.create_book(book_body(title, isbn)).await;
    }
    let mut other = book_body("Ficciones", "4");
    other["author"] = json!("Jorge Luis Borges");
    app.create_book(other).await;

    let page = app
        .get("/api/books?size=2&sort=title,desc&page=0", ALICE)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["total_elements"], 4);
    assert_eq!(page.body["total_pages"], 2);
    let titles: Vec<&str> = page.body["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Rayuela", "Final del juego"]);

    let filtered = app
        .get("/api/books?author=Jorge%20Luis%20Borges", ALICE)
        .await;
    assert_eq!(filtered.body["total_elements"], 1);
    assert_eq!(filtered.body["content"][0]["title"], "Ficciones");
}

#[tokio::test]
async fn list_rejects_unknown_sort_fields_and_oversized_pages() {
    let app = app_with_reader().await;

    let bad_sort = app.get("/api/books?sort=password", ALICE).await;
    assert_eq!(bad_sort.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_sort.body["error"]["details"][0]["field"], "sort");

    let too_big = app.get("/api/books?size=1000", ALICE).await;
    assert_eq!(too_big.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(too_big.body["error"]["details"][0]["field"], "size");
}

#[tokio::test]
async fn author_lookup_returns_the_first_match() {
    let app = app_with_reader().await;
    app.create_book(book_body("Rayuela", "1")).await;
    app.create_book(book_body("Bestiario", "2")).await;

    let found = app
        .get("/api/books/author?author=Julio%20Cort%C3%A1zar", ALICE)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["title"], "Rayuela");

    let missing = app.get("/api/books/author?author=Nobody", ALICE).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_the_book_when_ids_agree() {
    let app = app_with_reader().await;
    app.create_book(book_body("Rayuela", "1")).await;

    let mut body = book_body("Rayuela (edición crítica)", "1");
    body["id"] = json!(1);
    let response = app
        .send(Method::PUT, "/api/books/1", Some(body), Some(ALICE))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Rayuela (edición crítica)");
    let reread = app.get("/api/books/1", ALICE).await;
    assert_eq!(reread.body["title"], "Rayuela (edición crítica)");
}

#[tokio::test]
async fn update_checks_ids_before_existence() {
    let app = app_with_reader().await;

    let mut mismatched = book_body("Rayuela", "1");
    mismatched["id"] = json!(2);
    let response = app
        .send(Method::PUT, "/api/books/7", Some(mismatched), Some(ALICE))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "identifier_mismatch");

    let without_id = app
        .send(
            Method::PUT,
            "/api/books/7",
            Some(book_body("Rayuela", "1")),
            Some(ALICE),
        )
        .await;
    assert_eq!(error_code(&without_id), "identifier_mismatch");

    let mut matching = book_body("Rayuela", "1");
    matching["id"] = json!(7);
    let missing = app
        .send(Method::PUT, "/api/books/7", Some(matching), Some(ALICE))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_book_once() {
    let app = app_with_reader().await;
    app.create_book(book_body("Rayuela", "1")).await;

    let first = app
        .send(Method::DELETE, "/api/books/1", None, Some(ALICE))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app
        .send(Method::DELETE, "/api/books/1", None, Some(ALICE))
        .await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/api/books/1", ALICE).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn isbn_lookup_prefers_local_books() {
    let app = app_with_reader().await;
    app.create_book(book_body("Rayuela", "0261102214")).await;

    let response = app.get("/api/books/isbn?isbn=0261102214", ALICE).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Rayuela");
    assert_eq!(app.catalog.calls(), 0);
}

#[tokio::test]
async fn isbn_lookup_imports_from_the_catalog_once() {
    let app = app_with_reader().await;

    let imported = app.get("/api/books/isbn?isbn=0261102214", ALICE).await;
    assert_eq!(imported.status, StatusCode::CREATED);
    assert_eq!(imported.body["title"], "The Hobbit");
    assert_eq!(imported.body["author"], "J.R.R. Tolkien");
    assert_eq!(imported.body["publisher"], "J.R.R. Tolkien");
    assert_eq!(imported.body["year"], "1966");
    assert_eq!(imported.body["pages"], "287");
    assert_eq!(imported.body["isbn"], "0261102214");

    let again = app.get("/api/books/isbn?isbn=0261102214", ALICE).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["id"], imported.body["id"]);
    assert_eq!(app.catalog.calls(), 1);
}

#[tokio::test]
async fn isbn_unknown_to_the_catalog_is_404() {
    let app = TestApp::with_catalog(StubCatalog::default());
    app.register(ALICE.0, ALICE.1).await;

    let response = app.get("/api/books/isbn?isbn=000", ALICE).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "catalog_lookup_not_found");
    assert_eq!(app.catalog.calls(), 1);
}
