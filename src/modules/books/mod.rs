pub mod catalog;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookshelf_kernel::{settings::PaginationSettings, InitCtx, Module};
use serde_json::json;

use service::BookService;

/// Handler state for the books routes.
#[derive(Clone)]
pub struct BooksState {
    pub service: BookService,
    pub pagination: PaginationSettings,
}

/// Books catalog: CRUD, filtered listing, and ISBN import.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(service: BookService, pagination: PaginationSettings) -> Self {
        Self {
            state: BooksState {
                service,
                pagination,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            catalog = %ctx.settings.catalog.base_url,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_books).post(handlers::create_book))
            .route("/author", get(handlers::find_by_author))
            .route("/isbn", get(handlers::find_by_isbn))
            .route(
                "/{id}",
                get(handlers::get_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_param() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn query_param(name: &str, required: bool) -> serde_json::Value {
    json!({
        "name": name,
        "in": "query",
        "required": required,
        "schema": { "type": "string" }
    })
}

fn book_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    let mut list_params = vec![
        json!({ "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 0 } }),
        json!({ "name": "size", "in": "query", "schema": { "type": "integer", "minimum": 1 } }),
        query_param("sort", false),
        json!({ "name": "id", "in": "query", "schema": { "type": "integer", "format": "int64" } }),
    ];
    for field in [
        "genre",
        "author",
        "title",
        "subtitle",
        "publisher",
        "year",
        "pages",
        "isbn",
    ] {
        list_params.push(query_param(field, false));
    }

    let book_string = json!({ "type": "string" });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": list_params,
                    "responses": {
                        "200": {
                            "description": "One page of books",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookPage" }
                                }
                            }
                        },
                        "422": error_response("Invalid paging or sort parameters")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "security": [],
                    "requestBody": book_body(),
                    "responses": {
                        "201": book_response("Book created"),
                        "400": error_response("Body carries an id that is already stored"),
                        "422": error_response("Required fields missing")
                    }
                }
            },
            "/author": {
                "get": {
                    "summary": "Find the first book by an author",
                    "tags": ["Books"],
                    "parameters": [query_param("author", true)],
                    "responses": {
                        "200": book_response("Book found"),
                        "404": error_response("No book by that author")
                    }
                }
            },
            "/isbn": {
                "get": {
                    "summary": "Find a book by ISBN, importing it from Open Library when missing",
                    "tags": ["Books"],
                    "parameters": [query_param("isbn", true)],
                    "responses": {
                        "200": book_response("Book already stored"),
                        "201": book_response("Book imported from the catalog"),
                        "404": error_response("Catalog has no record for the ISBN")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "200": book_response("Book found"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "requestBody": book_body(),
                    "responses": {
                        "200": book_response("Book updated"),
                        "400": error_response("Path id and body id differ"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "200": { "description": "Book deleted" },
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "genre": { "type": "string", "nullable": true },
                        "author": book_string,
                        "image": book_string,
                        "title": book_string,
                        "subtitle": book_string,
                        "publisher": book_string,
                        "year": book_string,
                        "pages": book_string,
                        "isbn": book_string
                    },
                    "required": ["author", "image", "title", "subtitle", "publisher", "year", "pages", "isbn"]
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "content": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        },
                        "page": { "type": "integer" },
                        "size": { "type": "integer" },
                        "total_elements": { "type": "integer" },
                        "total_pages": { "type": "integer" }
                    },
                    "required": ["content", "page", "size", "total_elements", "total_pages"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(service: BookService, pagination: PaginationSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(service, pagination))
}
