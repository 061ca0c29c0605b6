pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, patch},
    Router,
};
use bookshelf_kernel::{settings::PaginationSettings, InitCtx, Module};
use serde_json::json;

use service::UserService;

/// Handler state for the users routes.
#[derive(Clone)]
pub struct UsersState {
    pub service: UserService,
    pub pagination: PaginationSettings,
}

/// Users, their book collections, and their passwords.
pub struct UsersModule {
    state: UsersState,
}

impl UsersModule {
    pub fn new(service: UserService, pagination: PaginationSettings) -> Self {
        Self {
            state: UsersState {
                service,
                pagination,
            },
        }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            bcrypt_cost = ctx.settings.auth.bcrypt_cost,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_users).post(handlers::create_user))
            .route("/me", get(handlers::current_user))
            .route("/username", get(handlers::find_by_username))
            .route(
                "/{id}",
                get(handlers::get_user)
                    .put(handlers::update_user)
                    .delete(handlers::delete_user),
            )
            .route("/{id}/add_book/{book_id}", patch(handlers::add_book))
            .route("/{id}/remove_book/{book_id}", patch(handlers::remove_book))
            .route("/{id}/change_password", patch(handlers::change_password))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

fn user_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/User" }
            }
        }
    })
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

fn path_param(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn ownership_operation(summary: &str) -> serde_json::Value {
    json!({
        "patch": {
            "summary": summary,
            "tags": ["Users"],
            "parameters": [path_param("id"), path_param("book_id")],
            "responses": {
                "200": user_response("Updated user"),
                "400": error_response("Book already in the collection"),
                "404": error_response("User or book not found")
            }
        }
    })
}

fn collection_operations() -> serde_json::Value {
    json!({
        "get": {
            "summary": "List users",
            "tags": ["Users"],
            "parameters": [
                { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 0 } },
                { "name": "size", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
                { "name": "sort", "in": "query", "schema": { "type": "string" } },
                { "name": "date_start", "in": "query", "schema": { "type": "string", "format": "date" } },
                { "name": "date_end", "in": "query", "schema": { "type": "string", "format": "date" } },
                { "name": "name_like", "in": "query", "schema": { "type": "string" } }
            ],
            "responses": {
                "200": {
                    "description": "One page of users",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/UserPage" }
                        }
                    }
                },
                "422": error_response("Invalid paging or sort parameters")
            }
        },
        "post": {
            "summary": "Register a user",
            "tags": ["Users"],
            "security": [],
            "requestBody": json_body("UserInput"),
            "responses": {
                "201": user_response("User created"),
                "400": error_response("Body carries an id"),
                "422": error_response("Required fields missing")
            }
        }
    })
}

fn item_operations() -> serde_json::Value {
    json!({
        "get": {
            "summary": "Get a user",
            "tags": ["Users"],
            "parameters": [path_param("id")],
            "responses": {
                "200": user_response("User found"),
                "404": error_response("User not found")
            }
        },
        "put": {
            "summary": "Replace a user's profile",
            "tags": ["Users"],
            "parameters": [path_param("id")],
            "requestBody": json_body("UserInput"),
            "responses": {
                "200": user_response("User updated"),
                "400": error_response("Path id and body id differ"),
                "404": error_response("User not found")
            }
        },
        "delete": {
            "summary": "Delete a user",
            "tags": ["Users"],
            "parameters": [path_param("id")],
            "responses": {
                "200": { "description": "User deleted" },
                "404": error_response("User not found")
            }
        }
    })
}

fn lookup_operations() -> (serde_json::Value, serde_json::Value) {
    let me = json!({
        "get": {
            "summary": "The authenticated user",
            "tags": ["Users"],
            "responses": {
                "200": user_response("Current user"),
                "401": error_response("Missing or invalid credentials")
            }
        }
    });
    let username = json!({
        "get": {
            "summary": "Find a user by username",
            "tags": ["Users"],
            "parameters": [
                { "name": "username", "in": "query", "required": true, "schema": { "type": "string" } }
            ],
            "responses": {
                "200": user_response("User found"),
                "404": error_response("User not found")
            }
        }
    });
    (me, username)
}

fn change_password_operation() -> serde_json::Value {
    json!({
        "patch": {
            "summary": "Change a user's password",
            "tags": ["Users"],
            "parameters": [path_param("id")],
            "requestBody": json_body("PasswordChange"),
            "responses": {
                "200": user_response("Password changed"),
                "400": error_response("password and verified_password differ"),
                "404": error_response("User not found")
            }
        }
    })
}

fn schemas() -> serde_json::Value {
    let user_type = json!({ "type": "string", "enum": ["user", "student", "professor"] });
    let date = json!({ "type": "string", "format": "date" });
    let secret = json!({ "type": "string", "format": "password" });

    json!({
        "User": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "format": "int64" },
                "username": { "type": "string" },
                "name": { "type": "string" },
                "birthdate": date,
                "user_type": user_type,
                "year": { "type": "string", "description": "Students only" },
                "subject": { "type": "string", "description": "Professors only" },
                "books": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/Book" }
                }
            },
            "required": ["id", "username", "name", "birthdate", "user_type", "books"]
        },
        "UserInput": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "format": "int64" },
                "username": { "type": "string" },
                "name": { "type": "string" },
                "birthdate": date,
                "password": secret,
                "user_type": user_type,
                "year": { "type": "string" },
                "subject": { "type": "string" }
            },
            "required": ["username", "name", "birthdate"]
        },
        "PasswordChange": {
            "type": "object",
            "properties": {
                "old_password": secret,
                "password": secret,
                "verified_password": secret
            },
            "required": ["password", "verified_password"]
        },
        "UserPage": {
            "type": "object",
            "properties": {
                "content": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/User" }
                },
                "page": { "type": "integer" },
                "size": { "type": "integer" },
                "total_elements": { "type": "integer" },
                "total_pages": { "type": "integer" }
            },
            "required": ["content", "page", "size", "total_elements", "total_pages"]
        }
    })
}

fn openapi() -> serde_json::Value {
    let (me, username) = lookup_operations();
    json!({
        "paths": {
            "/": collection_operations(),
            "/me": me,
            "/username": username,
            "/{id}": item_operations(),
            "/{id}/add_book/{book_id}": ownership_operation("Add a book to the user's collection"),
            "/{id}/remove_book/{book_id}": ownership_operation("Remove a book from the user's collection"),
            "/{id}/change_password": change_password_operation()
        },
        "components": { "schemas": schemas() }
    })
}

/// Create a new instance of the users module
pub fn create_module(service: UserService, pagination: PaginationSettings) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(service, pagination))
}
