use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use bookshelf_db::Page;
use bookshelf_http::{AppError, ValidJson, ValidPath, ValidQuery};
use serde::Deserialize;
use tracing::info;

use super::models::{Book, BookFilter, BookPayload};
use super::service::IsbnResolution;
use super::BooksState;
use crate::modules::error::LibraryError;
use crate::utils::PageQuery;

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct IsbnQuery {
    pub isbn: String,
}

pub async fn list_books(
    State(state): State<BooksState>,
    ValidQuery(paging): ValidQuery<PageQuery>,
    ValidQuery(filter): ValidQuery<BookFilter>,
) -> Result<Json<Page<Book>>, AppError> {
    let request = paging
        .into_request(&state.pagination)
        .map_err(LibraryError::from)?;
    let page = state.service.list(&filter, &request).await?;
    Ok(Json(page))
}

pub async fn get_book(
    State(state): State<BooksState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.service.get(id).await?))
}

pub async fn find_by_author(
    State(state): State<BooksState>,
    ValidQuery(query): ValidQuery<AuthorQuery>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.service.find_by_author(&query.author).await?))
}

/// 200 for a book already stored, 201 for one imported from the catalog.
pub async fn find_by_isbn(
    State(state): State<BooksState>,
    ValidQuery(query): ValidQuery<IsbnQuery>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let resolution = state.service.resolve_isbn(&query.isbn).await?;
    let status = match resolution {
        IsbnResolution::Local(_) => StatusCode::OK,
        IsbnResolution::Fetched(_) => StatusCode::CREATED,
    };
    Ok((status, Json(resolution.into_book())))
}

pub async fn create_book(
    State(state): State<BooksState>,
    ValidJson(payload): ValidJson<BookPayload>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    info!(isbn = ?payload.isbn, "creating book");
    let book = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<BooksState>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<BookPayload>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.service.update(id, payload).await?))
}

pub async fn delete_book(
    State(state): State<BooksState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    state.service.delete(id).await?;
    Ok(StatusCode::OK)
}
