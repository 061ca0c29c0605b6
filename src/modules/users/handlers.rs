use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use bookshelf_authz::Principal;
use bookshelf_db::Page;
use bookshelf_http::{AppError, ValidJson, ValidPath, ValidQuery};
use serde::Deserialize;
use tracing::info;

use super::models::{User, UserFilter, UserPayload};
use super::password::PasswordChange;
use super::UsersState;
use crate::modules::error::LibraryError;
use crate::utils::PageQuery;

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

pub async fn list_users(
    State(state): State<UsersState>,
    ValidQuery(paging): ValidQuery<PageQuery>,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<Page<User>>, AppError> {
    let request = paging
        .into_request(&state.pagination)
        .map_err(LibraryError::from)?;
    Ok(Json(state.service.list(&filter, &request).await?))
}

pub async fn get_user(
    State(state): State<UsersState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.get(id).await?))
}

pub async fn find_by_username(
    State(state): State<UsersState>,
    ValidQuery(query): ValidQuery<UsernameQuery>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.find_by_username(&query.username).await?))
}

/// The user record of whoever sent the request.
pub async fn current_user(
    State(state): State<UsersState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        state.service.find_by_username(principal.username()).await?,
    ))
}

pub async fn create_user(
    State(state): State<UsersState>,
    ValidJson(payload): ValidJson<UserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    info!(username = ?payload.username, "creating user");
    let user = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<UsersState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<UserPayload>,
) -> Result<Json<User>, AppError> {
    info!(user_id = id, by = %principal.username(), "updating user");
    Ok(Json(state.service.update(id, payload).await?))
}

pub async fn delete_user(
    State(state): State<UsersState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, AppError> {
    info!(user_id = id, by = %principal.username(), "deleting user");
    state.service.delete(id).await?;
    Ok(StatusCode::OK)
}

pub async fn add_book(
    State(state): State<UsersState>,
    ValidPath((id, book_id)): ValidPath<(i64, i64)>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.add_book(id, book_id).await?))
}

pub async fn remove_book(
    State(state): State<UsersState>,
    ValidPath((id, book_id)): ValidPath<(i64, i64)>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.service.remove_book(id, book_id).await?))
}

pub async fn change_password(
    State(state): State<UsersState>,
    Extension(principal): Extension<Principal>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(change): ValidJson<PasswordChange>,
) -> Result<Json<User>, AppError> {
    info!(user_id = id, by = %principal.username(), "changing password");
    Ok(Json(state.service.change_password(id, change).await?))
}
