// Admin panel handlers

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    auth::middleware::AdminUser,
    db::{self, UserSummary},
    error::{AppError, DbResultExt},
};

pub const USERS_PATH: &str = "/admin/users";

#[derive(Template)]
#[template(path = "admin_users.html")]
struct AdminUsersTemplate {
    users: Vec<UserSummary>,
    message: String,
}

#[derive(Deserialize)]
pub struct UsersQuery {
    cleaned: Option<u64>,
}

// GET /admin/users - User list
pub async fn users_page(
    _admin_user: AdminUser,
    State(state): State<Arc<crate::AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Html<String>, AppError> {
    let users = db::list_users(&state.db_pool).await.db_err()?;

    let message = query
        .cleaned
        .map(|n| format!("Cleaned up {} expired sessions", n))
        .unwrap_or_default();

    let template = AdminUsersTemplate { users, message };
    Ok(Html(template.render()?))
}

// POST /admin/sessions/cleanup - Clean up expired sessions
pub async fn cleanup_sessions(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<crate::AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = db::cleanup_expired_sessions(&state.db_pool).await.db_err()?;

    tracing::info!(admin = %admin.login, deleted, "Expired sessions cleaned up");
    Ok(Redirect::to(&format!("{}?cleaned={}", USERS_PATH, deleted)))
}
