// Authentication and authorization extractors

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::db::{self, seed::{ADMINISTRATOR_ROLE, SUPERVISOR_ROLE}, User};
use crate::error::AppError;

use super::SESSION_COOKIE;

/// Roles allowed into the administration pages
pub const ADMIN_ROLES: [&str; 2] = [ADMINISTRATOR_ROLE, SUPERVISOR_ROLE];

fn return_to(parts: &Parts) -> AppError {
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    AppError::Unauthorized(path.to_string())
}

// Extractor for current authenticated user
// Usage: async fn handler(current_user: CurrentUser) { ... }
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<crate::AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<crate::AppState>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let session_cookie = jar.get(SESSION_COOKIE).ok_or_else(|| return_to(parts))?;

        let user_id = db::validate_session(&app_state.db_pool, session_cookie.value())
            .await
            .map_err(|e| AppError::Internal(format!("Session validation error: {}", e)))?
            .ok_or_else(|| return_to(parts))?;

        let user = db::get_user_by_id(&app_state.db_pool, user_id)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {}", e)))?
            .ok_or_else(|| return_to(parts))?;

        Ok(CurrentUser(user))
    }
}

// Extractor for Administrator or Supervisor users
// Signed-in users without either role are sent to the access-denied page
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<crate::AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.has_any_role(&ADMIN_ROLES) {
            return Err(AppError::Forbidden(format!(
                "user '{}' lacks an administrator role",
                user.login
            )));
        }

        Ok(AdminUser(user))
    }
}
