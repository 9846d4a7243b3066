// Login, logout and access-denied handlers

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    auth::{self, LOGIN_PATH, SESSION_COOKIE, SESSION_HOURS},
    db,
    error::{AppError, DbResultExt},
};

const INVALID_CREDENTIALS: &str = "Invalid user or password";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    error: &'a str,
    return_url: &'a str,
}

#[derive(Template)]
#[template(path = "denied.html")]
struct DeniedTemplate;

#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "ReturnUrl")]
    return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    login: String,
    password: String,
    #[serde(default)]
    return_url: String,
}

fn render_login(error: &str, return_url: &str) -> Result<Html<String>, AppError> {
    let template = LoginTemplate { error, return_url };
    Ok(Html(template.render()?))
}

// GET /access/login (also the default route) - Show login page
pub async fn login_page(Query(query): Query<LoginQuery>) -> Result<Html<String>, AppError> {
    let return_url = auth::safe_return_path(query.return_url.as_deref());
    render_login("", return_url)
}

// POST /access/login - Process login
pub async fn login_submit(
    jar: CookieJar,
    State(state): State<Arc<crate::AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let return_url = auth::safe_return_path(Some(form.return_url.as_str()));

    let credentials = db::get_user_credentials(&state.db_pool, form.login.trim())
        .await
        .db_err()?;

    let Some((user_id, password_hash)) = credentials else {
        tracing::info!(login = %form.login, "Login attempt for unknown user");
        return Ok(render_login(INVALID_CREDENTIALS, return_url)?.into_response());
    };

    let valid = auth::verify_password(&form.password, &password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        tracing::info!(user_id, "Login attempt with wrong password");
        return Ok(render_login(INVALID_CREDENTIALS, return_url)?.into_response());
    }

    let session_id = db::create_session(&state.db_pool, user_id, SESSION_HOURS)
        .await
        .map_err(|e| AppError::Internal(format!("Session creation error: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_HOURS))
        .build();

    tracing::info!(user_id, "User signed in");
    Ok((jar.add(cookie), Redirect::to(return_url)).into_response())
}

// POST /access/logout - Logout user
pub async fn logout(jar: CookieJar, State(state): State<Arc<crate::AppState>>) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = db::delete_session(&state.db_pool, session_cookie.value()).await {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);

    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

// GET /access/denied - Authorization failure landing page
pub async fn denied_page() -> Result<Html<String>, AppError> {
    Ok(Html(DeniedTemplate.render()?))
}
