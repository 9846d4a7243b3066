// Error handling for the EMSI back office

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::fmt;

use crate::auth::{ACCESS_DENIED_PATH, LOGIN_PATH};
use crate::db::{connection::ConnectionError, store::SchemaStrategy};

/// Fatal errors raised while bringing the process up. None of these are
/// recovered; `main` logs them and exits.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("failed to open database connection")]
    Connect(#[source] sqlx::Error),

    #[error("schema initialization failed ({strategy})")]
    SchemaInitialization {
        strategy: SchemaStrategy,
        #[source]
        source: sqlx::Error,
    },

    #[error("seed data failure while {context}")]
    SeedData {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to hash bootstrap administrator password: {0}")]
    AdminCredential(String),
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    TemplateRender(String),
    /// Carries the path to come back to after login
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::TemplateRender(msg) => write!(f, "Template rendering error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Implement IntoResponse so Axum can convert errors to HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(return_path) => {
                let redirect_url = if return_path.is_empty() || return_path == "/" {
                    LOGIN_PATH.to_string()
                } else {
                    format!("{}?ReturnUrl={}", LOGIN_PATH, urlencoding::encode(&return_path))
                };
                return Redirect::to(&redirect_url).into_response();
            }
            AppError::Forbidden(reason) => {
                tracing::info!(%reason, "Access denied");
                return Redirect::to(ACCESS_DENIED_PATH).into_response();
            }
            AppError::TemplateRender(msg) => {
                tracing::error!(error = %msg, "Template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "The page could not be rendered.".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.".to_string())
            }
        };

        let error_html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Error - EMSI</title>
    <link rel="stylesheet" href="/static/site.css">
</head>
<body class="centered">
    <h1>{}</h1>
    <p>{}</p>
    <p><a href="{}">Return to login</a></p>
</body>
</html>"#,
            status.as_str(),
            message,
            LOGIN_PATH
        );

        (status, Html(error_html)).into_response()
    }
}

// Helper to convert template errors
impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::TemplateRender(err.to_string())
    }
}

// Extension trait for database result handling
pub trait DbResultExt<T> {
    /// Convert database errors to AppError::Internal with "Database error: " prefix
    fn db_err(self) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> DbResultExt<T> for Result<T, E> {
    fn db_err(self) -> Result<T, AppError> {
        self.map_err(|e| AppError::Internal(format!("Database error: {}", e)))
    }
}
