// Authentication module

pub mod middleware;

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/access/login";
/// Where signed-in users without the required role are sent
pub const ACCESS_DENIED_PATH: &str = "/access/denied";
pub const LOGOUT_PATH: &str = "/access/logout";
/// Landing page after a successful login
pub const HOME_PATH: &str = "/home";

pub const SESSION_COOKIE: &str = "session_id";
pub const SESSION_HOURS: i64 = 8;

// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).context("Failed to hash password")
}

// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    verify(password, hash).context("Failed to verify password")
}

/// Only same-site absolute paths are accepted as post-login targets
pub fn safe_return_path(candidate: Option<&str>) -> &str {
    match candidate {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.contains("://") =>
        {
            path
        }
        _ => HOME_PATH,
    }
}
