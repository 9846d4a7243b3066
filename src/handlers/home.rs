// Landing page for signed-in users

use askama::Template;
use axum::response::Html;

use crate::{
    auth::middleware::{CurrentUser, ADMIN_ROLES},
    error::AppError,
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    full_name: String,
    login: String,
    roles: Vec<String>,
    is_admin: bool,
}

// GET /home
pub async fn home_page(CurrentUser(user): CurrentUser) -> Result<Html<String>, AppError> {
    let template = HomeTemplate {
        full_name: user.full_name(),
        is_admin: user.has_any_role(&ADMIN_ROLES),
        login: user.login,
        roles: user.roles,
    };
    Ok(Html(template.render()?))
}
