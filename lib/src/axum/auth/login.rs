use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use axum_extra::extract::{CookieJar, PrivateCookieJar};

use crate::auth::{self, revocation_cookie, Sessions};
use crate::axum::askama::HtmlTemplate;
use crate::axum::{DbExt, Operator};
use crate::error::{ErrorKind, Result};
use crate::routes;

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// Shows the login form, or sends operators that are already logged in
/// straight to the home page.
pub async fn login_page(operator: Option<Operator>) -> Response {
    if operator.is_some() {
        return Redirect::to(routes::HOME).into_response();
    }
    HtmlTemplate(LoginPage { error: None }).into_response()
}

/// Processes login form data and sets the session cookie.
pub async fn login(
    Extension(db): DbExt,
    State(sessions): State<Sessions>,
    cookies: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(PrivateCookieJar, Redirect)> {
    if !auth::authenticate(&*db, &form.username, &form.password) {
        tracing::debug!(username = %form.username, "login rejected");
        return Err(ErrorKind::InvalidCredentials.into());
    }

    let cookie = sessions.cookie(&form.username)?;
    tracing::info!(username = %form.username, "operator logged in");

    Ok((cookies.add(cookie), Redirect::to(routes::HOME)))
}

/// Logout handler. Expires the session cookie and redirects to the login
/// page.
pub async fn logout(cookies: CookieJar) -> (CookieJar, Redirect) {
    (cookies.add(revocation_cookie()), Redirect::to(routes::LOGIN))
}
