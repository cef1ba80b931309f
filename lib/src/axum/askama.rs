use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::Error;

/// Renders the wrapped template into an html response.
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => Error::from(e).into_response(),
        }
    }
}
