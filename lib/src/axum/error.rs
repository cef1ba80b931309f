use axum::response::{Html, IntoResponse, Redirect, Response};
use http::StatusCode;

use crate::axum::askama::HtmlTemplate;
use crate::axum::auth::login::LoginPage;
use crate::{routes, Error, ErrorKind};

/// Implements conversion into html response for all possible error variants.
///
/// Only messages written for the operator are ever part of the response.
/// Relay errors, hashes, backtraces and the like are only available through
/// the application logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.kind {
            ErrorKind::BadInput(msg) => {
                tracing::trace!("{}", self);
                (StatusCode::BAD_REQUEST, Html(msg.clone())).into_response()
            }
            ErrorKind::InvalidCredentials => {
                tracing::debug!("{}", self);
                (
                    StatusCode::UNAUTHORIZED,
                    HtmlTemplate(LoginPage {
                        error: Some("Invalid username or password".to_string()),
                    }),
                )
                    .into_response()
            }
            ErrorKind::AuthFailed(_) | ErrorKind::FailedGettingTokenCookie(_) => {
                tracing::debug!("{}", self);
                Redirect::to(routes::LOGIN).into_response()
            }
            ErrorKind::SubscriberRetrieval(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("Failed to retrieve subscribers"),
                )
                    .into_response()
            }
            _ => {
                tracing::error!("{}", self);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
