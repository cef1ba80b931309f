use askama::Template;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Form};

use crate::email::list::SubscriberStore;
use crate::error::{ErrorKind, Result};
use crate::{routes, Broadcast};

use super::askama::HtmlTemplate;
use super::{DbExt, DispatcherExt, Operator, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::HOME, get(index))
        .route(
            routes::SEND_UPDATE,
            get(send_update_page).post(send_update),
        )
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexPage {
    operator: String,
    emails: Vec<String>,
}

#[derive(Template)]
#[template(path = "pages/send_update.html")]
pub struct SendUpdatePage {
    message: Option<String>,
}

/// Lists the current subscribers.
pub async fn index(operator: Operator, Extension(db): DbExt) -> Result<Response> {
    let emails = db
        .list_subscriber_emails()
        .map_err(|e| ErrorKind::SubscriberRetrieval(e.kind.to_string()))?;

    Ok(HtmlTemplate(IndexPage {
        operator: operator.username,
        emails,
    })
    .into_response())
}

pub async fn send_update_page(_operator: Operator) -> Response {
    HtmlTemplate(SendUpdatePage { message: None }).into_response()
}

/// Sends the submitted newsletter to every subscriber and shows the outcome.
pub async fn send_update(
    operator: Operator,
    Extension(dispatcher): DispatcherExt,
    Form(broadcast): Form<Broadcast>,
) -> Result<Response> {
    tracing::info!(operator = %operator.username, "broadcast requested");
    let report = dispatcher.dispatch(&broadcast).await?;
    Ok(HtmlTemplate(SendUpdatePage {
        message: Some(report.to_string()),
    })
    .into_response())
}
