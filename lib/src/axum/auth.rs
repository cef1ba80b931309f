use axum::routing::get;

use crate::routes;

use super::Router;

pub mod login;

pub fn router() -> Router {
    Router::new()
        .route(routes::LOGIN, get(login::login_page).post(login::login))
        .route(routes::LOGOUT, get(login::logout))
}
