pub mod askama;
pub mod auth;
pub mod broadcast;
pub mod error;
pub mod extract;

pub use extract::Operator;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Extension;
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::auth::Sessions;
use crate::email::SmtpRelay;
use crate::{Config, Database, Dispatcher, Result};

/// Router carrying the session authority as state, so that the `Operator`
/// extractor can validate tokens.
pub type Router = axum::Router<Sessions>;

impl FromRef<Sessions> for Key {
    fn from_ref(sessions: &Sessions) -> Self {
        sessions.key().clone()
    }
}

pub type ConfigExt = Extension<Arc<Config>>;
pub type DbExt = Extension<Arc<Database>>;
pub type DispatcherExt = Extension<Arc<Dispatcher>>;

/// All the panel routes, without state.
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .merge(broadcast::router())
}

/// Assembles the application out of already initialized parts.
pub fn app(
    config: Config,
    db: Database,
    sessions: Sessions,
    dispatcher: Dispatcher,
) -> axum::Router {
    router()
        .layer(TraceLayer::new_for_http())
        // Register common state extension for all routes
        .layer(Extension(Arc::new(dispatcher)))
        .layer(Extension(Arc::new(db)))
        .layer(Extension(Arc::new(config)))
        .with_state(sessions)
}

/// Initializes application state and starts the web server.
///
/// Returns early with an error if anything required for safe operation is
/// missing, e.g. the session secret.
pub async fn start(config: Config) -> Result<()> {
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    let db = Database::open(&config.db_path)?;
    crate::init::initialize(&config, &db)?;

    let sessions = Sessions::new(&config.auth.secret_key)?;
    let relay = Arc::new(SmtpRelay::from_config(&config.email));
    let dispatcher = Dispatcher::from_config(&config, Arc::new(db.clone()), relay)?;

    let addr = config.address;
    let app = app(config, db, sessions, dispatcher);

    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await.map_err(|e| e.into())
}
