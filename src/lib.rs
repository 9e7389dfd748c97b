pub mod appresult;
pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod matching;
pub mod messages;
pub mod models;
pub mod realtime;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};

use auth::TokenVerifier;
use directory::SqliteDirectory;
use matching::MatchQueryService;
use messages::{MessageService, SqliteMessageStore};
use realtime::{ChannelRegistry, JoinPolicy, SessionGateway};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub matches: MatchQueryService,
    pub messages: MessageService,
    pub gateway: SessionGateway,
    pub tokens: TokenVerifier,
}

impl AppState {
    /// Wires every service over one pool and one channel registry.
    pub fn new(db_pool: SqlitePool, tokens: TokenVerifier) -> Self {
        let directory = Arc::new(SqliteDirectory::new(db_pool.clone()));
        let channels = Arc::new(ChannelRegistry::new());
        let gateway = SessionGateway::new(tokens.clone(), channels);

        AppState {
            matches: MatchQueryService::new(directory.clone(), directory.clone()),
            messages: MessageService::new(
                Arc::new(SqliteMessageStore::new(db_pool)),
                directory,
                gateway.delivery().clone(),
            ),
            gateway,
            tokens,
        }
    }

    pub fn with_join_policy(mut self, join_policy: JoinPolicy) -> Self {
        self.gateway = self.gateway.with_join_policy(join_policy);
        self
    }
}

pub fn app(app_state: AppState, session_idle: time::Duration) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_idle));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/session", post(auth::bind_session))
        .route("/logout", post(auth::logout))
        .route("/ws", get(realtime::ws::realtime_ws))
        .nest("/matches", matching::router())
        .nest("/messages", messages::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
