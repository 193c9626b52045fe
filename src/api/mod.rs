use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    MessageService, SeaOrmMessageService, SeaOrmUserService, UserService,
};

pub mod auth;
mod error;
mod messages;
mod users;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub users: Arc<dyn UserService>,

    pub messages: Arc<dyn MessageService>,
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let users = Arc::new(SeaOrmUserService::new(
        store.clone(),
        config.security.clone(),
    )) as Arc<dyn UserService>;

    let messages = Arc::new(SeaOrmMessageService::new(store.clone())) as Arc<dyn MessageService>;

    Ok(Arc::new(AppState {
        config,
        store,
        users,
        messages,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_minutes,
        )));

    let protected_routes = create_protected_router();

    let app_router = Router::new()
        .merge(protected_routes)
        .route("/", get(auth::home))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_origins = &state.config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app_router
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{id}", get(users::profile))
        .route("/users/{id}/following", get(users::following))
        .route("/users/{id}/followers", get(users::followers))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route("/messages/new", post(messages::create))
        .route_layer(middleware::from_fn(auth::require_user))
}
