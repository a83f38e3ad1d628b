//! A small in-memory back office speaking the same REST API as production.
//! Used for local development of the admin client and by the integration
//! tests.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod store;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use auth::SessionKeys;
pub use store::{Resource, Store};

use crate::config;
use auth::SessionUser;
use handlers::{BulkUpdateBody, PageQuery};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub keys: SessionKeys,
}

impl AppState {
    pub fn new(store: Store, keys: SessionKeys) -> Self {
        Self { store: Arc::new(store), keys }
    }
}

impl Resource {
    /// Path prefix the admin pages use for this resource
    pub fn prefix(&self) -> &'static str {
        match self {
            Resource::Orders => "/admin/order",
            Resource::Products => "/admin/product",
            Resource::Laminates => "/admin/product/laminate",
            Resource::Carvings => "/admin/product/carving",
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .merge(user_routes());
    for resource in Resource::ALL {
        router = router.merge(resource_routes(resource));
    }

    let router = router.layer(TraceLayer::new_for_http());
    let router = if config::config().server.enable_cors { router.layer(CorsLayer::permissive()) } else { router };
    router.with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        // Session management
        .route("/admin/user/login", post(handlers::login))
        .route("/admin/user/auth", get(handlers::current_user))
        .route("/admin/user/logout", post(handlers::logout))
        // Account management (admin only)
        .route("/admin/user/list", get(handlers::list_users))
        .route("/admin/user/bulk-update", post(handlers::update_users))
        .route("/admin/user/signup", post(handlers::signup))
}

fn resource_routes(resource: Resource) -> Router<AppState> {
    let prefix = resource.prefix();
    Router::new()
        .route(
            &format!("{}/get/table", prefix),
            get(move |state: State<AppState>, session: SessionUser, query: Query<PageQuery>| {
                handlers::table(state, session, query, resource)
            }),
        )
        .route(
            &format!("{}/get/filter", prefix),
            get(move |state: State<AppState>, session: SessionUser, query: Query<HashMap<String, String>>| {
                handlers::filter(state, session, query, resource)
            }),
        )
        .route(
            &format!("{}/bulk-update", prefix),
            post(move |state: State<AppState>, session: SessionUser, body: Json<BulkUpdateBody>| {
                handlers::bulk_update(state, session, body, resource)
            }),
        )
}

/// Serve `state` on an already bound listener until the task is dropped
pub async fn serve_on(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Bind `0.0.0.0:port` and serve a freshly seeded store
pub async fn serve(port: u16, keys: SessionKeys) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    tracing::info!("back office listening on http://{}", bind_addr);
    serve_on(listener, AppState::new(Store::seeded(), keys)).await
}
