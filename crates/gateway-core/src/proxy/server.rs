use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use gateway_types::models::GatewayConfig;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::proxy::credential_pool::CredentialPool;
use crate::proxy::dispatcher::RequestDispatcher;
use crate::proxy::handlers;
use crate::proxy::middleware::{admin_auth_middleware, auth_middleware, cors_layer, AccessKeys};
use crate::proxy::persistence::PersistenceWorker;
use crate::proxy::upstream::UpstreamClient;

/// Axum application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RequestDispatcher,
    pub pool: Arc<CredentialPool>,
    /// Absent when the gateway runs without a flush loop (tests)
    pub persistence: Option<Arc<PersistenceWorker>>,
    /// Base model names advertised on the list routes
    pub models: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(
        config: &GatewayConfig,
        pool: Arc<CredentialPool>,
        upstream: Arc<UpstreamClient>,
        persistence: Option<Arc<PersistenceWorker>>,
    ) -> Self {
        let dispatcher = RequestDispatcher::from_config(config, pool.clone(), upstream);
        Self { dispatcher, pool, persistence, models: Arc::new(config.models.clone()) }
    }
}

/// Full router: proxy routes behind the API key, admin routes behind the
/// admin key, `/healthz` open.
pub fn build_proxy_router(state: AppState, config: &GatewayConfig) -> Router<()> {
    let keys = Arc::new(AccessKeys::new(
        config.server.api_key.clone(),
        config.server.admin_key.clone(),
    ));

    let proxy = Router::new()
        // OpenAI Protocol
        .route("/v1/models", get(handlers::openai::handle_list_models))
        .route("/v1/chat/completions", post(handlers::openai::handle_chat_completions))
        // Native Protocol
        .route("/v1/models/*model_action", post(handlers::gemini::handle_model_action))
        .route("/v1beta/models", get(handlers::gemini::handle_list_models))
        .route(
            "/v1beta/models/*model_action",
            get(handlers::gemini::handle_get_model).post(handlers::gemini::handle_model_action),
        )
        .route("/healthz", get(handlers::health::handle_healthz))
        .layer(axum::middleware::from_fn_with_state(keys.clone(), auth_middleware));

    let admin = Router::new()
        .route(
            "/admin/credentials",
            get(handlers::admin::handle_list_credentials).post(handlers::admin::handle_upsert_credential),
        )
        .route("/admin/credentials/:id", delete(handlers::admin::handle_delete_credential))
        .route("/admin/credentials/:id/disable", post(handlers::admin::handle_disable_credential))
        .route("/admin/credentials/:id/enable", post(handlers::admin::handle_enable_credential))
        .route("/admin/credentials/:id/verify", post(handlers::admin::handle_verify_credential))
        .route("/admin/persistence/flush", post(handlers::admin::handle_flush))
        .layer(axum::middleware::from_fn_with_state(keys, admin_auth_middleware));

    proxy
        .merge(admin)
        .layer(DefaultBodyLimit::max(config.server.body_limit_mb * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.server.port))
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(
    router: Router<()>,
    config: &GatewayConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = config.server.get_socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("✅ Gateway listening on http://{}", addr);
    axum::serve(listener, router).with_graceful_shutdown(shutdown).await
}
