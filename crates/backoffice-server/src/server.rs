use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{delete, get, post, put},
};
use backoffice_auth::{AuthState, ConfigError, UserStorage, http as auth_http};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    api,
    bootstrap::bootstrap_users,
    cache::Cache,
    config::{AppConfig, CacheConfig},
    create_cache, handlers, middleware as app_middleware,
    storage::InMemoryUserStorage,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub cache: Cache,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStorage>,
        cache: Cache,
    ) -> Result<Self, ConfigError> {
        let auth = AuthState::new(config.auth.clone(), users)?;
        Ok(Self {
            auth,
            cache,
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Cache {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserStorage> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.user_storage.clone()
    }
}

impl FromRef<AppState> for CacheConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.cache.clone()
    }
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    Router::new()
        // Health
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Session
        .route("/auth/sign-in", post(auth_http::sign_in_handler))
        .route("/auth/sign-out", post(auth_http::sign_out_handler))
        .route("/auth/session", get(auth_http::session_handler))
        .route("/auth/refresh", post(auth_http::refresh_handler))
        // Directory
        .route("/api/users", get(api::list_users))
        .route("/api/users/{id}", get(api::get_user))
        .route("/api/users/{id}/role", put(api::update_user_role))
        .route("/api/cache", delete(api::clear_cache))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        // Outermost, so the trace span sees the id.
        .layer(middleware::from_fn(app_middleware::request_id))
        .with_state(state)
}

pub struct BackofficeServer {
    addr: SocketAddr,
    app: Router,
    cache: Cache,
}

impl BackofficeServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Binds the configured address and serves until Ctrl+C.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` resolves, then closes the cache.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await;
        self.cache.close();
        result?;
        Ok(())
    }
}

#[derive(Default)]
pub struct ServerBuilder {
    config: AppConfig,
    users: Option<Arc<dyn UserStorage>>,
    cache: Option<Cache>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_user_storage(mut self, users: Arc<dyn UserStorage>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Seeds bootstrap users, connects the cache and assembles the router.
    pub async fn build(self) -> anyhow::Result<BackofficeServer> {
        let config = self.config;
        config.validate().map_err(anyhow::Error::msg)?;

        let users: Arc<dyn UserStorage> = match self.users {
            Some(users) => users,
            None => Arc::new(InMemoryUserStorage::new()),
        };
        let stats = bootstrap_users(&config.bootstrap, users.as_ref()).await?;
        tracing::info!(
            created = stats.created,
            skipped = stats.skipped,
            "Bootstrap users processed"
        );

        let cache = match self.cache {
            Some(cache) => cache,
            None => create_cache(&config.redis).await,
        };

        let addr = config.addr();
        let state = AppState::new(config, users, cache.clone())?;
        Ok(BackofficeServer {
            addr,
            app: build_app(state),
            cache,
        })
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
