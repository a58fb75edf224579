use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::services::{
    AttemptLimiter, CacheError, CacheStore, ComplaintSource, InMemoryAttemptLimiter,
    InMemoryCacheStore, InMemoryComplaintSource, ReportService,
};
use persistence::{PgAttemptLimiter, PgCacheStore, PgComplaintSource};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CacheBackend, Config, DataSource};
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_viewer,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{auth, cache, complaints, health, predictions, reports};
use crate::services::HttpCacheClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: JwtConfig,
    pub reports: ReportService,
    pub attempts: Arc<dyn AttemptLimiter>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    /// Present when any provider is backed by PostgreSQL.
    pub pool: Option<PgPool>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{0} requires a database pool")]
    MissingPool(&'static str),

    #[error("Cache client: {0}")]
    Cache(#[from] CacheError),

    #[error("JWT configuration: {0}")]
    Jwt(#[from] JwtError),
}

/// Data, cache and login-attempt providers the app runs on.
#[derive(Clone)]
pub struct Providers {
    pub source: Arc<dyn ComplaintSource>,
    pub cache: Arc<dyn CacheStore>,
    pub attempts: Arc<dyn AttemptLimiter>,
    pub pool: Option<PgPool>,
}

impl Providers {
    /// Empty in-memory providers.
    pub fn in_memory() -> Self {
        Self {
            source: Arc::new(InMemoryComplaintSource::default()),
            cache: Arc::new(InMemoryCacheStore::new()),
            attempts: Arc::new(InMemoryAttemptLimiter::new()),
            pool: None,
        }
    }

    /// Providers selected by `data_source` and `cache.backend`.
    ///
    /// `pool` must be given when either needs PostgreSQL.
    pub fn from_config(config: &Config, pool: Option<PgPool>) -> Result<Self, StartupError> {
        let mut providers = Self::in_memory();

        if config.data_source == DataSource::Postgres {
            let pool = pool.clone().ok_or(StartupError::MissingPool("postgres data source"))?;
            providers.source = Arc::new(PgComplaintSource::new(pool.clone()));
            providers.attempts = Arc::new(PgAttemptLimiter::new(pool));
        }

        providers.cache = match config.cache.backend {
            CacheBackend::Memory => providers.cache,
            CacheBackend::Database => {
                let pool = pool.clone().ok_or(StartupError::MissingPool("database cache"))?;
                Arc::new(PgCacheStore::new(pool))
            }
            CacheBackend::Remote => Arc::new(HttpCacheClient::new(&config.cache)?),
        };

        providers.pool = pool;
        Ok(providers)
    }

    pub fn with_source(mut self, source: Arc<dyn ComplaintSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }
}

pub fn create_app(config: Config, providers: Providers) -> Result<Router, StartupError> {
    let config = Arc::new(config);

    // Create rate limiter if rate limiting is enabled (rate_limit_per_minute > 0)
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        config: config.clone(),
        jwt: JwtConfig::new(&config.jwt.secret, config.jwt.leeway_secs)?,
        reports: ReportService::new(providers.source, providers.cache),
        attempts: providers.attempts,
        rate_limiter,
        pool: providers.pool,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Viewer routes. Middleware order: auth runs first, then rate limiting
    // (which keys on the viewer).
    let protected_routes = Router::new()
        .route("/api/v1/reports/dashboard", get(reports::dashboard))
        .route("/api/v1/reports/escalations", get(reports::escalations))
        .route("/api/v1/reports/complaints", get(reports::complaints))
        .route("/api/v1/reports/feedback", get(reports::feedback))
        .route("/api/v1/reports/user-activity", get(reports::user_activity))
        .route("/api/v1/reports/:kind/export", get(reports::export))
        .route(
            "/api/v1/complaints/:id/status",
            patch(complaints::update_status),
        )
        .route("/api/v1/predict-trends", get(predictions::predict_trends))
        .route("/api/v1/cache", post(cache::handle))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_viewer));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route(
            "/api/v1/auth/login-attempts",
            post(auth::record_login_attempt),
        )
        .route(
            "/api/v1/auth/login-attempts/lockout",
            get(auth::lockout_status),
        )
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
