//! FriendRec API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and per-member rate limiting
//! - Request routing to the recommendation engine
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{extract::FromRef, routing::get, Router};
use friendrec_common::{
    auth::JwtManager,
    cache::{Cache, CacheConfig},
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    errors::AppError,
    metrics,
};
use friendrec_recommend::{
    stores::{DbMemberDirectory, RedisGraphStore, RedisInteractionStore},
    RecommendationService,
};
use handlers::health::ReadinessProbe;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use middleware::rate_limit::MemberRateLimiter;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: RecommendationService,
    pub jwt: Arc<JwtManager>,
    pub limiter: Option<Arc<MemberRateLimiter>>,
    pub probes: Arc<Vec<Arc<dyn ReadinessProbe>>>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (also reads .env)
    let config = AppConfig::load()?;
    let config = Arc::new(config);

    init_tracing(&config.observability);

    info!("Starting FriendRec API Gateway v{}", friendrec_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    init_metrics_exporter(&config.observability)?;

    // Member directory
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db.clone());

    // Friend graph and interaction scores
    info!("Connecting to Redis...");
    let cache = Arc::new(Cache::new(CacheConfig::from(&config.redis)).await?);

    let service = RecommendationService::new(
        Arc::new(RedisGraphStore::new(cache.clone())),
        Arc::new(RedisInteractionStore::new(cache.clone())),
        Arc::new(DbMemberDirectory::new(repo)),
        config.recommend.clone(),
    );

    let secret = config.auth.jwt_secret.as_deref().ok_or_else(|| AppError::Configuration {
        message: "auth.jwt_secret is required".to_string(),
    })?;
    let jwt = Arc::new(JwtManager::new(secret, config.auth.jwt_expiration_secs));

    let probes: Vec<Arc<dyn ReadinessProbe>> = vec![
        Arc::new(db) as Arc<dyn ReadinessProbe>,
        cache as Arc<dyn ReadinessProbe>,
    ];

    let limiter = MemberRateLimiter::from_config(&config.rate_limit)?;
    if let Some(limiter) = &limiter {
        let every = Duration::from_secs(config.rate_limit.prune_interval_secs.max(1));
        limiter.spawn_pruner(every);
    }

    // Create app state
    let state = AppState {
        config: config.clone(),
        service,
        jwt,
        limiter,
        probes: Arc::new(probes),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    if serve(listener, app, shutdown_signal(), config.shutdown_timeout()).await? {
        info!("Server shutdown complete");
    }
    Ok(())
}

/// Serve until `shutdown` resolves, then give in-flight requests `grace` to drain.
/// Returns false when the grace period ran out first.
async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> std::io::Result<bool> {
    let (tx, mut rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = tx.send(true);
        })
        .into_future();

    let deadline = async move {
        if rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result.map(|_| true),
        _ = deadline => {
            warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed, dropping open connections");
            Ok(false)
        }
    }
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Serve Prometheus metrics on the configured port; 0 disables the exporter
fn init_metrics_exporter(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.metrics_port == 0 {
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install()?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Recommendation endpoints
        .route("/recommendations", get(handlers::recommendations::get_recommendations));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use friendrec_recommend::stores::{MemoryDirectory, MemoryGraphStore, MemoryInteractionStore};
    use tokio::io::AsyncWriteExt;
    use tower::ServiceExt;

    struct DownProbe;

    #[async_trait::async_trait]
    impl ReadinessProbe for DownProbe {
        fn name(&self) -> &'static str {
            "redis"
        }

        async fn ping(&self) -> friendrec_common::Result<()> {
            Err(AppError::CacheError {
                message: "connection refused".to_string(),
            })
        }
    }

    fn state(probes: Vec<Arc<dyn ReadinessProbe>>) -> AppState {
        AppState {
            config: Arc::new(AppConfig::default()),
            service: RecommendationService::new(
                Arc::new(MemoryGraphStore::new()),
                Arc::new(MemoryInteractionStore::new()),
                Arc::new(MemoryDirectory::new()),
                Default::default(),
            ),
            jwt: Arc::new(JwtManager::new("test_secret", 3600)),
            limiter: None,
            probes: Arc::new(probes),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(state(vec![]))
            .oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_reports_down_dependency() {
        let response = create_router(state(vec![Arc::new(DownProbe)]))
            .oneshot(Request::builder().uri("/v1/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_shutdown_is_bounded_by_grace_period() {
        let app = Router::new().route("/hang", get(|| std::future::pending::<&'static str>()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            app,
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_millis(100),
        ));

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /hang HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop_tx.send(()).unwrap();

        let drained = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("serve outlived its grace period")
            .unwrap()
            .unwrap();
        assert!(!drained);
    }

    #[tokio::test]
    async fn test_idle_shutdown_completes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let drained = serve(listener, Router::new(), async {}, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(drained);
    }
}
