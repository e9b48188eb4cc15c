use crate::cli::ServeArgs;
use crate::infra::{demo_backend, AppState};
use crate::routes::with_funnel_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use quickcash::backend::InMemoryBackend;
use quickcash::config::AppConfig;
use quickcash::error::AppError;
use quickcash::session::SessionContext;
use quickcash::telemetry;
use quickcash::workflows::status::SessionStatusResolver;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if !config.backend.is_configured() {
        warn!(
            backend = ?config.backend,
            "hosted backend not configured, serving from the in-memory backend"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let backend = if args.seed_demo {
        demo_backend(true)
    } else {
        Arc::new(InMemoryBackend::new())
    };
    let session = SessionContext::attach(backend.as_ref()).await?;
    let resolver = Arc::new(SessionStatusResolver::new(
        backend.clone(),
        backend,
        session.context().clone(),
    ));

    let app = with_funnel_routes(resolver)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded = args.seed_demo, "quickcash funnel ready");

    axum::serve(listener, app).await?;
    Ok(())
}
