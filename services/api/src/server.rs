use crate::cli::ServeArgs;
use crate::infra::{default_settings, AppState, InMemoryApplicationRepository};
use crate::routes::portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civic_portal::config::AppConfig;
use civic_portal::error::AppError;
use civic_portal::telemetry;
use civic_portal::workflows::housing::EligibilityConfig;
use civic_portal::workflows::zoning::ZoningWorkflowService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let zoning = Arc::new(ZoningWorkflowService::new(repository));
    let settings = default_settings();
    let eligibility = Arc::new(EligibilityConfig::from_settings(&settings)?);

    let app = portal_routes(zoning, eligibility, settings)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "civic portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
