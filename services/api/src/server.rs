use crate::cli::ServeArgs;
use crate::infra::{seeded_store, AppState};
use crate::routes::with_operational_routes;
use aats::config::AppConfig;
use aats::error::AppError;
use aats::recruitment::{RecruitmentRepositories, RecruitmentService, SystemClock};
use aats::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let store = seeded_store().await?;
    let service = Arc::new(RecruitmentService::from_config(
        RecruitmentRepositories::from_store(store),
        &config.recruitment,
        Arc::new(SystemClock),
    ));

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_active = config.recruitment.policy.max_active_applications,
        store_timeout_ms = config.recruitment.store_timeout.as_millis() as u64,
        "applicant tracking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
