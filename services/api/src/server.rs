use crate::cli::ServeArgs;
use crate::infra::{occupation_routes, tenancy_service, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use visa_pathways::config::AppConfig;
use visa_pathways::error::AppError;
use visa_pathways::occupations::TableKind;
use visa_pathways::telemetry;

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

    let occupations = occupation_routes(&config.data)?;
    for table in TableKind::ALL {
        match occupations.directory.source().url(table) {
            Some(url) => info!(%table, %url, "remote occupation table"),
            None => info!(%table, "using bundled occupation table"),
        }
    }
    // Warm the cache so the first lookup does not pay for the fetch. A failure here is retried on
    // the next request.
    if let Err(err) = occupations.directory.snapshot().await {
        warn!(error = %err, "occupation tables unavailable at startup");
    }

    let app = with_service_routes(tenancy_service(), occupations)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "visa pathways service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
