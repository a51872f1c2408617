use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, AppState};
use crate::routes::with_allotment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hostel_allot::config::AppConfig;
use hostel_allot::error::AppError;
use hostel_allot::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (service, _repository) = in_memory_service(config.allotment);
    let cancel = service.cancellation_handle();
    let app = with_allotment_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        category_cutoff = config.allotment.category_cutoff,
        order = %config.allotment.order,
        "hostel allotment service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag, cancel))
        .await?;
    Ok(())
}

/// Waits for Ctrl-C, then stops readiness and halts any in-flight run before its next student.
async fn shutdown_signal(readiness: Arc<AtomicBool>, cancel: Arc<AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
    readiness.store(false, Ordering::Release);
    cancel.store(true, Ordering::Release);
}
