use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use tracing::{info, warn};

use toolworks::config::AppConfig;
use toolworks::error::AppError;
use toolworks::telemetry;
use toolworks::workflows::rental::{
    InMemoryMovementLog, MemoryStore, MovementLog, RateTable, RentalService, RentalStore,
};

use crate::cli::ServeArgs;
use crate::infra::{default_rate_table, AppState};
use crate::routes::with_rental_routes;

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

    let store = Arc::new(MemoryStore::new());
    let movements = Arc::new(InMemoryMovementLog::default());
    let rates = Arc::new(default_rate_table());
    let service = Arc::new(RentalService::new(store, movements, rates));

    spawn_sweep_ticker(service.clone(), config.sweep.interval_secs);

    let app = with_rental_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tool rental service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

// The day fence inside the sweep makes the tick interval forgiving: firing
// more often than once a day only produces no-ops.
fn spawn_sweep_ticker<S, M, R>(service: Arc<RentalService<S, M, R>>, interval_secs: u64)
where
    S: RentalStore + 'static,
    M: MovementLog + 'static,
    R: RateTable + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let today = Local::now().date_naive();
            match service.run_overdue_sweep(today) {
                Ok(report) if report.skipped => {}
                Ok(report) => info!(
                    promoted = report.promoted,
                    refreshed = report.refreshed,
                    failed = report.failed.len(),
                    "scheduled overdue sweep completed"
                ),
                Err(err) => warn!(error = %err, "scheduled overdue sweep failed"),
            }
        }
    });
}
