use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAgentDirectory, InMemoryCategoryRepository, InMemoryHouseRepository,
};
use crate::routes::with_house_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use house_renting::config::AppConfig;
use house_renting::error::AppError;
use house_renting::listings::HouseCatalogueService;
use house_renting::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let agents = InMemoryAgentDirectory::default();
    for user_id in &args.agents {
        match agents.register(user_id) {
            Ok(agent_id) => info!(%user_id, %agent_id, "registered agent"),
            Err(err) => warn!(%user_id, error = %err, "agent registration skipped"),
        }
    }

    let catalogue = Arc::new(HouseCatalogueService::new(
        Arc::new(InMemoryHouseRepository::default()),
        Arc::new(agents),
        Arc::new(InMemoryCategoryRepository::default()),
        config.listings.clone(),
    ));

    let app = with_house_routes(catalogue)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "house renting service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
