use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use turnover::config::AppConfig;
use turnover::error::AppError;
use turnover::telemetry;
use turnover::workflows::import::CaseCsvImporter;
use turnover::workflows::turnover::{InMemoryCaseRepository, TurnoverService};

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

    let repository = Arc::new(InMemoryCaseRepository::default());
    let service = Arc::new(TurnoverService::new(repository, config.workflow));

    if let Some(path) = args.seed_csv.take() {
        let drafts = CaseCsvImporter::from_path(&path)?;
        let now = Utc::now();
        for draft in drafts {
            service.create(draft, "import", now)?;
        }
        info!(path = %path.display(), "seeded case store from CSV");
    }

    let app = with_case_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        auto_advance = config.workflow.auto_advance,
        "turnover case service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
