//! Application boot sequence: configuration, telemetry, store, pipeline.

use std::sync::Arc;

use arkiva_config::Settings;
use arkiva_pipeline::PipelineEngine;
use arkiva_store::PgStore;
use arkiva_telemetry::{LoggingConfig, Metrics, build_sha, init_logging};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{AppError, AppResult};

/// Dependencies required to run the relocation pipeline.
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    settings: Settings,
    store: Arc<PgStore>,
    metrics: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment for the
    /// binary entrypoint.
    pub(crate) async fn from_env() -> AppResult<Self> {
        let logging = LoggingConfig::default();
        let settings =
            Settings::from_env().map_err(|err| AppError::config("settings.from_env", err))?;
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

        let pool = PgPoolOptions::new()
            .connect(&settings.database_url)
            .await
            .map_err(|err| AppError::database("pool.connect", err))?;
        let store = Arc::new(
            PgStore::new(pool)
                .await
                .map_err(|err| AppError::store("store.new", err))?,
        );

        Ok(Self {
            logging,
            settings,
            store,
            metrics,
        })
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or pipeline execution fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env().await?;
    run_app_with(dependencies).await
}

/// Boot sequence over injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    let BootstrapDependencies {
        logging: _,
        settings,
        store,
        metrics,
    } = dependencies;
    info!(
        build_sha = build_sha(),
        source_dir = %settings.source_dir.display(),
        library_root = %settings.library_root.display(),
        batch_size = settings.batch_size,
        "relocation pipeline starting"
    );

    let engine = PipelineEngine::new(settings, store, metrics);
    let mut runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run().await })
    };

    let joined = tokio::select! {
        joined = &mut runner => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, draining queues and stopping");
            engine.shutdown();
            (&mut runner).await
        }
    };
    let report = joined
        .map_err(|err| AppError::join("pipeline.run", err))?
        .map_err(|err| AppError::pipeline("pipeline.run", err))?;

    info!(
        files_enqueued = report.files_enqueued,
        files_moved = report.files_moved,
        "relocation pipeline finished"
    );
    Ok(())
}
