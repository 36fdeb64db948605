use anyhow::Result;
use application::usecases::{
    oauth_state_cleanup::OAuthStateCleanupUseCase, schema_migration::SchemaMigrationUseCase,
};
use infra::postgres::{
    postgres_connection::{self, PoolSettings},
    repositories::{oauth_states::OAuthStatePostgres, schema::SchemaPostgres},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use worker::{config, services::oauth_state_sweeper};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // No subscriber exists yet if this fails, so `error!` would go nowhere.
    if let Err(error) = infra::observability::init_observability("worker") {
        eprintln!("Worker failed to initialise tracing: {:#}", error);
        std::process::exit(1);
    }

    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    // `worker migrate` applies migrations, verifies the tables and exits.
    let migrate_only = std::env::args().nth(1).as_deref() == Some("migrate");

    let dotenvy_env = config::config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection_with(
        &dotenvy_env.database.url,
        PoolSettings {
            max_size: dotenvy_env.database.max_connections,
            ..PoolSettings::default()
        },
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    if migrate_only || dotenvy_env.migrations.run_on_start {
        let schema_usecase =
            SchemaMigrationUseCase::new(Arc::new(SchemaPostgres::new(Arc::clone(&db_pool_arc))));
        let report = schema_usecase.run().await?;
        info!(
            applied = report.applied.len(),
            tables = ?report.verified_tables,
            "Schema is up to date"
        );
    } else {
        warn!("RUN_MIGRATIONS is off; skipping schema migration");
    }

    if migrate_only {
        return Ok(());
    }

    let cleanup_usecase = Arc::new(OAuthStateCleanupUseCase::new(Arc::new(
        OAuthStatePostgres::new(Arc::clone(&db_pool_arc)),
    )));

    let sweeper = tokio::spawn(oauth_state_sweeper::run_sweeper(
        cleanup_usecase,
        dotenvy_env.oauth_state_sweep.clone(),
    ));

    tokio::select! {
        result = sweeper => result??,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
    };

    Ok(())
}
