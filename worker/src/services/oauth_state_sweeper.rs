use anyhow::Result;
use application::usecases::oauth_state_cleanup::{
    OAuthStateCleanupParams, OAuthStateCleanupUseCase,
};
use domain::repositories::oauth_states::OAuthStateRepository;
use std::{sync::Arc, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::config::config_model::OAuthStateSweep;

pub async fn run_sweeper<T>(
    usecase: Arc<OAuthStateCleanupUseCase<T>>,
    config: OAuthStateSweep,
) -> Result<()>
where
    T: OAuthStateRepository + Send + Sync,
{
    info!(
        interval_seconds = config.interval_seconds,
        grace_seconds = config.grace_seconds,
        batch_limit = ?config.batch_limit,
        "OAuth state sweeper started"
    );

    let mut ticker = interval(Duration::from_secs(config.interval_seconds.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(&usecase, &config).await {
            error!("Error while sweeping expired OAuth states: {}", e);
        }
    }
}

pub async fn sweep_once<T>(
    usecase: &OAuthStateCleanupUseCase<T>,
    config: &OAuthStateSweep,
) -> Result<usize>
where
    T: OAuthStateRepository + Send + Sync,
{
    let result = usecase
        .run(OAuthStateCleanupParams {
            grace_seconds: config.grace_seconds,
            limit: config.batch_limit,
        })
        .await?;

    if result.deleted == 0 {
        debug!("No expired OAuth states found.");
    }
    Ok(result.deleted)
}
