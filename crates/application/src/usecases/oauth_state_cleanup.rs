use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

use domain::{
    errors::OAuthFlowError,
    repositories::oauth_states::OAuthStateRepository,
    value_objects::oauth_states::OAuthStateSweepResult,
};

#[derive(Debug, Clone, Default)]
pub struct OAuthStateCleanupParams {
    /// Extra seconds a state is kept after it expired.
    pub grace_seconds: i64,
    pub limit: Option<i64>,
}

/// Purges expired OAuth states. The store has no TTL, so this runs on a schedule.
pub struct OAuthStateCleanupUseCase<T>
where
    T: OAuthStateRepository + Send + Sync,
{
    oauth_state_repository: Arc<T>,
}

impl<T> OAuthStateCleanupUseCase<T>
where
    T: OAuthStateRepository + Send + Sync,
{
    pub fn new(oauth_state_repository: Arc<T>) -> Self {
        Self {
            oauth_state_repository,
        }
    }

    pub async fn run(&self, params: OAuthStateCleanupParams) -> Result<OAuthStateSweepResult> {
        let cutoff = Duration::try_seconds(params.grace_seconds.max(0))
            .and_then(|grace| Utc::now().checked_sub_signed(grace))
            .ok_or(OAuthFlowError::ExpiryOutOfRange {
                seconds: params.grace_seconds,
            })?;
        let limit = params.limit.filter(|l| *l > 0);

        let deleted = self
            .oauth_state_repository
            .delete_expired(cutoff, limit)
            .await?;

        if deleted > 0 {
            info!(deleted, cutoff = %cutoff, "oauth_state_cleanup: expired states removed");
        }

        Ok(OAuthStateSweepResult {
            deleted,
            cutoff: Some(cutoff),
        })
    }
}
