use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use domain::{
    entities::{
        linkedin_tokens::{InsertLinkedInTokenEntity, LinkedInTokenEntity, RotateLinkedInTokenEntity},
        oauth_states::InsertOAuthStateEntity,
    },
    errors::OAuthFlowError,
    repositories::{linkedin_tokens::LinkedInTokenRepository, oauth_states::OAuthStateRepository},
    value_objects::{
        linkedin::{LinkedInConnectionStatus, TokenGrantModel},
        oauth_states::{generate_state, state_expires_at},
    },
};

/// Storage side of the LinkedIn authorization redirect and callback.
pub struct LinkedInOAuthUseCase<S, T>
where
    S: OAuthStateRepository + Send + Sync,
    T: LinkedInTokenRepository + Send + Sync,
{
    oauth_state_repository: Arc<S>,
    linkedin_token_repository: Arc<T>,
    state_ttl_seconds: i64,
}

impl<S, T> LinkedInOAuthUseCase<S, T>
where
    S: OAuthStateRepository + Send + Sync,
    T: LinkedInTokenRepository + Send + Sync,
{
    pub fn new(
        oauth_state_repository: Arc<S>,
        linkedin_token_repository: Arc<T>,
        state_ttl_seconds: i64,
    ) -> Self {
        Self {
            oauth_state_repository,
            linkedin_token_repository,
            state_ttl_seconds,
        }
    }

    /// Creates and stores a fresh state for the authorization redirect.
    pub async fn issue_state(&self, user_id: Uuid) -> Result<String> {
        let state = generate_state();
        let expires_at = state_expires_at(Utc::now(), self.state_ttl_seconds)?;

        self.oauth_state_repository
            .insert_state(InsertOAuthStateEntity {
                state: state.clone(),
                user_id,
                expires_at,
            })
            .await?;

        info!(user_id = %user_id, expires_at = %expires_at, "linkedin_oauth: state issued");
        Ok(state)
    }

    /// Resolves the callback's state to its user. A state can be consumed once; it is
    /// deleted whether or not it has expired.
    pub async fn consume_state(&self, state: &str) -> Result<Uuid> {
        let state = state.trim();
        if state.is_empty() {
            return Err(OAuthFlowError::InvalidState.into());
        }

        let Some(stored) = self
            .oauth_state_repository
            .find_state(state.to_string())
            .await?
        else {
            warn!("linkedin_oauth: unknown state on callback");
            return Err(OAuthFlowError::InvalidState.into());
        };

        self.oauth_state_repository
            .delete_state(state.to_string())
            .await?;

        if stored.is_expired_at(Utc::now()) {
            warn!(
                user_id = %stored.user_id,
                expires_at = %stored.expires_at,
                "linkedin_oauth: expired state on callback"
            );
            return Err(OAuthFlowError::ExpiredState.into());
        }

        Ok(stored.user_id)
    }

    /// Saves the tokens from a code exchange, replacing any previous record for the user.
    pub async fn store_tokens(
        &self,
        user_id: Uuid,
        grant: TokenGrantModel,
    ) -> Result<LinkedInTokenEntity> {
        let token = Self::token_entity(user_id, &grant)?;
        let stored = self.linkedin_token_repository.upsert_token(token).await?;

        info!(
            user_id = %user_id,
            expires_at = stored.expires_at,
            has_refresh_token = stored.refresh_token.is_some(),
            "linkedin_oauth: tokens stored"
        );
        Ok(stored)
    }

    /// Rotates the tokens of an existing record; fails when the user never connected.
    pub async fn rotate_tokens(
        &self,
        user_id: Uuid,
        grant: TokenGrantModel,
    ) -> Result<LinkedInTokenEntity> {
        let token = Self::token_entity(user_id, &grant)?;
        let rotated = self
            .linkedin_token_repository
            .rotate_token(user_id, RotateLinkedInTokenEntity::from(&token))
            .await?
            .ok_or(OAuthFlowError::TokenNotFound)?;

        info!(user_id = %user_id, expires_at = rotated.expires_at, "linkedin_oauth: tokens rotated");
        Ok(rotated)
    }

    pub async fn connection_status(&self, user_id: Uuid) -> Result<LinkedInConnectionStatus> {
        let status = match self.linkedin_token_repository.find_token(user_id).await? {
            None => LinkedInConnectionStatus::disconnected(),
            Some(token) => LinkedInConnectionStatus {
                connected: true,
                expired: token.is_expired_at(Utc::now()),
                has_token: !token.access_token.is_empty(),
            },
        };
        Ok(status)
    }

    /// Access token ready for a publish call.
    pub async fn usable_access_token(&self, user_id: Uuid) -> Result<String> {
        let token = self
            .linkedin_token_repository
            .find_token(user_id)
            .await?
            .ok_or(OAuthFlowError::TokenNotFound)?;

        if token.access_token.is_empty() {
            return Err(OAuthFlowError::MissingAccessToken.into());
        }
        if token.is_expired_at(Utc::now()) {
            return Err(OAuthFlowError::TokenExpired.into());
        }
        Ok(token.access_token)
    }

    /// Removes the user's tokens. Returns whether anything was stored.
    pub async fn disconnect(&self, user_id: Uuid) -> Result<bool> {
        let removed = self.linkedin_token_repository.delete_token(user_id).await?;
        info!(user_id = %user_id, removed, "linkedin_oauth: disconnected");
        Ok(removed)
    }

    fn token_entity(user_id: Uuid, grant: &TokenGrantModel) -> Result<InsertLinkedInTokenEntity> {
        let access_token = grant.access_token.trim();
        if access_token.is_empty() {
            return Err(OAuthFlowError::MissingAccessToken.into());
        }

        Ok(InsertLinkedInTokenEntity {
            user_id,
            access_token: access_token.to_string(),
            refresh_token: grant
                .refresh_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            expires_at: grant.expires_at(Utc::now())?,
        })
    }
}
