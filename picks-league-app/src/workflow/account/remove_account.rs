use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{UserId, standings::StandingsRepository};

#[async_trait::async_trait]
pub trait RemoveAccountWorkflow {
    /// Drops the user's records from seasons that have not started yet.
    /// Records in started or finished seasons stay as history.
    async fn remove_account(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RemoveAccountError>;
}

pub struct RemoveAccountWorkflowImpl<R: StandingsRepository> {
    standings_repository: Arc<R>,
}

impl<R> RemoveAccountWorkflowImpl<R>
where
    R: StandingsRepository + Send + Sync + 'static,
{
    pub fn new(standings_repository: Arc<R>) -> Self {
        Self {
            standings_repository,
        }
    }
}

#[derive(Debug)]
pub enum RemoveAccountError {
    StandingsRemovalFailed,
}

#[async_trait::async_trait]
impl<R> RemoveAccountWorkflow for RemoveAccountWorkflowImpl<R>
where
    R: StandingsRepository + Send + Sync + 'static,
{
    async fn remove_account(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, RemoveAccountError> {
        match self
            .standings_repository
            .remove_user_standings_for_seasons_starting_after(user_id, now)
            .await
        {
            Ok(removed) => {
                log::info!(
                    "Removed {} upcoming standings records for user {}",
                    removed,
                    user_id
                );
                Ok(removed)
            }
            Err(e) => {
                log::error!(
                    "Failed to remove standings for user {}: {:?}",
                    user_id,
                    e
                );
                Err(RemoveAccountError::StandingsRemovalFailed)
            }
        }
    }
}
