use std::sync::Arc;

use crate::{
    domain::{
        LeagueId, RepoError, RepoRetrieveError, SeasonId,
        season::SeasonRepository,
        standings::StandingsRepository,
    },
    workflow::standings::StandingsRowView,
};

#[async_trait::async_trait]
pub trait GetStandingsUseCase {
    async fn get_standings(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<Vec<StandingsRowView>, GetStandingsError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetStandingsError {
    SeasonNotFound,
    Internal,
}

pub struct GetStandingsUseCaseImpl<S: SeasonRepository, SR: StandingsRepository> {
    season_repository: Arc<S>,
    standings_repository: Arc<SR>,
}

impl<S: SeasonRepository, SR: StandingsRepository> GetStandingsUseCaseImpl<S, SR> {
    pub fn new(season_repository: Arc<S>, standings_repository: Arc<SR>) -> Self {
        Self {
            season_repository,
            standings_repository,
        }
    }
}

#[async_trait::async_trait]
impl<
    S: SeasonRepository + Send + Sync + 'static,
    SR: StandingsRepository + Send + Sync + 'static,
> GetStandingsUseCase for GetStandingsUseCaseImpl<S, SR>
{
    async fn get_standings(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<Vec<StandingsRowView>, GetStandingsError> {
        match self.season_repository.get_league_season(season_id).await {
            Ok(season) if season.league_id == league_id => {}
            Ok(_) | Err(RepoRetrieveError::NotFound) => {
                return Err(GetStandingsError::SeasonNotFound);
            }
            Err(RepoRetrieveError::StorageError(e)) => {
                log::error!("Failed to load season {}: {}", season_id, e);
                return Err(GetStandingsError::Internal);
            }
        }

        match self
            .standings_repository
            .get_standings(league_id, season_id)
            .await
        {
            Ok(records) => Ok(records.into_iter().map(StandingsRowView::from).collect()),
            Err(RepoError::StorageError(e)) => {
                log::error!(
                    "Failed to load standings for league {} season {}: {}",
                    league_id,
                    season_id,
                    e
                );
                Err(GetStandingsError::Internal)
            }
        }
    }
}
