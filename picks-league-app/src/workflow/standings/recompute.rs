use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::domain::{
    LeagueId, RepoError, RepoRetrieveError, SeasonId,
    game::GameRepository,
    league::LeagueRepository,
    pick::PickRepository,
    season::SeasonRepository,
    standings::{PublishSummary, SeasonSnapshot, StandingsError, StandingsRepository, StandingsService},
};

#[async_trait::async_trait]
pub trait RecomputeStandingsWorkflow {
    async fn recompute(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<PublishSummary, RecomputeError>;
}

#[derive(Debug, Error)]
pub enum RecomputeError {
    #[error("league season {0} not found")]
    SeasonNotFound(SeasonId),
    #[error("league season {season_id} does not belong to league {league_id}")]
    SeasonNotInLeague {
        league_id: LeagueId,
        season_id: SeasonId,
    },
    #[error(transparent)]
    Standings(#[from] StandingsError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepoError> for RecomputeError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::StorageError(msg) => RecomputeError::Storage(msg),
        }
    }
}

pub struct RecomputeStandingsWorkflowImpl<
    S: SeasonRepository,
    L: LeagueRepository,
    G: GameRepository,
    P: PickRepository,
    SR: StandingsRepository,
    SS: StandingsService,
> {
    season_repository: Arc<S>,
    league_repository: Arc<L>,
    game_repository: Arc<G>,
    pick_repository: Arc<P>,
    standings_repository: Arc<SR>,
    standings_service: Arc<SS>,
    season_locks: DashMap<(LeagueId, SeasonId), Arc<tokio::sync::Mutex<()>>>,
}

impl<
    S: SeasonRepository,
    L: LeagueRepository,
    G: GameRepository,
    P: PickRepository,
    SR: StandingsRepository,
    SS: StandingsService,
> RecomputeStandingsWorkflowImpl<S, L, G, P, SR, SS>
{
    pub fn new(
        season_repository: Arc<S>,
        league_repository: Arc<L>,
        game_repository: Arc<G>,
        pick_repository: Arc<P>,
        standings_repository: Arc<SR>,
        standings_service: Arc<SS>,
    ) -> Self {
        Self {
            season_repository,
            league_repository,
            game_repository,
            pick_repository,
            standings_repository,
            standings_service,
            season_locks: DashMap::new(),
        }
    }

    fn season_lock(&self, league_id: LeagueId, season_id: SeasonId) -> Arc<tokio::sync::Mutex<()>> {
        self.season_locks
            .entry((league_id, season_id))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl<
    S: SeasonRepository + Send + Sync + 'static,
    L: LeagueRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    SR: StandingsRepository + Send + Sync + 'static,
    SS: StandingsService + Send + Sync + 'static,
> RecomputeStandingsWorkflowImpl<S, L, G, P, SR, SS>
{
    async fn load_snapshot(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<SeasonSnapshot, RecomputeError> {
        let season = match self.season_repository.get_league_season(season_id).await {
            Ok(season) => season,
            Err(RepoRetrieveError::NotFound) => {
                return Err(RecomputeError::SeasonNotFound(season_id));
            }
            Err(RepoRetrieveError::StorageError(e)) => return Err(RecomputeError::Storage(e)),
        };
        if season.league_id != league_id {
            return Err(RecomputeError::SeasonNotInLeague {
                league_id,
                season_id,
            });
        }

        let weeks = self.season_repository.list_season_weeks(&season).await?;
        let week_ids: Vec<_> = weeks.iter().map(|w| w.id).collect();
        let members = self.league_repository.list_members(league_id).await?;
        let games = self.game_repository.list_games_for_weeks(&week_ids).await?;
        let picks = self
            .pick_repository
            .list_league_picks_for_weeks(league_id, &week_ids)
            .await?;

        Ok(SeasonSnapshot {
            season,
            weeks,
            members,
            games,
            picks,
        })
    }

    async fn recompute_locked(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<PublishSummary, RecomputeError> {
        log::debug!(
            "Recomputing standings for league {} season {}",
            league_id,
            season_id
        );

        let snapshot = self.load_snapshot(league_id, season_id).await?;
        let standings = match self.standings_service.aggregate(&snapshot) {
            Ok(standings) => standings,
            Err(e) => {
                log::error!(
                    "Standings for league {} season {} not published: {}",
                    league_id,
                    season_id,
                    e
                );
                return Err(e.into());
            }
        };

        let summary = self
            .standings_repository
            .publish_season_standings(standings)
            .await?;

        log::info!(
            "Published standings for league {} season {}: {} records, {} picks resolved, {} stale removed",
            league_id,
            season_id,
            summary.records_written,
            summary.picks_resolved,
            summary.stale_removed
        );
        Ok(summary)
    }
}

#[async_trait::async_trait]
impl<
    S: SeasonRepository + Send + Sync + 'static,
    L: LeagueRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    SR: StandingsRepository + Send + Sync + 'static,
    SS: StandingsService + Send + Sync + 'static,
> RecomputeStandingsWorkflow for RecomputeStandingsWorkflowImpl<S, L, G, P, SR, SS>
{
    async fn recompute(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<PublishSummary, RecomputeError> {
        let lock = self.season_lock(league_id, season_id);
        let result = {
            let _guard = lock.lock().await;
            self.recompute_locked(league_id, season_id).await
        };
        drop(lock);
        // Only the map itself still refers to the lock once nobody holds or awaits it.
        self.season_locks
            .remove_if(&(league_id, season_id), |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}
