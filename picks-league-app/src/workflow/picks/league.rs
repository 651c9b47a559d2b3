use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        GameId, LeagueId, RepoError, RepoRetrieveError, SeasonId, UserId, WeekId,
        game::{Game, GameRepository},
        grading::GradingService,
        league::LeagueRepository,
        odds::spread_label,
        pick::{Pick, PickOutcome, PickRepository},
        season::SeasonRepository,
    },
    workflow::picks::{LeaguePickView, LeaguePicksView, MemberPicksView},
};

#[async_trait::async_trait]
pub trait GetLeaguePicksUseCase {
    async fn get_league_picks(
        &self,
        viewer_id: UserId,
        league_id: LeagueId,
        season_id: SeasonId,
        week_id: WeekId,
        now: DateTime<Utc>,
    ) -> Result<LeaguePicksView, GetLeaguePicksError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetLeaguePicksError {
    LeagueNotFound,
    NotMember,
    SeasonNotFound,
    WeekNotFound,
    /// Other members' picks stay private until the week locks or kicks off.
    NotYetVisible,
    Internal,
}

pub struct GetLeaguePicksUseCaseImpl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    GS: GradingService,
> {
    league_repository: Arc<L>,
    season_repository: Arc<S>,
    game_repository: Arc<G>,
    pick_repository: Arc<P>,
    grading_service: Arc<GS>,
}

impl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    GS: GradingService,
> GetLeaguePicksUseCaseImpl<L, S, G, P, GS>
{
    pub fn new(
        league_repository: Arc<L>,
        season_repository: Arc<S>,
        game_repository: Arc<G>,
        pick_repository: Arc<P>,
        grading_service: Arc<GS>,
    ) -> Self {
        Self {
            league_repository,
            season_repository,
            game_repository,
            pick_repository,
            grading_service,
        }
    }

    fn member_view(
        &self,
        user_id: UserId,
        picks: Vec<Pick>,
        games: &HashMap<GameId, Game>,
    ) -> Result<MemberPicksView, GetLeaguePicksError> {
        let mut views = Vec::with_capacity(picks.len());
        for pick in picks {
            let Some(game) = games.get(&pick.game_id) else {
                return Err(internal(
                    "resolve picked game",
                    format!("game {} of pick {} is missing", pick.game_id, pick.id),
                ));
            };
            let outcome = self
                .grading_service
                .grade_slot(game, Some(&pick))
                .map_err(|e| internal("grade pick", e))?;
            let spread = match (pick.frozen_spread, pick.frozen_favorite_team_id) {
                (Some(spread), Some(favorite)) => Some(spread_label(spread, favorite, pick.team_id)),
                _ => None,
            };
            views.push(LeaguePickView {
                game: game.clone(),
                pick,
                outcome,
                spread,
            });
        }
        views.sort_by_key(|v| v.game.start_time);

        Ok(MemberPicksView {
            user_id,
            correct: views
                .iter()
                .filter(|v| v.outcome == PickOutcome::Win)
                .count() as u32,
            picks: views,
        })
    }
}

fn internal(context: &str, e: impl std::fmt::Display) -> GetLeaguePicksError {
    log::error!("Failed to {}: {}", context, e);
    GetLeaguePicksError::Internal
}

#[async_trait::async_trait]
impl<
    L: LeagueRepository + Send + Sync + 'static,
    S: SeasonRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    GS: GradingService + Send + Sync + 'static,
> GetLeaguePicksUseCase for GetLeaguePicksUseCaseImpl<L, S, G, P, GS>
{
    async fn get_league_picks(
        &self,
        viewer_id: UserId,
        league_id: LeagueId,
        season_id: SeasonId,
        week_id: WeekId,
        now: DateTime<Utc>,
    ) -> Result<LeaguePicksView, GetLeaguePicksError> {
        match self.league_repository.get_league(league_id).await {
            Ok(_) => {}
            Err(RepoRetrieveError::NotFound) => return Err(GetLeaguePicksError::LeagueNotFound),
            Err(RepoRetrieveError::StorageError(e)) => return Err(internal("load league", e)),
        }
        let members = match self.league_repository.list_members(league_id).await {
            Ok(members) => members,
            Err(RepoError::StorageError(e)) => return Err(internal("load members", e)),
        };
        if !members.iter().any(|m| m.user_id == viewer_id) {
            return Err(GetLeaguePicksError::NotMember);
        }

        let season = match self.season_repository.get_league_season(season_id).await {
            Ok(season) if season.league_id == league_id => season,
            Ok(_) | Err(RepoRetrieveError::NotFound) => {
                return Err(GetLeaguePicksError::SeasonNotFound);
            }
            Err(RepoRetrieveError::StorageError(e)) => return Err(internal("load season", e)),
        };
        if !season.has_started(now) {
            return Err(GetLeaguePicksError::NotYetVisible);
        }
        let weeks = self
            .season_repository
            .list_season_weeks(&season)
            .await
            .map_err(|e| internal("load season weeks", e))?;
        let Some(week) = weeks.into_iter().find(|w| w.id == week_id) else {
            return Err(GetLeaguePicksError::WeekNotFound);
        };

        let games: HashMap<GameId, Game> = self
            .game_repository
            .list_games_for_weeks(&[week_id])
            .await
            .map_err(|e| internal("load games", e))?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();
        if !week.is_locked(now) && !games.values().any(|g| g.has_started(now)) {
            return Err(GetLeaguePicksError::NotYetVisible);
        }

        let mut picks_by_user: HashMap<UserId, Vec<Pick>> = HashMap::new();
        for pick in self
            .pick_repository
            .list_league_picks_for_weeks(league_id, &[week_id])
            .await
            .map_err(|e| internal("load league picks", e))?
        {
            picks_by_user.entry(pick.user_id).or_default().push(pick);
        }

        let mut member_ids: Vec<UserId> = members.iter().map(|m| m.user_id).collect();
        member_ids.sort();
        member_ids.dedup();

        // Picks of users who have since left the league are not shown.
        let mut views = Vec::with_capacity(member_ids.len());
        for user_id in member_ids {
            let picks = picks_by_user.remove(&user_id).unwrap_or_default();
            views.push(self.member_view(user_id, picks, &games)?);
        }

        Ok(LeaguePicksView {
            week,
            members: views,
        })
    }
}
