use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    domain::{
        GameId, LeagueId, RepoCreateError, RepoError, RepoRetrieveError, TeamId, UserId, WeekId,
        game::{Game, GameRepository},
        league::{League, LeagueRepository},
        odds::{GameOdds, OddsLookup, OddsRepository},
        pick::{NewPick, Pick, PickRepository, PickType},
        season::SeasonRepository,
    },
    workflow::picks::PickSelection,
};

#[async_trait::async_trait]
pub trait SubmitPicksUseCase {
    /// Stores the user's whole slate for a week at once. Picks cannot be
    /// edited afterwards.
    async fn submit_picks(
        &self,
        user_id: UserId,
        league_id: LeagueId,
        week_id: WeekId,
        selections: Vec<PickSelection>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pick>, SubmitPicksError>;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitPicksError {
    #[error("league not found")]
    LeagueNotFound,
    #[error("user is not a member of this league")]
    NotMember,
    #[error("week not found")]
    WeekNotFound,
    #[error("picks for this week are locked")]
    PicksLocked,
    #[error("picks for this week have already been made")]
    AlreadyPicked,
    #[error("game {0} is not part of this week")]
    GameNotInWeek(GameId),
    #[error("game {0} has already started")]
    GameStarted(GameId),
    #[error("game {0} was picked more than once")]
    DuplicateGame(GameId),
    #[error("team {team_id} does not play in game {game_id}")]
    TeamNotInGame { game_id: GameId, team_id: TeamId },
    #[error("expected {expected} picks, got {actual}")]
    WrongPickCount { expected: u32, actual: u32 },
    #[error("no line available for game {0}")]
    OddsUnavailable(GameId),
    #[error("internal error")]
    Internal,
}

pub struct SubmitPicksUseCaseImpl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    O: OddsRepository,
> {
    league_repository: Arc<L>,
    season_repository: Arc<S>,
    game_repository: Arc<G>,
    pick_repository: Arc<P>,
    odds_lookup: Arc<OddsLookup<O>>,
}

impl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    O: OddsRepository,
> SubmitPicksUseCaseImpl<L, S, G, P, O>
{
    pub fn new(
        league_repository: Arc<L>,
        season_repository: Arc<S>,
        game_repository: Arc<G>,
        pick_repository: Arc<P>,
        odds_lookup: Arc<OddsLookup<O>>,
    ) -> Self {
        Self {
            league_repository,
            season_repository,
            game_repository,
            pick_repository,
            odds_lookup,
        }
    }
}

fn storage_failure(context: &str, e: impl std::fmt::Display) -> SubmitPicksError {
    log::error!("Failed to {}: {}", context, e);
    SubmitPicksError::Internal
}

/// Checks each selection against the week's slate and returns the games in
/// submission order.
fn validate_selections<'a>(
    games: &'a HashMap<GameId, Game>,
    selections: &[PickSelection],
    now: DateTime<Utc>,
) -> Result<Vec<&'a Game>, SubmitPicksError> {
    let mut seen = HashSet::new();
    let mut picked = Vec::with_capacity(selections.len());
    for selection in selections {
        let Some(game) = games.get(&selection.game_id) else {
            return Err(SubmitPicksError::GameNotInWeek(selection.game_id));
        };
        if !seen.insert(selection.game_id) {
            return Err(SubmitPicksError::DuplicateGame(selection.game_id));
        }
        if game.has_started(now) {
            return Err(SubmitPicksError::GameStarted(game.id));
        }
        if !game.involves(selection.team_id) {
            return Err(SubmitPicksError::TeamNotInGame {
                game_id: game.id,
                team_id: selection.team_id,
            });
        }
        picked.push(game);
    }
    Ok(picked)
}

fn usable_line<'a>(odds: Option<&'a GameOdds>, game: &Game) -> Option<&'a GameOdds> {
    odds.filter(|o| {
        o.spread.is_finite()
            && o.spread >= 0.0
            && game.involves(o.favorite_team_id)
            && game.opponent_of(o.favorite_team_id) == Some(o.underdog_team_id)
    })
}

impl<
    L: LeagueRepository + Send + Sync + 'static,
    S: SeasonRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    O: OddsRepository + Send + Sync + 'static,
> SubmitPicksUseCaseImpl<L, S, G, P, O>
{
    async fn build_picks(
        &self,
        league: &League,
        user_id: UserId,
        week_id: WeekId,
        games: Vec<&Game>,
        selections: &[PickSelection],
    ) -> Result<Vec<NewPick>, SubmitPicksError> {
        let lines: HashMap<GameId, GameOdds> = match league.pick_type {
            PickType::StraightUp => HashMap::new(),
            PickType::AgainstSpread => {
                let game_ids: Vec<GameId> = games.iter().map(|g| g.id).collect();
                self.odds_lookup
                    .odds_for_games(league.odds_provider_id, &game_ids)
                    .await
                    .map_err(|e| storage_failure("load odds", e))?
                    .into_iter()
                    .map(|o| (o.game_id, o))
                    .collect()
            }
        };

        let mut new_picks = Vec::with_capacity(selections.len());
        for (game, selection) in games.into_iter().zip(selections) {
            let (frozen_spread, frozen_favorite_team_id) = match league.pick_type {
                PickType::StraightUp => (None, None),
                PickType::AgainstSpread => match usable_line(lines.get(&game.id), game) {
                    Some(odds) => (Some(odds.spread), Some(odds.favorite_team_id)),
                    None => return Err(SubmitPicksError::OddsUnavailable(game.id)),
                },
            };
            new_picks.push(NewPick {
                user_id,
                league_id: league.id,
                week_id,
                game_id: game.id,
                team_id: selection.team_id,
                pick_type: league.pick_type,
                frozen_spread,
                frozen_favorite_team_id,
            });
        }
        Ok(new_picks)
    }
}

#[async_trait::async_trait]
impl<
    L: LeagueRepository + Send + Sync + 'static,
    S: SeasonRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    O: OddsRepository + Send + Sync + 'static,
> SubmitPicksUseCase for SubmitPicksUseCaseImpl<L, S, G, P, O>
{
    async fn submit_picks(
        &self,
        user_id: UserId,
        league_id: LeagueId,
        week_id: WeekId,
        selections: Vec<PickSelection>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pick>, SubmitPicksError> {
        let league = match self.league_repository.get_league(league_id).await {
            Ok(league) => league,
            Err(RepoRetrieveError::NotFound) => return Err(SubmitPicksError::LeagueNotFound),
            Err(RepoRetrieveError::StorageError(e)) => return Err(storage_failure("load league", e)),
        };
        match self.league_repository.is_member(league_id, user_id).await {
            Ok(true) => {}
            Ok(false) => return Err(SubmitPicksError::NotMember),
            Err(RepoError::StorageError(e)) => return Err(storage_failure("check membership", e)),
        }

        let week = match self.season_repository.get_week(week_id).await {
            Ok(week) => week,
            Err(RepoRetrieveError::NotFound) => return Err(SubmitPicksError::WeekNotFound),
            Err(RepoRetrieveError::StorageError(e)) => return Err(storage_failure("load week", e)),
        };
        if week.is_locked(now) {
            return Err(SubmitPicksError::PicksLocked);
        }

        let existing = self
            .pick_repository
            .list_user_picks_for_week(league_id, user_id, week_id)
            .await
            .map_err(|e| storage_failure("load existing picks", e))?;
        if !existing.is_empty() {
            return Err(SubmitPicksError::AlreadyPicked);
        }

        let games: HashMap<GameId, Game> = self
            .game_repository
            .list_games_for_weeks(&[week_id])
            .await
            .map_err(|e| storage_failure("load games", e))?
            .into_iter()
            .map(|g| (g.id, g))
            .collect();

        let picked_games = validate_selections(&games, &selections, now)?;

        let available = games.values().filter(|g| !g.has_started(now)).count() as u32;
        let expected = league.picks_per_week.min(available);
        let actual = selections.len() as u32;
        if actual != expected {
            return Err(SubmitPicksError::WrongPickCount { expected, actual });
        }
        if expected == 0 {
            return Ok(Vec::new());
        }

        let new_picks = self
            .build_picks(&league, user_id, week_id, picked_games, &selections)
            .await?;

        match self.pick_repository.create_picks(new_picks).await {
            Ok(picks) => {
                log::info!(
                    "User {} submitted {} picks for league {} week {}",
                    user_id,
                    picks.len(),
                    league_id,
                    week.name
                );
                Ok(picks)
            }
            Err(RepoCreateError::Conflict) => Err(SubmitPicksError::AlreadyPicked),
            Err(RepoCreateError::StorageError(e)) => Err(storage_failure("store picks", e)),
        }
    }
}
