use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        GameId, LeagueId, RepoError, RepoRetrieveError, SeasonId, UserId, WeekId,
        game::{Game, GameProgress, GameRepository},
        grading::GradingService,
        league::LeagueRepository,
        odds::{GameOdds, OddsLookup, OddsRepository, spread_label},
        pick::{Pick, PickOutcome, PickRepository, PickType},
        season::{SeasonRepository, adjacent_weeks},
    },
    workflow::picks::{WeeklyGameView, WeeklyPickSummary, WeeklyPicksView},
};

#[async_trait::async_trait]
pub trait GetWeeklyPicksUseCase {
    async fn get_weekly_picks(
        &self,
        user_id: UserId,
        league_id: LeagueId,
        season_id: SeasonId,
        week_id: WeekId,
        now: DateTime<Utc>,
    ) -> Result<WeeklyPicksView, GetWeeklyPicksError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetWeeklyPicksError {
    LeagueNotFound,
    NotMember,
    SeasonNotFound,
    WeekNotFound,
    Internal,
}

pub struct GetWeeklyPicksUseCaseImpl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    O: OddsRepository,
    GS: GradingService,
> {
    league_repository: Arc<L>,
    season_repository: Arc<S>,
    game_repository: Arc<G>,
    pick_repository: Arc<P>,
    odds_lookup: Arc<OddsLookup<O>>,
    grading_service: Arc<GS>,
}

impl<
    L: LeagueRepository,
    S: SeasonRepository,
    G: GameRepository,
    P: PickRepository,
    O: OddsRepository,
    GS: GradingService,
> GetWeeklyPicksUseCaseImpl<L, S, G, P, O, GS>
{
    pub fn new(
        league_repository: Arc<L>,
        season_repository: Arc<S>,
        game_repository: Arc<G>,
        pick_repository: Arc<P>,
        odds_lookup: Arc<OddsLookup<O>>,
        grading_service: Arc<GS>,
    ) -> Self {
        Self {
            league_repository,
            season_repository,
            game_repository,
            pick_repository,
            odds_lookup,
            grading_service,
        }
    }
}

fn internal(context: &str, e: impl std::fmt::Display) -> GetWeeklyPicksError {
    log::error!("Failed to {}: {}", context, e);
    GetWeeklyPicksError::Internal
}

fn spread_for(game: &Game, pick: Option<&Pick>, odds: Option<&GameOdds>) -> Option<String> {
    if let Some(pick) = pick {
        if let (Some(spread), Some(favorite)) = (pick.frozen_spread, pick.frozen_favorite_team_id)
        {
            return Some(spread_label(spread, favorite, pick.team_id));
        }
        return None;
    }
    odds.map(|o| spread_label(o.spread, o.favorite_team_id, game.home_team_id))
}

fn summarize(games: &[WeeklyGameView], required_picks: u32) -> WeeklyPickSummary {
    let mut summary = WeeklyPickSummary {
        required_picks,
        ..Default::default()
    };
    for view in games {
        if view.pick.is_some() {
            summary.picks_made += 1;
        }
        if view.outcome == PickOutcome::Win {
            summary.correct += 1;
        }
        match view.progress {
            GameProgress::Final => summary.games_final += 1,
            GameProgress::InProgress => summary.games_in_progress += 1,
            GameProgress::YetToPlay => summary.games_yet_to_play += 1,
        }
    }
    summary
}

#[async_trait::async_trait]
impl<
    L: LeagueRepository + Send + Sync + 'static,
    S: SeasonRepository + Send + Sync + 'static,
    G: GameRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    O: OddsRepository + Send + Sync + 'static,
    GS: GradingService + Send + Sync + 'static,
> GetWeeklyPicksUseCase for GetWeeklyPicksUseCaseImpl<L, S, G, P, O, GS>
{
    async fn get_weekly_picks(
        &self,
        user_id: UserId,
        league_id: LeagueId,
        season_id: SeasonId,
        week_id: WeekId,
        now: DateTime<Utc>,
    ) -> Result<WeeklyPicksView, GetWeeklyPicksError> {
        let league = match self.league_repository.get_league(league_id).await {
            Ok(league) => league,
            Err(RepoRetrieveError::NotFound) => return Err(GetWeeklyPicksError::LeagueNotFound),
            Err(RepoRetrieveError::StorageError(e)) => return Err(internal("load league", e)),
        };
        match self.league_repository.is_member(league_id, user_id).await {
            Ok(true) => {}
            Ok(false) => return Err(GetWeeklyPicksError::NotMember),
            Err(RepoError::StorageError(e)) => return Err(internal("check membership", e)),
        }

        let season = match self.season_repository.get_league_season(season_id).await {
            Ok(season) if season.league_id == league_id => season,
            Ok(_) | Err(RepoRetrieveError::NotFound) => {
                return Err(GetWeeklyPicksError::SeasonNotFound);
            }
            Err(RepoRetrieveError::StorageError(e)) => return Err(internal("load season", e)),
        };
        let weeks = self
            .season_repository
            .list_season_weeks(&season)
            .await
            .map_err(|e| internal("load season weeks", e))?;
        let Some(week) = weeks.iter().find(|w| w.id == week_id).cloned() else {
            return Err(GetWeeklyPicksError::WeekNotFound);
        };
        let (previous_week, next_week) = adjacent_weeks(&weeks, week_id);

        let games = self
            .game_repository
            .list_games_for_weeks(&[week_id])
            .await
            .map_err(|e| internal("load games", e))?;
        let picks: HashMap<GameId, Pick> = self
            .pick_repository
            .list_user_picks_for_week(league_id, user_id, week_id)
            .await
            .map_err(|e| internal("load picks", e))?
            .into_iter()
            .map(|p| (p.game_id, p))
            .collect();

        // Once picks exist only the picked games are shown, otherwise the
        // games that can still be picked.
        let has_picked = !picks.is_empty();
        let mut slate: Vec<Game> = games
            .into_iter()
            .filter(|g| {
                if has_picked {
                    picks.contains_key(&g.id)
                } else {
                    !g.has_started(now)
                }
            })
            .collect();
        slate.sort_by_key(|g| g.start_time);

        let odds: HashMap<GameId, GameOdds> = match league.pick_type {
            PickType::AgainstSpread if !has_picked => {
                let game_ids: Vec<GameId> = slate.iter().map(|g| g.id).collect();
                self.odds_lookup
                    .odds_for_games(league.odds_provider_id, &game_ids)
                    .await
                    .map_err(|e| internal("load odds", e))?
                    .into_iter()
                    .map(|o| (o.game_id, o))
                    .collect()
            }
            _ => HashMap::new(),
        };

        let mut views = Vec::with_capacity(slate.len());
        for game in slate {
            let pick = picks.get(&game.id).cloned();
            let outcome = self
                .grading_service
                .grade_slot(&game, pick.as_ref())
                .map_err(|e| internal("grade pick", e))?;
            let spread = spread_for(&game, pick.as_ref(), odds.get(&game.id));
            views.push(WeeklyGameView {
                progress: game.progress(),
                game,
                pick,
                outcome,
                spread,
            });
        }

        let required_picks = if has_picked {
            picks.len() as u32
        } else {
            league.picks_per_week.min(views.len() as u32)
        };
        let picks_locked = week.is_locked(now);
        let summary = summarize(&views, required_picks);

        Ok(WeeklyPicksView {
            can_submit: !has_picked && !picks_locked && required_picks > 0,
            previous_week: previous_week.cloned(),
            next_week: next_week.cloned(),
            week,
            picks_locked,
            games: views,
            summary,
        })
    }
}
