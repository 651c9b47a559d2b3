use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    GameId, LeagueId, PickId, RepoError, SeasonId, UserId, WeekId,
    game::Game,
    grading::{GradeError, GradingService},
    league::LeagueMember,
    pick::{Pick, PickOutcome, PickStatusUpdate},
    season::{LeagueSeason, Week},
};

#[derive(Clone, Debug, PartialEq)]
pub struct StandingsRecord {
    pub league_id: LeagueId,
    pub season_id: SeasonId,
    pub user_id: UserId,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub points: f64,
    pub rank: u32,
}

/// Everything one standings computation reads, taken before anything is written.
#[derive(Clone, Debug)]
pub struct SeasonSnapshot {
    pub season: LeagueSeason,
    pub weeks: Vec<Week>,
    pub members: Vec<LeagueMember>,
    pub games: Vec<Game>,
    pub picks: Vec<Pick>,
}

/// Full replacement set for one league season plus the pick transitions it implies.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonStandings {
    pub league_id: LeagueId,
    pub season_id: SeasonId,
    pub records: Vec<StandingsRecord>,
    pub status_updates: Vec<PickStatusUpdate>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub picks_resolved: u64,
    pub records_written: u64,
    pub stale_removed: u64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StandingsError {
    #[error("pick {pick_id} references game {game_id} which is missing from the snapshot")]
    MissingGameData { pick_id: PickId, game_id: GameId },
    #[error(transparent)]
    Grade(#[from] GradeError),
}

#[async_trait::async_trait]
pub trait StandingsRepository {
    /// Published records for a season, ordered by rank.
    async fn get_standings(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<Vec<StandingsRecord>, RepoError>;
    /// Applies pick transitions, upserts every record and removes records for
    /// users absent from `standings`, all in one transaction.
    async fn publish_season_standings(
        &self,
        standings: SeasonStandings,
    ) -> Result<PublishSummary, RepoError>;
    async fn remove_user_standings_for_seasons_starting_after(
        &self,
        user_id: UserId,
        after: DateTime<Utc>,
    ) -> Result<u64, RepoError>;
}

pub trait StandingsService {
    fn aggregate(&self, snapshot: &SeasonSnapshot) -> Result<SeasonStandings, StandingsError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    wins: u32,
    losses: u32,
    pushes: u32,
}

impl Tally {
    fn record(&mut self, outcome: PickOutcome) {
        match outcome {
            PickOutcome::Win => self.wins += 1,
            PickOutcome::Loss => self.losses += 1,
            PickOutcome::Push => self.pushes += 1,
            PickOutcome::Picked | PickOutcome::Unpicked => {}
        }
    }

    fn points(&self) -> f64 {
        self.wins as f64 + 0.5 * self.pushes as f64
    }
}

pub struct StandingsServiceImpl<G: GradingService> {
    grading_service: Arc<G>,
}

impl<G: GradingService> StandingsServiceImpl<G> {
    pub fn new(grading_service: Arc<G>) -> Self {
        Self { grading_service }
    }

    fn rank(
        league_id: LeagueId,
        season_id: SeasonId,
        tallies: HashMap<UserId, Tally>,
    ) -> Vec<StandingsRecord> {
        let mut rows: Vec<(UserId, Tally, f64)> = tallies
            .into_iter()
            .map(|(user_id, tally)| (user_id, tally, tally.points()))
            .collect();
        rows.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

        rows.into_iter()
            .enumerate()
            .map(|(index, (user_id, tally, points))| StandingsRecord {
                league_id,
                season_id,
                user_id,
                wins: tally.wins,
                losses: tally.losses,
                pushes: tally.pushes,
                points,
                rank: index as u32 + 1,
            })
            .collect()
    }
}

impl<G: GradingService> StandingsService for StandingsServiceImpl<G> {
    fn aggregate(&self, snapshot: &SeasonSnapshot) -> Result<SeasonStandings, StandingsError> {
        let league_id = snapshot.season.league_id;
        let season_id = snapshot.season.id;

        let weeks_in_range: HashSet<WeekId> = snapshot
            .weeks
            .iter()
            .filter(|w| snapshot.season.range.contains(w))
            .map(|w| w.id)
            .collect();
        let games_by_id: HashMap<GameId, &Game> =
            snapshot.games.iter().map(|g| (g.id, g)).collect();

        let mut tallies: HashMap<UserId, Tally> = snapshot
            .members
            .iter()
            .filter(|m| m.league_id == league_id)
            .map(|m| (m.user_id, Tally::default()))
            .collect();

        let mut status_updates = Vec::new();
        for pick in &snapshot.picks {
            if pick.league_id != league_id || !weeks_in_range.contains(&pick.week_id) {
                continue;
            }
            let Some(tally) = tallies.get_mut(&pick.user_id) else {
                continue;
            };
            let Some(game) = games_by_id.get(&pick.game_id) else {
                return Err(StandingsError::MissingGameData {
                    pick_id: pick.id,
                    game_id: pick.game_id,
                });
            };

            let outcome = self.grading_service.grade(game, pick)?;
            if !pick.status.is_resolved() {
                if let Some(status) = outcome.resolved_status() {
                    status_updates.push(PickStatusUpdate {
                        pick_id: pick.id,
                        status,
                    });
                }
            }
            tally.record(outcome);
        }
        status_updates.sort_by_key(|u| u.pick_id);

        Ok(SeasonStandings {
            league_id,
            season_id,
            records: Self::rank(league_id, season_id, tallies),
            status_updates,
        })
    }
}
