use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{
    GameId, LeagueId, OddsProviderId, PickId, RepoCreateError, RepoError, RepoRetrieveError,
    SeasonId, TeamId, UserId, WeekId,
    game::{Game, GameRepository, GameStatus},
    league::{League, LeagueMember, LeagueRepository},
    odds::{GameOdds, OddsRepository},
    pick::{NewPick, Pick, PickRepository, PickStatus, PickType},
    season::{LeagueSeason, SeasonRepository, SeasonWeekRange, Week, WeekType},
    standings::{PublishSummary, SeasonStandings, StandingsRecord, StandingsRepository},
};

#[derive(Default)]
struct State {
    leagues: HashMap<LeagueId, League>,
    members: Vec<LeagueMember>,
    seasons: HashMap<SeasonId, LeagueSeason>,
    season_weeks: HashMap<SeasonId, Vec<WeekId>>,
    weeks: HashMap<WeekId, Week>,
    games: HashMap<GameId, Game>,
    odds: Vec<GameOdds>,
    picks: Vec<Pick>,
    standings: HashMap<(SeasonId, UserId), StandingsRecord>,
}

/// Single in-memory backing for every repository trait, so workflow tests
/// can wire one store into all slots.
pub struct InMemoryStore {
    state: Mutex<State>,
}

pub fn season_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 3, 0, 0, 0).unwrap()
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_league(&self, pick_type: PickType, picks_per_week: u32) -> League {
        let league = League {
            id: LeagueId::new(),
            name: "Sunday Squares".to_string(),
            pick_type,
            picks_per_week,
            odds_provider_id: OddsProviderId::new(),
        };
        self.state
            .lock()
            .unwrap()
            .leagues
            .insert(league.id, league.clone());
        league
    }

    /// Creates `week_count` consecutive weeks starting at [`season_start`]
    /// and a league season spanning all of them.
    pub fn add_season(&self, league_id: LeagueId, week_count: i64) -> (LeagueSeason, Vec<Week>) {
        let start = season_start();
        let weeks: Vec<Week> = (0..week_count)
            .map(|i| Week {
                id: WeekId::new(),
                name: format!("Week {}", i + 1),
                week_type: WeekType::Regular,
                start_time: start + Duration::weeks(i),
                end_time: start + Duration::weeks(i + 1) - Duration::seconds(1),
                pick_lock_time: start + Duration::weeks(i) + Duration::days(5),
            })
            .collect();
        let season = LeagueSeason {
            id: SeasonId::new(),
            league_id,
            start_week_id: weeks[0].id,
            end_week_id: weeks[weeks.len() - 1].id,
            range: SeasonWeekRange {
                start_time: weeks[0].start_time,
                end_time: weeks[weeks.len() - 1].end_time,
            },
        };

        let mut state = self.state.lock().unwrap();
        state
            .season_weeks
            .insert(season.id, weeks.iter().map(|w| w.id).collect());
        for week in &weeks {
            state.weeks.insert(week.id, week.clone());
        }
        state.seasons.insert(season.id, season.clone());
        (season, weeks)
    }

    pub fn add_member(&self, league_id: LeagueId) -> UserId {
        let user_id = UserId::new();
        self.state.lock().unwrap().members.push(LeagueMember {
            league_id,
            user_id,
            joined_at: season_start() - Duration::days(30),
        });
        user_id
    }

    pub fn remove_member(&self, league_id: LeagueId, user_id: UserId) {
        self.state
            .lock()
            .unwrap()
            .members
            .retain(|m| !(m.league_id == league_id && m.user_id == user_id));
    }

    /// Kickoff is five days into the week, which is also the week's pick lock.
    pub fn add_game(&self, week_id: WeekId, home: i32, away: i32, status: GameStatus) -> Game {
        let mut state = self.state.lock().unwrap();
        let week_start = state.weeks[&week_id].start_time;
        let game = Game {
            id: GameId::new(),
            week_id,
            home_team_id: TeamId::new(),
            away_team_id: TeamId::new(),
            home_score: home,
            away_score: away,
            status,
            period: if status == GameStatus::Scheduled { 0 } else { 4 },
            start_time: week_start + Duration::days(5),
        };
        state.games.insert(game.id, game.clone());
        game
    }

    pub fn update_game(&self, game: Game) {
        self.state.lock().unwrap().games.insert(game.id, game);
    }

    pub fn remove_game(&self, game_id: GameId) {
        self.state.lock().unwrap().games.remove(&game_id);
    }

    pub fn add_odds(&self, provider_id: OddsProviderId, game: &Game, home_favored: bool, spread: f64) {
        let (favorite_team_id, underdog_team_id) = if home_favored {
            (game.home_team_id, game.away_team_id)
        } else {
            (game.away_team_id, game.home_team_id)
        };
        self.state.lock().unwrap().odds.push(GameOdds {
            game_id: game.id,
            provider_id,
            favorite_team_id,
            underdog_team_id,
            spread,
        });
    }

    pub fn add_pick(&self, league_id: LeagueId, user_id: UserId, game: &Game, home: bool) -> Pick {
        let pick = Pick {
            id: PickId::new(),
            user_id,
            league_id,
            week_id: game.week_id,
            game_id: game.id,
            team_id: if home {
                game.home_team_id
            } else {
                game.away_team_id
            },
            pick_type: PickType::StraightUp,
            frozen_spread: None,
            frozen_favorite_team_id: None,
            status: PickStatus::Picked,
            created_at: game.start_time - Duration::days(1),
        };
        self.state.lock().unwrap().picks.push(pick.clone());
        pick
    }

    pub fn picks(&self) -> Vec<Pick> {
        self.state.lock().unwrap().picks.clone()
    }

    pub fn pick_statuses(&self) -> Vec<PickStatus> {
        self.state
            .lock()
            .unwrap()
            .picks
            .iter()
            .map(|p| p.status)
            .collect()
    }

    pub fn standings_for(&self, season_id: SeasonId) -> Vec<StandingsRecord> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<StandingsRecord> = state
            .standings
            .values()
            .filter(|r| r.season_id == season_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.rank);
        records
    }
}

#[async_trait::async_trait]
impl GameRepository for InMemoryStore {
    async fn list_games_for_weeks(&self, week_ids: &[WeekId]) -> Result<Vec<Game>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .games
            .values()
            .filter(|g| week_ids.contains(&g.week_id))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl OddsRepository for InMemoryStore {
    async fn list_odds_for_games(
        &self,
        provider_id: OddsProviderId,
        game_ids: &[GameId],
    ) -> Result<Vec<GameOdds>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .odds
            .iter()
            .filter(|o| o.provider_id == provider_id && game_ids.contains(&o.game_id))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl LeagueRepository for InMemoryStore {
    async fn get_league(&self, league_id: LeagueId) -> Result<League, RepoRetrieveError> {
        let state = self.state.lock().unwrap();
        state
            .leagues
            .get(&league_id)
            .cloned()
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn list_members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .filter(|m| m.league_id == league_id)
            .cloned()
            .collect())
    }

    async fn is_member(&self, league_id: LeagueId, user_id: UserId) -> Result<bool, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .any(|m| m.league_id == league_id && m.user_id == user_id))
    }
}

#[async_trait::async_trait]
impl SeasonRepository for InMemoryStore {
    async fn get_league_season(
        &self,
        season_id: SeasonId,
    ) -> Result<LeagueSeason, RepoRetrieveError> {
        let state = self.state.lock().unwrap();
        state
            .seasons
            .get(&season_id)
            .cloned()
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn list_season_weeks(&self, season: &LeagueSeason) -> Result<Vec<Week>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut weeks: Vec<Week> = state
            .season_weeks
            .get(&season.id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.weeks.get(id))
            .filter(|w| season.range.contains(w))
            .cloned()
            .collect();
        weeks.sort_by_key(|w| w.start_time);
        Ok(weeks)
    }

    async fn get_week(&self, week_id: WeekId) -> Result<Week, RepoRetrieveError> {
        let state = self.state.lock().unwrap();
        state
            .weeks
            .get(&week_id)
            .cloned()
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn list_league_seasons_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LeagueSeason>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .seasons
            .values()
            .filter(|s| s.range.start_time <= to && s.range.end_time >= from)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl PickRepository for InMemoryStore {
    async fn create_picks(&self, picks: Vec<NewPick>) -> Result<Vec<Pick>, RepoCreateError> {
        let mut state = self.state.lock().unwrap();
        let mut seen = HashSet::new();
        for pick in &picks {
            let key = (pick.user_id, pick.league_id, pick.game_id);
            let exists = state
                .picks
                .iter()
                .any(|p| (p.user_id, p.league_id, p.game_id) == key);
            if exists || !seen.insert(key) {
                return Err(RepoCreateError::Conflict);
            }
        }
        let now = Utc::now();
        let created: Vec<Pick> = picks
            .into_iter()
            .map(|p| p.into_pick(PickId::new(), now))
            .collect();
        state.picks.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_user_picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week_id: WeekId,
    ) -> Result<Vec<Pick>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .picks
            .iter()
            .filter(|p| p.league_id == league_id && p.user_id == user_id && p.week_id == week_id)
            .cloned()
            .collect())
    }

    async fn list_league_picks_for_weeks(
        &self,
        league_id: LeagueId,
        week_ids: &[WeekId],
    ) -> Result<Vec<Pick>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .picks
            .iter()
            .filter(|p| p.league_id == league_id && week_ids.contains(&p.week_id))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl StandingsRepository for InMemoryStore {
    async fn get_standings(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<Vec<StandingsRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<StandingsRecord> = state
            .standings
            .values()
            .filter(|r| r.league_id == league_id && r.season_id == season_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.rank);
        Ok(records)
    }

    async fn publish_season_standings(
        &self,
        standings: SeasonStandings,
    ) -> Result<PublishSummary, RepoError> {
        let mut state = self.state.lock().unwrap();
        let mut summary = PublishSummary::default();

        for update in &standings.status_updates {
            if let Some(pick) = state
                .picks
                .iter_mut()
                .find(|p| p.id == update.pick_id && p.status == PickStatus::Picked)
            {
                pick.status = update.status;
                summary.picks_resolved += 1;
            }
        }

        let kept: HashSet<UserId> = standings.records.iter().map(|r| r.user_id).collect();
        let before = state.standings.len();
        state.standings.retain(|(season_id, user_id), record| {
            !(*season_id == standings.season_id
                && record.league_id == standings.league_id
                && !kept.contains(user_id))
        });
        summary.stale_removed = (before - state.standings.len()) as u64;

        for record in standings.records {
            state
                .standings
                .insert((record.season_id, record.user_id), record);
            summary.records_written += 1;
        }
        Ok(summary)
    }

    async fn remove_user_standings_for_seasons_starting_after(
        &self,
        user_id: UserId,
        after: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        let mut state = self.state.lock().unwrap();
        let future_seasons: HashSet<SeasonId> = state
            .seasons
            .values()
            .filter(|s| s.range.start_time > after)
            .map(|s| s.id)
            .collect();
        let before = state.standings.len();
        state
            .standings
            .retain(|(season_id, uid), _| !(*uid == user_id && future_seasons.contains(season_id)));
        Ok((before - state.standings.len()) as u64)
    }
}
