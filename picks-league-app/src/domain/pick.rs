use chrono::{DateTime, Utc};

use crate::domain::{
    GameId, LeagueId, PickId, RepoCreateError, RepoError, TeamId, UserId, WeekId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickType {
    StraightUp,
    AgainstSpread,
}

impl PickType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickType::StraightUp => "StraightUp",
            PickType::AgainstSpread => "AgainstSpread",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "StraightUp" => Some(PickType::StraightUp),
            "AgainstSpread" => Some(PickType::AgainstSpread),
            _ => None,
        }
    }
}

/// Outcome cached on a stored pick. Moves from `Picked` to a resolved
/// value exactly once and never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickStatus {
    Picked,
    Win,
    Push,
    Loss,
}

impl PickStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, PickStatus::Picked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PickStatus::Picked => "Picked",
            PickStatus::Win => "Win",
            PickStatus::Push => "Push",
            PickStatus::Loss => "Loss",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Picked" => Some(PickStatus::Picked),
            "Win" => Some(PickStatus::Win),
            "Push" => Some(PickStatus::Push),
            "Loss" => Some(PickStatus::Loss),
            _ => None,
        }
    }
}

/// What the grader reports for a game slot. `Unpicked` is display-only
/// and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickOutcome {
    Win,
    Push,
    Loss,
    Picked,
    Unpicked,
}

impl PickOutcome {
    pub fn resolved_status(&self) -> Option<PickStatus> {
        match self {
            PickOutcome::Win => Some(PickStatus::Win),
            PickOutcome::Push => Some(PickStatus::Push),
            PickOutcome::Loss => Some(PickStatus::Loss),
            PickOutcome::Picked | PickOutcome::Unpicked => None,
        }
    }
}

impl From<PickStatus> for PickOutcome {
    fn from(status: PickStatus) -> Self {
        match status {
            PickStatus::Picked => PickOutcome::Picked,
            PickStatus::Win => PickOutcome::Win,
            PickStatus::Push => PickOutcome::Push,
            PickStatus::Loss => PickOutcome::Loss,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pick {
    pub id: PickId,
    pub user_id: UserId,
    pub league_id: LeagueId,
    pub week_id: WeekId,
    pub game_id: GameId,
    pub team_id: TeamId,
    pub pick_type: PickType,
    /// Positive number of points the favorite must cover, captured at submission.
    pub frozen_spread: Option<f64>,
    pub frozen_favorite_team_id: Option<TeamId>,
    pub status: PickStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewPick {
    pub user_id: UserId,
    pub league_id: LeagueId,
    pub week_id: WeekId,
    pub game_id: GameId,
    pub team_id: TeamId,
    pub pick_type: PickType,
    pub frozen_spread: Option<f64>,
    pub frozen_favorite_team_id: Option<TeamId>,
}

impl NewPick {
    pub fn into_pick(self, id: PickId, created_at: DateTime<Utc>) -> Pick {
        Pick {
            id,
            user_id: self.user_id,
            league_id: self.league_id,
            week_id: self.week_id,
            game_id: self.game_id,
            team_id: self.team_id,
            pick_type: self.pick_type,
            frozen_spread: self.frozen_spread,
            frozen_favorite_team_id: self.frozen_favorite_team_id,
            status: PickStatus::Picked,
            created_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickStatusUpdate {
    pub pick_id: PickId,
    pub status: PickStatus,
}

#[async_trait::async_trait]
pub trait PickRepository {
    /// Inserts all picks or none. A duplicate (user, league, game) is a `Conflict`.
    async fn create_picks(&self, picks: Vec<NewPick>) -> Result<Vec<Pick>, RepoCreateError>;
    async fn list_user_picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week_id: WeekId,
    ) -> Result<Vec<Pick>, RepoError>;
    async fn list_league_picks_for_weeks(
        &self,
        league_id: LeagueId,
        week_ids: &[WeekId],
    ) -> Result<Vec<Pick>, RepoError>;
}
