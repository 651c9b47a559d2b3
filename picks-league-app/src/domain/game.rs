use chrono::{DateTime, Utc};

use crate::domain::{GameId, RepoError, TeamId, WeekId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "Scheduled",
            GameStatus::InProgress => "InProgress",
            GameStatus::Final => "Final",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Scheduled" => Some(GameStatus::Scheduled),
            "InProgress" => Some(GameStatus::InProgress),
            "Final" => Some(GameStatus::Final),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameProgress {
    YetToPlay,
    InProgress,
    Final,
}

/// Point-in-time facts about a game as last written by score ingestion.
/// Scores are only authoritative once `status` is `Final`.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub week_id: WeekId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: i32,
    pub away_score: i32,
    pub status: GameStatus,
    pub period: u32,
    pub start_time: DateTime<Utc>,
}

impl Game {
    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Final
    }

    /// A game locks further picks once play has begun or its kickoff has passed.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.period > 0 || self.status != GameStatus::Scheduled || self.start_time <= now
    }

    pub fn progress(&self) -> GameProgress {
        if self.is_final() {
            GameProgress::Final
        } else if self.period > 0 {
            GameProgress::InProgress
        } else {
            GameProgress::YetToPlay
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }

    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if team_id == self.home_team_id {
            Some(self.away_team_id)
        } else if team_id == self.away_team_id {
            Some(self.home_team_id)
        } else {
            None
        }
    }

    /// Final margin from `team_id`'s side: positive when that team outscored its opponent.
    pub fn point_differential(&self, team_id: TeamId) -> Option<i32> {
        if team_id == self.home_team_id {
            Some(self.home_score - self.away_score)
        } else if team_id == self.away_team_id {
            Some(self.away_score - self.home_score)
        } else {
            None
        }
    }
}

/// Read-only view of the games written by the ingestion job.
#[async_trait::async_trait]
pub trait GameRepository {
    async fn list_games_for_weeks(&self, week_ids: &[WeekId]) -> Result<Vec<Game>, RepoError>;
}
