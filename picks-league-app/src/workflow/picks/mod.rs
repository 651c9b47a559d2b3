use crate::domain::{
    GameId, TeamId, UserId,
    game::{Game, GameProgress},
    pick::{Pick, PickOutcome},
    season::Week,
};

pub mod league;
pub mod submit;
pub mod weekly;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickSelection {
    pub game_id: GameId,
    pub team_id: TeamId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyGameView {
    pub game: Game,
    pub progress: GameProgress,
    pub pick: Option<Pick>,
    pub outcome: PickOutcome,
    /// Line from the picked team's side, or the home team's side before a pick exists.
    pub spread: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeeklyPickSummary {
    pub required_picks: u32,
    pub picks_made: u32,
    pub correct: u32,
    pub games_final: u32,
    pub games_in_progress: u32,
    pub games_yet_to_play: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyPicksView {
    pub week: Week,
    pub previous_week: Option<Week>,
    pub next_week: Option<Week>,
    pub picks_locked: bool,
    pub can_submit: bool,
    pub games: Vec<WeeklyGameView>,
    pub summary: WeeklyPickSummary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaguePickView {
    pub game: Game,
    pub pick: Pick,
    pub outcome: PickOutcome,
    pub spread: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberPicksView {
    pub user_id: UserId,
    pub picks: Vec<LeaguePickView>,
    pub correct: u32,
}

/// Every current member's picks for one week, ordered by user id.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaguePicksView {
    pub week: Week,
    pub members: Vec<MemberPicksView>,
}
