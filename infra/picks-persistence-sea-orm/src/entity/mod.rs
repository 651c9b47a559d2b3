pub mod game;
pub mod game_odds;
pub mod league;
pub mod league_member;
pub mod league_season;
pub mod pick;
pub mod standings_record;
pub mod week;
