use crate::domain::{UserId, standings::StandingsRecord};

pub mod get;
pub mod recompute;

#[derive(Clone, Debug, PartialEq)]
pub struct StandingsRowView {
    pub user_id: UserId,
    pub rank: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub points: f64,
    /// `wins-losses-pushes`
    pub record: String,
}

impl From<StandingsRecord> for StandingsRowView {
    fn from(r: StandingsRecord) -> Self {
        Self {
            user_id: r.user_id,
            rank: r.rank,
            wins: r.wins,
            losses: r.losses,
            pushes: r.pushes,
            points: r.points,
            record: format!("{}-{}-{}", r.wins, r.losses, r.pushes),
        }
    }
}
