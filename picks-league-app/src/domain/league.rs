use chrono::{DateTime, Utc};

use crate::domain::{LeagueId, OddsProviderId, RepoError, RepoRetrieveError, UserId, pick::PickType};

#[derive(Clone, Debug, PartialEq)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub pick_type: PickType,
    pub picks_per_week: u32,
    pub odds_provider_id: OddsProviderId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeagueMember {
    pub league_id: LeagueId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait LeagueRepository {
    async fn get_league(&self, league_id: LeagueId) -> Result<League, RepoRetrieveError>;
    async fn list_members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, RepoError>;
    async fn is_member(&self, league_id: LeagueId, user_id: UserId) -> Result<bool, RepoError>;
}
