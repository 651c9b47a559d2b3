use picks_league_app::domain::{
    LeagueId, OddsProviderId, RepoError, RepoRetrieveError, UserId,
    league::{League, LeagueMember, LeagueRepository},
    pick::PickType,
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    create_db_pool,
    entity::{league, league_member},
    storage_error,
};

pub struct LeagueRepositoryImpl {
    db: DatabaseConnection,
}

impl LeagueRepositoryImpl {
    pub async fn new() -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?))
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl LeagueRepository for LeagueRepositoryImpl {
    async fn get_league(&self, league_id: LeagueId) -> Result<League, RepoRetrieveError> {
        let model = league::Entity::find_by_id(league_id.0)
            .one(&self.db)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;

        let pick_type = PickType::parse(&model.pick_type).ok_or_else(|| {
            RepoRetrieveError::StorageError(format!(
                "league {} has unknown pick type {}",
                model.id, model.pick_type
            ))
        })?;
        Ok(League {
            id: LeagueId(model.id),
            name: model.name,
            pick_type,
            picks_per_week: model.picks_per_week.max(0) as u32,
            odds_provider_id: OddsProviderId(model.odds_provider_id),
        })
    }

    async fn list_members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, RepoError> {
        let models = league_member::Entity::find()
            .filter(league_member::Column::LeagueId.eq(league_id.0))
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(models
            .into_iter()
            .map(|m| LeagueMember {
                league_id: LeagueId(m.league_id),
                user_id: UserId(m.user_id),
                joined_at: m.joined_at,
            })
            .collect())
    }

    async fn is_member(&self, league_id: LeagueId, user_id: UserId) -> Result<bool, RepoError> {
        let count = league_member::Entity::find()
            .filter(league_member::Column::LeagueId.eq(league_id.0))
            .filter(league_member::Column::UserId.eq(user_id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(count > 0)
    }
}
