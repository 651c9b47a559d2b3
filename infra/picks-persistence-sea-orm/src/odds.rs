use picks_league_app::domain::{
    GameId, OddsProviderId, RepoError, TeamId,
    odds::{GameOdds, OddsRepository},
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::{create_db_pool, entity::game_odds, storage_error};

pub struct OddsRepositoryImpl {
    db: DatabaseConnection,
}

impl OddsRepositoryImpl {
    pub async fn new() -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?))
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl OddsRepository for OddsRepositoryImpl {
    async fn list_odds_for_games(
        &self,
        provider_id: OddsProviderId,
        game_ids: &[GameId],
    ) -> Result<Vec<GameOdds>, RepoError> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = game_odds::Entity::find()
            .filter(game_odds::Column::ProviderId.eq(provider_id.0))
            .filter(game_odds::Column::GameId.is_in(game_ids.iter().map(|g| g.0)))
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(models
            .into_iter()
            .map(|m| GameOdds {
                game_id: GameId(m.game_id),
                provider_id: OddsProviderId(m.provider_id),
                favorite_team_id: TeamId(m.favorite_team_id),
                underdog_team_id: TeamId(m.underdog_team_id),
                spread: m.spread,
            })
            .collect())
    }
}
