use picks_league_app::domain::{
    GameId, RepoError, TeamId, WeekId,
    game::{Game, GameRepository, GameStatus},
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::{create_db_pool, entity::game, storage_error};

pub struct GameRepositoryImpl {
    db: DatabaseConnection,
}

impl GameRepositoryImpl {
    pub async fn new() -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?))
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_game(model: game::Model) -> Result<Game, RepoError> {
        let status = GameStatus::parse(&model.status).ok_or_else(|| {
            RepoError::StorageError(format!(
                "game {} has unknown status {}",
                model.id, model.status
            ))
        })?;
        Ok(Game {
            id: GameId(model.id),
            week_id: WeekId(model.week_id),
            home_team_id: TeamId(model.home_team_id),
            away_team_id: TeamId(model.away_team_id),
            home_score: model.home_score,
            away_score: model.away_score,
            status,
            period: model.period.max(0) as u32,
            start_time: model.start_time,
        })
    }
}

#[async_trait::async_trait]
impl GameRepository for GameRepositoryImpl {
    async fn list_games_for_weeks(&self, week_ids: &[WeekId]) -> Result<Vec<Game>, RepoError> {
        if week_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = game::Entity::find()
            .filter(game::Column::WeekId.is_in(week_ids.iter().map(|w| w.0)))
            .order_by_asc(game::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        models.into_iter().map(Self::model_to_game).collect()
    }
}
