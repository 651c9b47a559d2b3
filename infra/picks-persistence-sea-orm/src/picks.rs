use chrono::Utc;
use picks_league_app::domain::{
    GameId, LeagueId, PickId, RepoCreateError, RepoError, TeamId, UserId, WeekId,
    pick::{NewPick, Pick, PickRepository, PickStatus, PickType},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionError, TransactionTrait,
};

use crate::{create_db_pool, entity::pick, storage_error};

pub struct PickRepositoryImpl {
    db: DatabaseConnection,
}

impl PickRepositoryImpl {
    pub async fn new() -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?))
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_pick(model: pick::Model) -> Result<Pick, RepoError> {
        let pick_type = PickType::parse(&model.pick_type).ok_or_else(|| {
            RepoError::StorageError(format!(
                "pick {} has unknown type {}",
                model.id, model.pick_type
            ))
        })?;
        let status = PickStatus::parse(&model.status).ok_or_else(|| {
            RepoError::StorageError(format!(
                "pick {} has unknown status {}",
                model.id, model.status
            ))
        })?;
        Ok(Pick {
            id: PickId(model.id),
            user_id: UserId(model.user_id),
            league_id: LeagueId(model.league_id),
            week_id: WeekId(model.week_id),
            game_id: GameId(model.game_id),
            team_id: TeamId(model.team_id),
            pick_type,
            frozen_spread: model.frozen_spread,
            frozen_favorite_team_id: model.frozen_favorite_team_id.map(TeamId),
            status,
            created_at: model.created_at,
        })
    }

    fn pick_to_model(pick: &Pick) -> pick::ActiveModel {
        pick::ActiveModel {
            id: Set(pick.id.0),
            user_id: Set(pick.user_id.0),
            league_id: Set(pick.league_id.0),
            week_id: Set(pick.week_id.0),
            game_id: Set(pick.game_id.0),
            team_id: Set(pick.team_id.0),
            pick_type: Set(pick.pick_type.as_str().to_string()),
            frozen_spread: Set(pick.frozen_spread),
            frozen_favorite_team_id: Set(pick.frozen_favorite_team_id.map(|t| t.0)),
            status: Set(pick.status.as_str().to_string()),
            created_at: Set(pick.created_at),
        }
    }

    fn create_error(e: DbErr) -> RepoCreateError {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RepoCreateError::Conflict,
            _ => RepoCreateError::StorageError(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl PickRepository for PickRepositoryImpl {
    async fn create_picks(&self, picks: Vec<NewPick>) -> Result<Vec<Pick>, RepoCreateError> {
        let now = Utc::now();
        let picks: Vec<Pick> = picks
            .into_iter()
            .map(|p| p.into_pick(PickId::new(), now))
            .collect();

        let res = self
            .db
            .transaction::<_, Vec<Pick>, RepoCreateError>(|c| {
                Box::pin(async move {
                    for p in &picks {
                        let existing = pick::Entity::find()
                            .filter(pick::Column::UserId.eq(p.user_id.0))
                            .filter(pick::Column::LeagueId.eq(p.league_id.0))
                            .filter(pick::Column::GameId.eq(p.game_id.0))
                            .count(c)
                            .await
                            .map_err(|e| RepoCreateError::StorageError(e.to_string()))?;
                        if existing > 0 {
                            return Err(RepoCreateError::Conflict);
                        }
                        Self::pick_to_model(p)
                            .insert(c)
                            .await
                            .map_err(Self::create_error)?;
                    }
                    Ok(picks)
                })
            })
            .await;

        match res {
            Ok(picks) => Ok(picks),
            Err(TransactionError::Transaction(e)) => {
                log::warn!("Pick submission rolled back: {}", e);
                Err(e)
            }
            Err(TransactionError::Connection(e)) => {
                log::error!("Pick submission failed to start a transaction: {}", e);
                Err(RepoCreateError::StorageError(e.to_string()))
            }
        }
    }

    async fn list_user_picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week_id: WeekId,
    ) -> Result<Vec<Pick>, RepoError> {
        let models = pick::Entity::find()
            .filter(pick::Column::LeagueId.eq(league_id.0))
            .filter(pick::Column::UserId.eq(user_id.0))
            .filter(pick::Column::WeekId.eq(week_id.0))
            .order_by_asc(pick::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        models.into_iter().map(Self::model_to_pick).collect()
    }

    async fn list_league_picks_for_weeks(
        &self,
        league_id: LeagueId,
        week_ids: &[WeekId],
    ) -> Result<Vec<Pick>, RepoError> {
        if week_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = pick::Entity::find()
            .filter(pick::Column::LeagueId.eq(league_id.0))
            .filter(pick::Column::WeekId.is_in(week_ids.iter().map(|w| w.0)))
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        models.into_iter().map(Self::model_to_pick).collect()
    }
}
