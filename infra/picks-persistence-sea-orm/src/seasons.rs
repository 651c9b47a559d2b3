use chrono::{DateTime, Utc};
use picks_league_app::domain::{
    LeagueId, RepoError, RepoRetrieveError, SeasonId, WeekId,
    season::{LeagueSeason, SeasonRepository, SeasonWeekRange, Week, WeekType},
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    create_db_pool,
    entity::{league_season, week},
    storage_error,
};

pub struct SeasonRepositoryImpl {
    db: DatabaseConnection,
}

impl SeasonRepositoryImpl {
    pub async fn new() -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?))
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_season(model: league_season::Model) -> LeagueSeason {
        LeagueSeason {
            id: SeasonId(model.id),
            league_id: LeagueId(model.league_id),
            start_week_id: WeekId(model.start_week_id),
            end_week_id: WeekId(model.end_week_id),
            range: SeasonWeekRange {
                start_time: model.start_time,
                end_time: model.end_time,
            },
        }
    }

    fn model_to_week(model: week::Model) -> Result<Week, String> {
        let week_type = WeekType::parse(&model.week_type)
            .ok_or_else(|| format!("week {} has unknown type {}", model.id, model.week_type))?;
        Ok(Week {
            id: WeekId(model.id),
            name: model.name,
            week_type,
            start_time: model.start_time,
            end_time: model.end_time,
            pick_lock_time: model.pick_lock_time,
        })
    }
}

#[async_trait::async_trait]
impl SeasonRepository for SeasonRepositoryImpl {
    async fn get_league_season(
        &self,
        season_id: SeasonId,
    ) -> Result<LeagueSeason, RepoRetrieveError> {
        league_season::Entity::find_by_id(season_id.0)
            .one(&self.db)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .map(Self::model_to_season)
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn list_season_weeks(&self, season: &LeagueSeason) -> Result<Vec<Week>, RepoError> {
        let Some(season_model) = league_season::Entity::find_by_id(season.id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
        else {
            return Ok(Vec::new());
        };

        let models = week::Entity::find()
            .filter(week::Column::SportSeasonId.eq(season_model.sport_season_id))
            .filter(week::Column::StartTime.gte(season.range.start_time))
            .filter(week::Column::EndTime.lte(season.range.end_time))
            .order_by_asc(week::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        models
            .into_iter()
            .map(|m| Self::model_to_week(m).map_err(RepoError::StorageError))
            .collect()
    }

    async fn get_week(&self, week_id: WeekId) -> Result<Week, RepoRetrieveError> {
        let model = week::Entity::find_by_id(week_id.0)
            .one(&self.db)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;
        Self::model_to_week(model).map_err(RepoRetrieveError::StorageError)
    }

    async fn list_league_seasons_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LeagueSeason>, RepoError> {
        let models = league_season::Entity::find()
            .filter(league_season::Column::StartTime.lte(to))
            .filter(league_season::Column::EndTime.gte(from))
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(Self::model_to_season).collect())
    }
}
