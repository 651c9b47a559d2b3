use std::time::Duration;

use chrono::{DateTime, Utc};
use picks_league_app::domain::{
    LeagueId, RepoError, SeasonId, UserId,
    pick::PickStatus,
    standings::{PublishSummary, SeasonStandings, StandingsRecord, StandingsRepository},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionError, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use crate::{
    create_db_pool,
    entity::{league_season, pick, standings_record},
    storage_error,
};

pub struct StandingsRepositoryImpl {
    db: DatabaseConnection,
    standings_cache: moka::sync::Cache<(LeagueId, SeasonId), Vec<StandingsRecord>>,
}

impl StandingsRepositoryImpl {
    pub async fn new(cache_ttl: Duration) -> Result<Self, DbErr> {
        Ok(Self::from_connection(create_db_pool().await?, cache_ttl))
    }

    pub fn from_connection(db: DatabaseConnection, cache_ttl: Duration) -> Self {
        let standings_cache = moka::sync::Cache::builder()
            .max_capacity(1_000)
            .time_to_live(cache_ttl)
            .build();
        Self {
            db,
            standings_cache,
        }
    }

    fn model_to_record(model: standings_record::Model) -> StandingsRecord {
        StandingsRecord {
            league_id: LeagueId(model.league_id),
            season_id: SeasonId(model.season_id),
            user_id: UserId(model.user_id),
            wins: model.wins.max(0) as u32,
            losses: model.losses.max(0) as u32,
            pushes: model.pushes.max(0) as u32,
            points: model.points,
            rank: model.rank.max(0) as u32,
        }
    }

    fn record_to_model(
        record: &StandingsRecord,
        updated_at: DateTime<Utc>,
    ) -> standings_record::ActiveModel {
        standings_record::ActiveModel {
            season_id: Set(record.season_id.0),
            user_id: Set(record.user_id.0),
            league_id: Set(record.league_id.0),
            wins: Set(record.wins as i32),
            losses: Set(record.losses as i32),
            pushes: Set(record.pushes as i32),
            points: Set(record.points),
            rank: Set(record.rank as i32),
            updated_at: Set(updated_at),
        }
    }
}

#[async_trait::async_trait]
impl StandingsRepository for StandingsRepositoryImpl {
    async fn get_standings(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<Vec<StandingsRecord>, RepoError> {
        if let Some(cached) = self.standings_cache.get(&(league_id, season_id)) {
            return Ok(cached);
        }
        let models = standings_record::Entity::find()
            .filter(standings_record::Column::LeagueId.eq(league_id.0))
            .filter(standings_record::Column::SeasonId.eq(season_id.0))
            .order_by_asc(standings_record::Column::Rank)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        let records: Vec<StandingsRecord> =
            models.into_iter().map(Self::model_to_record).collect();
        self.standings_cache
            .insert((league_id, season_id), records.clone());
        Ok(records)
    }

    async fn publish_season_standings(
        &self,
        standings: SeasonStandings,
    ) -> Result<PublishSummary, RepoError> {
        let league_id = standings.league_id;
        let season_id = standings.season_id;
        let now = Utc::now();

        let res = self
            .db
            .transaction::<_, PublishSummary, RepoError>(|c| {
                Box::pin(async move {
                    let mut summary = PublishSummary::default();

                    // Only a still-pending pick may move; resolved statuses are final.
                    for update in &standings.status_updates {
                        let result = pick::Entity::update_many()
                            .col_expr(pick::Column::Status, Expr::value(update.status.as_str()))
                            .filter(pick::Column::Id.eq(update.pick_id.0))
                            .filter(pick::Column::Status.eq(PickStatus::Picked.as_str()))
                            .exec(c)
                            .await
                            .map_err(storage_error)?;
                        summary.picks_resolved += result.rows_affected;
                    }

                    let kept: Vec<uuid::Uuid> =
                        standings.records.iter().map(|r| r.user_id.0).collect();
                    let removed = standings_record::Entity::delete_many()
                        .filter(standings_record::Column::LeagueId.eq(league_id.0))
                        .filter(standings_record::Column::SeasonId.eq(season_id.0))
                        .filter(standings_record::Column::UserId.is_not_in(kept))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    summary.stale_removed = removed.rows_affected;

                    for record in &standings.records {
                        standings_record::Entity::insert(Self::record_to_model(record, now))
                            .on_conflict(
                                OnConflict::columns([
                                    standings_record::Column::SeasonId,
                                    standings_record::Column::UserId,
                                ])
                                .update_columns([
                                    standings_record::Column::LeagueId,
                                    standings_record::Column::Wins,
                                    standings_record::Column::Losses,
                                    standings_record::Column::Pushes,
                                    standings_record::Column::Points,
                                    standings_record::Column::Rank,
                                    standings_record::Column::UpdatedAt,
                                ])
                                .to_owned(),
                            )
                            .exec(c)
                            .await
                            .map_err(storage_error)?;
                        summary.records_written += 1;
                    }

                    Ok(summary)
                })
            })
            .await;

        match res {
            Ok(summary) => {
                self.standings_cache.invalidate(&(league_id, season_id));
                Ok(summary)
            }
            Err(TransactionError::Transaction(e)) => {
                log::error!(
                    "Publishing standings for league {} season {} rolled back: {}",
                    league_id,
                    season_id,
                    e
                );
                Err(e)
            }
            Err(TransactionError::Connection(e)) => {
                log::error!(
                    "Publishing standings for league {} season {} failed to start a transaction: {}",
                    league_id,
                    season_id,
                    e
                );
                Err(storage_error(e))
            }
        }
    }

    async fn remove_user_standings_for_seasons_starting_after(
        &self,
        user_id: UserId,
        after: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        let upcoming: Vec<uuid::Uuid> = league_season::Entity::find()
            .select_only()
            .column(league_season::Column::Id)
            .filter(league_season::Column::StartTime.gt(after))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        if upcoming.is_empty() {
            return Ok(0);
        }

        let removed = standings_record::Entity::delete_many()
            .filter(standings_record::Column::UserId.eq(user_id.0))
            .filter(standings_record::Column::SeasonId.is_in(upcoming))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;

        if removed.rows_affected > 0 {
            log::debug!(
                "Removed {} upcoming standings records of user {}",
                removed.rows_affected,
                user_id
            );
            self.standings_cache.invalidate_all();
        }
        Ok(removed.rows_affected)
    }
}
