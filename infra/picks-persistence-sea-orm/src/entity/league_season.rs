use chrono::Utc;
use sea_orm::entity::prelude::*;

/// `start_time` and `end_time` mirror the start week's start and the end week's end.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "league_seasons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub league_id: Uuid,
    pub sport_season_id: Uuid,
    pub start_week_id: Uuid,
    pub end_week_id: Uuid,
    pub start_time: chrono::DateTime<Utc>,
    pub end_time: chrono::DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
