use chrono::Utc;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "picks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub league_id: Uuid,
    pub week_id: Uuid,
    pub game_id: Uuid,
    pub team_id: Uuid,
    pub pick_type: String,
    pub frozen_spread: Option<f64>,
    pub frozen_favorite_team_id: Option<Uuid>,
    pub status: String,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
