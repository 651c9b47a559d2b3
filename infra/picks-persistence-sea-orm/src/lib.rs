use async_lock::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
    sea_query::Index,
};

pub mod entity;
pub mod games;
pub mod leagues;
pub mod odds;
pub mod picks;
pub mod seasons;
pub mod standings;

use entity::{game, game_odds, league, league_member, league_season, pick, standings_record, week};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub async fn create_db_pool() -> Result<DatabaseConnection, DbErr> {
    DB_POOL
        .get_or_try_init(|| async move {
            let db_url = std::env::var("DATABASE_URL")
                .map_err(|_| DbErr::Custom("DATABASE_URL must be set".to_string()))?;
            let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS);

            let mut opt = ConnectOptions::new(&db_url);
            opt.max_connections(max_connections).sqlx_logging(false);
            log::info!(
                "Connecting to database with up to {} connections",
                max_connections
            );

            Database::connect(opt).await
        })
        .await
        .cloned()
}

pub(crate) fn storage_error(e: DbErr) -> picks_league_app::domain::RepoError {
    picks_league_app::domain::RepoError::StorageError(e.to_string())
}

/// Creates every table plus the one-pick-per-game index, skipping what already exists.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    let tables = vec![
        schema.create_table_from_entity(league::Entity),
        schema.create_table_from_entity(league_member::Entity),
        schema.create_table_from_entity(week::Entity),
        schema.create_table_from_entity(league_season::Entity),
        schema.create_table_from_entity(game::Entity),
        schema.create_table_from_entity(game_odds::Entity),
        schema.create_table_from_entity(pick::Entity),
        schema.create_table_from_entity(standings_record::Entity),
    ];
    for mut table in tables {
        table.if_not_exists();
        db.execute(&table).await?;
    }

    let pick_once_per_game = Index::create()
        .name("idx_picks_user_league_game")
        .table(pick::Entity)
        .col(pick::Column::UserId)
        .col(pick::Column::LeagueId)
        .col(pick::Column::GameId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(&pick_once_per_game).await?;

    Ok(())
}
