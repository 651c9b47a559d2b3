use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use picks_league_app::{
    domain::{
        GameId, LeagueId, OddsProviderId, RepoCreateError, SeasonId, TeamId, UserId, WeekId,
        game::{GameRepository, GameStatus},
        grading::GradingServiceImpl,
        league::LeagueRepository,
        odds::OddsRepository,
        pick::{NewPick, PickRepository, PickStatus, PickType},
        season::SeasonRepository,
        standings::{StandingsRepository, StandingsServiceImpl},
    },
    workflow::standings::recompute::{RecomputeStandingsWorkflow, RecomputeStandingsWorkflowImpl},
};
use picks_persistence_sea_orm::{
    create_tables,
    entity::{game, game_odds, league, league_member, league_season, week},
    games::GameRepositoryImpl,
    leagues::LeagueRepositoryImpl,
    odds::OddsRepositoryImpl,
    picks::PickRepositoryImpl,
    seasons::SeasonRepositoryImpl,
    standings::StandingsRepositoryImpl,
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

struct Seed {
    league_id: LeagueId,
    provider_id: OddsProviderId,
    season_id: SeasonId,
    week_ids: Vec<WeekId>,
    foreign_week_id: WeekId,
    alice: UserId,
    bob: UserId,
    final_game: GameId,
    final_home: TeamId,
    final_away: TeamId,
    upcoming_game: GameId,
    upcoming_home: TeamId,
}

fn season_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 3, 0, 0, 0).unwrap()
}

async fn connect() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    create_tables(&db).await.unwrap();
    db
}

async fn insert_week(
    db: &DatabaseConnection,
    sport_season_id: uuid::Uuid,
    index: i64,
) -> WeekId {
    let start = season_start() + ChronoDuration::weeks(index);
    let id = WeekId::new();
    week::ActiveModel {
        id: Set(id.0),
        sport_season_id: Set(sport_season_id),
        name: Set(format!("Week {}", index + 1)),
        week_type: Set("Regular".to_string()),
        start_time: Set(start),
        end_time: Set(start + ChronoDuration::weeks(1) - ChronoDuration::seconds(1)),
        pick_lock_time: Set(start + ChronoDuration::days(5)),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

async fn insert_game(
    db: &DatabaseConnection,
    week_id: WeekId,
    scores: (i32, i32),
    status: GameStatus,
    start_time: DateTime<Utc>,
) -> (GameId, TeamId, TeamId) {
    let (id, home, away) = (GameId::new(), TeamId::new(), TeamId::new());
    game::ActiveModel {
        id: Set(id.0),
        week_id: Set(week_id.0),
        home_team_id: Set(home.0),
        away_team_id: Set(away.0),
        home_score: Set(scores.0),
        away_score: Set(scores.1),
        status: Set(status.as_str().to_string()),
        period: Set(if status == GameStatus::Scheduled { 0 } else { 4 }),
        start_time: Set(start_time),
    }
    .insert(db)
    .await
    .unwrap();
    (id, home, away)
}

async fn seed(db: &DatabaseConnection) -> Seed {
    let league_id = LeagueId::new();
    let provider_id = OddsProviderId::new();
    league::ActiveModel {
        id: Set(league_id.0),
        name: Set("Office Pool".to_string()),
        pick_type: Set(PickType::StraightUp.as_str().to_string()),
        picks_per_week: Set(2),
        odds_provider_id: Set(provider_id.0),
    }
    .insert(db)
    .await
    .unwrap();

    let (alice, bob) = (UserId::new(), UserId::new());
    for user in [alice, bob] {
        league_member::ActiveModel {
            league_id: Set(league_id.0),
            user_id: Set(user.0),
            joined_at: Set(season_start() - ChronoDuration::days(10)),
        }
        .insert(db)
        .await
        .unwrap();
    }

    let sport_season = uuid::Uuid::new_v4();
    let mut week_ids = Vec::new();
    for index in 0..3 {
        week_ids.push(insert_week(db, sport_season, index).await);
    }
    let foreign_week_id = insert_week(db, uuid::Uuid::new_v4(), 1).await;

    let season_id = SeasonId::new();
    league_season::ActiveModel {
        id: Set(season_id.0),
        league_id: Set(league_id.0),
        sport_season_id: Set(sport_season),
        start_week_id: Set(week_ids[0].0),
        end_week_id: Set(week_ids[1].0),
        start_time: Set(season_start()),
        end_time: Set(season_start() + ChronoDuration::weeks(2) - ChronoDuration::seconds(1)),
    }
    .insert(db)
    .await
    .unwrap();

    let (final_game, final_home, final_away) = insert_game(
        db,
        week_ids[0],
        (24, 20),
        GameStatus::Final,
        season_start() + ChronoDuration::days(5),
    )
    .await;
    let (upcoming_game, upcoming_home, _) = insert_game(
        db,
        week_ids[1],
        (0, 0),
        GameStatus::Scheduled,
        season_start() + ChronoDuration::days(12),
    )
    .await;

    game_odds::ActiveModel {
        game_id: Set(upcoming_game.0),
        provider_id: Set(provider_id.0),
        favorite_team_id: Set(upcoming_home.0),
        underdog_team_id: Set(uuid::Uuid::new_v4()),
        spread: Set(3.5),
    }
    .insert(db)
    .await
    .unwrap();

    Seed {
        league_id,
        provider_id,
        season_id,
        week_ids,
        foreign_week_id,
        alice,
        bob,
        final_game,
        final_home,
        final_away,
        upcoming_game,
        upcoming_home,
    }
}

fn new_pick(s: &Seed, user_id: UserId, week: usize, game_id: GameId, team_id: TeamId) -> NewPick {
    NewPick {
        user_id,
        league_id: s.league_id,
        week_id: s.week_ids[week],
        game_id,
        team_id,
        pick_type: PickType::StraightUp,
        frozen_spread: None,
        frozen_favorite_team_id: None,
    }
}

#[tokio::test]
async fn test_reference_data_reads() {
    let db = connect().await;
    let s = seed(&db).await;

    let leagues = LeagueRepositoryImpl::from_connection(db.clone());
    let league = leagues.get_league(s.league_id).await.unwrap();
    assert_eq!(league.picks_per_week, 2);
    assert_eq!(league.pick_type, PickType::StraightUp);
    assert!(leagues.is_member(s.league_id, s.alice).await.unwrap());
    assert!(!leagues.is_member(s.league_id, UserId::new()).await.unwrap());
    assert_eq!(leagues.list_members(s.league_id).await.unwrap().len(), 2);

    let seasons = SeasonRepositoryImpl::from_connection(db.clone());
    let season = seasons.get_league_season(s.season_id).await.unwrap();
    let weeks = seasons.list_season_weeks(&season).await.unwrap();
    let week_ids: Vec<WeekId> = weeks.iter().map(|w| w.id).collect();
    assert_eq!(week_ids, vec![s.week_ids[0], s.week_ids[1]]);
    assert!(!week_ids.contains(&s.foreign_week_id));

    let active = seasons
        .list_league_seasons_overlapping(
            season_start() + ChronoDuration::days(3),
            season_start() + ChronoDuration::days(4),
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let games = GameRepositoryImpl::from_connection(db.clone())
        .list_games_for_weeks(&s.week_ids)
        .await
        .unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].id, s.final_game);

    let odds = OddsRepositoryImpl::from_connection(db.clone())
        .list_odds_for_games(s.provider_id, &[s.upcoming_game, s.final_game])
        .await
        .unwrap();
    assert_eq!(odds.len(), 1);
    assert_eq!(odds[0].favorite_team_id, s.upcoming_home);
    assert_eq!(odds[0].spread, 3.5);
}

#[tokio::test]
async fn test_create_picks_is_all_or_nothing() {
    let db = connect().await;
    let s = seed(&db).await;
    let picks = PickRepositoryImpl::from_connection(db.clone());

    let created = picks
        .create_picks(vec![new_pick(&s, s.alice, 0, s.final_game, s.final_home)])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].status, PickStatus::Picked);

    let err = picks
        .create_picks(vec![
            new_pick(&s, s.alice, 1, s.upcoming_game, s.upcoming_home),
            new_pick(&s, s.alice, 0, s.final_game, s.final_away),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, RepoCreateError::Conflict));

    let stored = picks
        .list_league_picks_for_weeks(s.league_id, &s.week_ids)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].team_id, s.final_home);
}

#[tokio::test]
async fn test_recompute_publishes_through_sea_orm() {
    let db = connect().await;
    let s = seed(&db).await;

    let picks = Arc::new(PickRepositoryImpl::from_connection(db.clone()));
    let standings = Arc::new(StandingsRepositoryImpl::from_connection(
        db.clone(),
        Duration::from_secs(60),
    ));
    picks
        .create_picks(vec![
            new_pick(&s, s.alice, 0, s.final_game, s.final_home),
            new_pick(&s, s.bob, 0, s.final_game, s.final_away),
            new_pick(&s, s.bob, 1, s.upcoming_game, s.upcoming_home),
        ])
        .await
        .unwrap();

    let workflow = RecomputeStandingsWorkflowImpl::new(
        Arc::new(SeasonRepositoryImpl::from_connection(db.clone())),
        Arc::new(LeagueRepositoryImpl::from_connection(db.clone())),
        Arc::new(GameRepositoryImpl::from_connection(db.clone())),
        picks.clone(),
        standings.clone(),
        Arc::new(StandingsServiceImpl::new(Arc::new(GradingServiceImpl::new()))),
    );

    let summary = workflow.recompute(s.league_id, s.season_id).await.unwrap();
    assert_eq!(summary.picks_resolved, 2);
    assert_eq!(summary.records_written, 2);

    let records = standings
        .get_standings(s.league_id, s.season_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user_id, s.alice);
    assert_eq!((records[0].wins, records[0].rank), (1, 1));
    assert_eq!((records[1].losses, records[1].rank), (1, 2));

    let stored = picks
        .list_league_picks_for_weeks(s.league_id, &s.week_ids)
        .await
        .unwrap();
    let pending = stored
        .iter()
        .filter(|p| p.status == PickStatus::Picked)
        .count();
    assert_eq!(pending, 1);

    let again = workflow.recompute(s.league_id, s.season_id).await.unwrap();
    assert_eq!(again.picks_resolved, 0);
    assert_eq!(again.stale_removed, 0);
    assert_eq!(
        standings
            .get_standings(s.league_id, s.season_id)
            .await
            .unwrap(),
        records
    );
}

#[tokio::test]
async fn test_removed_account_keeps_started_season_history() {
    let db = connect().await;
    let s = seed(&db).await;

    let standings = Arc::new(StandingsRepositoryImpl::from_connection(
        db.clone(),
        Duration::from_secs(60),
    ));
    let workflow = RecomputeStandingsWorkflowImpl::new(
        Arc::new(SeasonRepositoryImpl::from_connection(db.clone())),
        Arc::new(LeagueRepositoryImpl::from_connection(db.clone())),
        Arc::new(GameRepositoryImpl::from_connection(db.clone())),
        Arc::new(PickRepositoryImpl::from_connection(db.clone())),
        standings.clone(),
        Arc::new(StandingsServiceImpl::new(Arc::new(GradingServiceImpl::new()))),
    );
    workflow.recompute(s.league_id, s.season_id).await.unwrap();

    let during = season_start() + ChronoDuration::days(1);
    let removed = standings
        .remove_user_standings_for_seasons_starting_after(s.bob, during)
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let before = season_start() - ChronoDuration::days(1);
    let removed = standings
        .remove_user_standings_for_seasons_starting_after(s.bob, before)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let records = standings
        .get_standings(s.league_id, s.season_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, s.alice);
}
