use std::sync::Arc;

use log::info;
use picks_league_app::build_application;
use picks_persistence_sea_orm::{
    games::GameRepositoryImpl, leagues::LeagueRepositoryImpl, odds::OddsRepositoryImpl,
    picks::PickRepositoryImpl, seasons::SeasonRepositoryImpl,
    standings::StandingsRepositoryImpl,
};
use tokio::task::JoinHandle;

use crate::{config::ServerConfig, logs::init_logger};

mod config;
mod logs;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_logger().expect("Failed to initialize logger");

    let config = ServerConfig::from_env().expect("Invalid configuration");

    let game_repo = Arc::new(
        GameRepositoryImpl::new()
            .await
            .expect("Failed to connect to database"),
    );
    let odds_repo = Arc::new(OddsRepositoryImpl::new().await.expect("Failed to connect to database"));
    let pick_repo = Arc::new(PickRepositoryImpl::new().await.expect("Failed to connect to database"));
    let league_repo = Arc::new(
        LeagueRepositoryImpl::new()
            .await
            .expect("Failed to connect to database"),
    );
    let season_repo = Arc::new(
        SeasonRepositoryImpl::new()
            .await
            .expect("Failed to connect to database"),
    );
    let standings_repo = Arc::new(
        StandingsRepositoryImpl::new(config.standings_cache_ttl)
            .await
            .expect("Failed to connect to database"),
    );

    let mut app = build_application(
        game_repo,
        odds_repo,
        pick_repo,
        league_repo,
        season_repo,
        standings_repo,
        config.app.clone(),
    )
    .await;

    info!(
        "Starting standings recompute every {}s",
        config.app.recompute_interval.as_secs()
    );

    if let JobsOutcome::Shutdown = supervise_jobs(&mut app.jobs, shutdown_signal()).await {
        app.jobs.abort();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum JobsOutcome {
    Shutdown,
    Exited,
    Panicked,
}

/// Waits for `shutdown` while watching the background jobs, logging them if they stop first.
async fn supervise_jobs(
    jobs: &mut JoinHandle<()>,
    shutdown: impl Future<Output = ()>,
) -> JobsOutcome {
    tokio::select! {
        _ = shutdown => JobsOutcome::Shutdown,
        res = jobs => match res {
            Ok(()) => {
                log::error!("Standings recompute job exited unexpectedly");
                JobsOutcome::Exited
            }
            Err(e) if e.is_panic() => {
                log::error!("Standings recompute job panicked: {}", e);
                JobsOutcome::Panicked
            }
            Err(e) => {
                log::error!("Standings recompute job stopped: {}", e);
                JobsOutcome::Exited
            }
        },
    }
}
