use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    domain::{
        game::GameRepository,
        grading::GradingServiceImpl,
        league::LeagueRepository,
        odds::{OddsLookup, OddsRepository},
        pick::PickRepository,
        season::SeasonRepository,
        standings::{StandingsRepository, StandingsServiceImpl},
    },
    processes::recompute_runner::{RecomputeRunner, RecomputeTrigger},
    workflow::{
        account::remove_account::{RemoveAccountWorkflow, RemoveAccountWorkflowImpl},
        picks::{
            league::{GetLeaguePicksUseCase, GetLeaguePicksUseCaseImpl},
            submit::{SubmitPicksUseCase, SubmitPicksUseCaseImpl},
            weekly::{GetWeeklyPicksUseCase, GetWeeklyPicksUseCaseImpl},
        },
        standings::{
            get::{GetStandingsUseCase, GetStandingsUseCaseImpl},
            recompute::{RecomputeStandingsWorkflow, RecomputeStandingsWorkflowImpl},
        },
    },
};

pub mod domain;
pub mod processes;
pub mod workflow;

#[cfg(test)]
mod testing;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub recompute_interval: Duration,
    pub odds_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recompute_interval: Duration::from_secs(15 * 60),
            odds_cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

pub struct Application {
    pub jobs: JoinHandle<()>,

    /// Signal for the score ingestion job after each completed pass.
    pub recompute_trigger: Arc<RecomputeTrigger>,

    pub picks_submit_use_case: Box<dyn SubmitPicksUseCase + Send + Sync + 'static>,
    pub picks_get_weekly_use_case: Box<dyn GetWeeklyPicksUseCase + Send + Sync + 'static>,
    pub picks_get_league_use_case: Box<dyn GetLeaguePicksUseCase + Send + Sync + 'static>,

    pub standings_get_use_case: Box<dyn GetStandingsUseCase + Send + Sync + 'static>,
    pub standings_recompute_workflow: Arc<dyn RecomputeStandingsWorkflow + Send + Sync + 'static>,

    pub account_remove_workflow: Box<dyn RemoveAccountWorkflow + Send + Sync + 'static>,
}

pub async fn build_application<
    G: GameRepository + Send + Sync + 'static,
    O: OddsRepository + Send + Sync + 'static,
    P: PickRepository + Send + Sync + 'static,
    L: LeagueRepository + Send + Sync + 'static,
    S: SeasonRepository + Send + Sync + 'static,
    SR: StandingsRepository + Send + Sync + 'static,
>(
    game_repository: Arc<G>,
    odds_repository: Arc<O>,
    pick_repository: Arc<P>,
    league_repository: Arc<L>,
    season_repository: Arc<S>,
    standings_repository: Arc<SR>,
    config: AppConfig,
) -> Application {
    let grading_service = Arc::new(GradingServiceImpl::new());
    let standings_service = Arc::new(StandingsServiceImpl::new(grading_service.clone()));
    let odds_lookup = Arc::new(OddsLookup::new(
        odds_repository.clone(),
        config.odds_cache_ttl,
    ));
    let recompute_trigger = Arc::new(RecomputeTrigger::new());

    let recompute_standings_workflow = Arc::new(RecomputeStandingsWorkflowImpl::new(
        season_repository.clone(),
        league_repository.clone(),
        game_repository.clone(),
        pick_repository.clone(),
        standings_repository.clone(),
        standings_service.clone(),
    ));

    let recompute_runner = RecomputeRunner::new(
        season_repository.clone(),
        recompute_standings_workflow.clone(),
        recompute_trigger.clone(),
        config.recompute_interval,
    );

    let jobs = tokio::spawn(async move {
        recompute_runner.run().await;
    });

    Application {
        jobs,
        recompute_trigger,

        picks_submit_use_case: Box::new(SubmitPicksUseCaseImpl::new(
            league_repository.clone(),
            season_repository.clone(),
            game_repository.clone(),
            pick_repository.clone(),
            odds_lookup.clone(),
        )),
        picks_get_weekly_use_case: Box::new(GetWeeklyPicksUseCaseImpl::new(
            league_repository.clone(),
            season_repository.clone(),
            game_repository.clone(),
            pick_repository.clone(),
            odds_lookup.clone(),
            grading_service.clone(),
        )),
        picks_get_league_use_case: Box::new(GetLeaguePicksUseCaseImpl::new(
            league_repository.clone(),
            season_repository.clone(),
            game_repository.clone(),
            pick_repository.clone(),
            grading_service.clone(),
        )),

        standings_get_use_case: Box::new(GetStandingsUseCaseImpl::new(
            season_repository.clone(),
            standings_repository.clone(),
        )),
        standings_recompute_workflow: recompute_standings_workflow,

        account_remove_workflow: Box::new(RemoveAccountWorkflowImpl::new(
            standings_repository.clone(),
        )),
    }
}
