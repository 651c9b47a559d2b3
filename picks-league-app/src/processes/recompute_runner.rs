use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::{
    domain::{LeagueId, SeasonId, season::SeasonRepository, standings::PublishSummary},
    workflow::standings::recompute::{RecomputeError, RecomputeStandingsWorkflow},
};

const STORAGE_ATTEMPTS: u32 = 3;
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Signalled by score ingestion after each completed pass. A signal sent
/// while no pass is waiting is kept until the runner next listens.
pub struct RecomputeTrigger {
    notify: Notify,
}

impl RecomputeTrigger {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    pub fn ingestion_pass_completed(&self) {
        self.notify.notify_one();
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecomputePassSummary {
    pub seasons_recomputed: u32,
    pub seasons_failed: u32,
}

pub struct RecomputeRunner<S: SeasonRepository, W: RecomputeStandingsWorkflow> {
    season_repository: Arc<S>,
    workflow: Arc<W>,
    trigger: Arc<RecomputeTrigger>,
    interval: Duration,
    storage_backoff: Duration,
}

impl<
    S: SeasonRepository + Send + Sync + 'static,
    W: RecomputeStandingsWorkflow + Send + Sync + 'static,
> RecomputeRunner<S, W>
{
    pub fn new(
        season_repository: Arc<S>,
        workflow: Arc<W>,
        trigger: Arc<RecomputeTrigger>,
        interval: Duration,
    ) -> Self {
        if interval < MIN_INTERVAL {
            log::warn!(
                "Recompute interval {:?} is too short, using {:?}",
                interval,
                MIN_INTERVAL
            );
        }
        Self {
            season_repository,
            workflow,
            trigger,
            interval: interval.max(MIN_INTERVAL),
            storage_backoff: Duration::from_secs(1),
        }
    }

    /// Base delay before retrying a season whose recompute hit a storage
    /// failure; doubles per attempt.
    pub fn with_storage_backoff(mut self, storage_backoff: Duration) -> Self {
        self.storage_backoff = storage_backoff;
        self
    }

    async fn recompute_with_retry(
        &self,
        league_id: LeagueId,
        season_id: SeasonId,
    ) -> Result<PublishSummary, RecomputeError> {
        let mut attempt = 1;
        loop {
            match self.workflow.recompute(league_id, season_id).await {
                Err(RecomputeError::Storage(e)) if attempt < STORAGE_ATTEMPTS => {
                    let delay = self.storage_backoff * 2u32.pow(attempt - 1);
                    log::warn!(
                        "Recompute for league {} season {} hit a storage error (attempt {}), retrying in {:?}: {}",
                        league_id,
                        season_id,
                        attempt,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Runs a pass on every interval tick or ingestion signal, whichever comes first.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.trigger.notified() => {
                    interval.reset();
                }
            }
            self.run_once(Utc::now()).await;
        }
    }

    /// Recomputes every league season active within the last interval.
    /// Storage failures are retried with backoff; a season that still fails
    /// is logged and skipped so the others still publish.
    pub async fn run_once(&self, now: DateTime<Utc>) -> RecomputePassSummary {
        let lookback = chrono::Duration::seconds(self.interval.as_secs() as i64);
        let seasons = match self
            .season_repository
            .list_league_seasons_overlapping(now - lookback, now)
            .await
        {
            Ok(seasons) => seasons,
            Err(e) => {
                log::error!("Failed to list active league seasons: {}", e);
                return RecomputePassSummary::default();
            }
        };

        let mut summary = RecomputePassSummary::default();
        for season in seasons {
            match self.recompute_with_retry(season.league_id, season.id).await {
                Ok(_) => summary.seasons_recomputed += 1,
                Err(e) => {
                    summary.seasons_failed += 1;
                    log::error!(
                        "Recompute failed for league {} season {}: {}",
                        season.league_id,
                        season.id,
                        e
                    );
                }
            }
        }
        log::debug!(
            "Recompute pass done: {} seasons recomputed, {} failed",
            summary.seasons_recomputed,
            summary.seasons_failed
        );
        summary
    }
}
