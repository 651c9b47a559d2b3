use std::{sync::Arc, time::Duration};

use crate::domain::{GameId, OddsProviderId, RepoError, TeamId};

#[derive(Clone, Debug, PartialEq)]
pub struct GameOdds {
    pub game_id: GameId,
    pub provider_id: OddsProviderId,
    pub favorite_team_id: TeamId,
    pub underdog_team_id: TeamId,
    /// Points the favorite must win by, always non-negative.
    pub spread: f64,
}

#[async_trait::async_trait]
pub trait OddsRepository {
    async fn list_odds_for_games(
        &self,
        provider_id: OddsProviderId,
        game_ids: &[GameId],
    ) -> Result<Vec<GameOdds>, RepoError>;
}

/// Signed line for `team_id`: `-3` when it is the favorite, `+3` otherwise.
pub fn spread_label(spread: f64, favorite_team_id: TeamId, team_id: TeamId) -> String {
    let sign = if favorite_team_id == team_id { "-" } else { "+" };
    format!("{}{}", sign, spread)
}

/// Current lines by (game, provider), kept for a bounded time so pick
/// submission does not hit storage for every selection.
pub struct OddsLookup<O: OddsRepository> {
    odds_repository: Arc<O>,
    cache: moka::sync::Cache<(GameId, OddsProviderId), GameOdds>,
}

impl<O: OddsRepository + Send + Sync + 'static> OddsLookup<O> {
    pub fn new(odds_repository: Arc<O>, time_to_live: Duration) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(10_000)
            .time_to_live(time_to_live)
            .build();
        Self {
            odds_repository,
            cache,
        }
    }

    /// Returns the known odds among `game_ids`; games without a line are simply absent.
    pub async fn odds_for_games(
        &self,
        provider_id: OddsProviderId,
        game_ids: &[GameId],
    ) -> Result<Vec<GameOdds>, RepoError> {
        let mut found = Vec::with_capacity(game_ids.len());
        let mut missing = Vec::new();
        for game_id in game_ids {
            match self.cache.get(&(*game_id, provider_id)) {
                Some(odds) => found.push(odds),
                None => missing.push(*game_id),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }

        let fetched = self
            .odds_repository
            .list_odds_for_games(provider_id, &missing)
            .await?;
        for odds in fetched {
            self.cache
                .insert((odds.game_id, odds.provider_id), odds.clone());
            found.push(odds);
        }
        Ok(found)
    }
}
