use thiserror::Error;

use crate::domain::{
    GameId, PickId,
    game::Game,
    pick::{Pick, PickOutcome, PickType},
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradeError {
    #[error("pick {pick_id} is in an invalid state: {reason}")]
    InvalidState { pick_id: PickId, reason: String },
    #[error("pick {pick_id} references game {pick_game_id} but was graded against game {game_id}")]
    GameMismatch {
        pick_id: PickId,
        pick_game_id: GameId,
        game_id: GameId,
    },
}

pub trait GradingService {
    fn grade(&self, game: &Game, pick: &Pick) -> Result<PickOutcome, GradeError>;

    fn grade_slot(&self, game: &Game, pick: Option<&Pick>) -> Result<PickOutcome, GradeError> {
        match pick {
            Some(pick) => self.grade(game, pick),
            None => Ok(PickOutcome::Unpicked),
        }
    }
}

pub struct GradingServiceImpl;

impl GradingServiceImpl {
    pub fn new() -> Self {
        Self {}
    }

    fn outcome_from_margin(margin: f64) -> PickOutcome {
        if margin > 0.0 {
            PickOutcome::Win
        } else if margin == 0.0 {
            PickOutcome::Push
        } else {
            PickOutcome::Loss
        }
    }

    fn against_spread_margin(pick: &Pick, differential: i32) -> Result<f64, GradeError> {
        let Some(spread) = pick.frozen_spread else {
            return Err(GradeError::InvalidState {
                pick_id: pick.id,
                reason: "against-spread pick has no frozen spread".to_string(),
            });
        };
        let Some(favorite) = pick.frozen_favorite_team_id else {
            return Err(GradeError::InvalidState {
                pick_id: pick.id,
                reason: "against-spread pick has no frozen favorite".to_string(),
            });
        };
        if !spread.is_finite() || spread < 0.0 {
            return Err(GradeError::InvalidState {
                pick_id: pick.id,
                reason: format!("frozen spread {} is not a non-negative magnitude", spread),
            });
        }

        let differential = differential as f64;
        if favorite == pick.team_id {
            Ok(differential - spread)
        } else {
            Ok(differential + spread)
        }
    }
}

impl GradingService for GradingServiceImpl {
    fn grade(&self, game: &Game, pick: &Pick) -> Result<PickOutcome, GradeError> {
        if pick.game_id != game.id {
            return Err(GradeError::GameMismatch {
                pick_id: pick.id,
                pick_game_id: pick.game_id,
                game_id: game.id,
            });
        }

        if pick.status.is_resolved() {
            return Ok(pick.status.into());
        }

        if !game.is_final() {
            return Ok(PickOutcome::Picked);
        }

        let Some(differential) = game.point_differential(pick.team_id) else {
            return Err(GradeError::InvalidState {
                pick_id: pick.id,
                reason: format!("team {} did not play in game {}", pick.team_id, game.id),
            });
        };

        let margin = match pick.pick_type {
            PickType::StraightUp => differential as f64,
            PickType::AgainstSpread => Self::against_spread_margin(pick, differential)?,
        };

        Ok(Self::outcome_from_margin(margin))
    }
}
