//! Multi-ply lookahead against modelled opponents.
//!
//! Each ply takes the mover's best few moves by immediate progress, plays
//! each one, lets every opponent model answer, and recurses. Leaves are
//! scored by the mover's total progress, and a top-level move is worth the
//! mean over all leaves beneath it.

use std::collections::HashSet;

use log::trace;

use crate::error::GameError;
use crate::game::{Game, PositionSet, Trial};
use crate::players::Player;
use crate::search::{Candidate, MoveSearch};
use crate::select::top_k;
use crate::{Color, Coord};

pub const DEFAULT_FANOUT: usize = 3;
pub const DEFAULT_MAX_PLAY_DEPTH: usize = 2;

/// Running sum over terminal positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Leaves {
    sum: f64,
    count: usize,
}

impl Leaves {
    fn single(value: f64) -> Leaves {
        Leaves { sum: value, count: 1 }
    }

    fn merge(&mut self, other: Leaves) {
        self.sum += other.sum;
        self.count += other.count;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

#[derive(Clone, Debug)]
pub struct PlanningSearch {
    color: Color,
    move_finder: MoveSearch,
    fanout: usize,
    max_play_depth: usize,
}

impl PlanningSearch {
    pub fn new(
        color: Color,
        max_depth: usize,
        position_memory: usize,
        fanout: usize,
        max_play_depth: usize,
    ) -> PlanningSearch {
        PlanningSearch {
            color,
            move_finder: MoveSearch::new(color, max_depth, position_memory),
            fanout,
            max_play_depth,
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn move_finder(&self) -> &MoveSearch {
        &self.move_finder
    }

    #[inline]
    pub fn move_finder_mut(&mut self) -> &mut MoveSearch {
        &mut self.move_finder
    }

    /// Score each of the top-level moves by the mean terminal progress found
    /// beneath it. Moves whose every continuation was pruned are left out.
    ///
    /// The game is unchanged on return, whether or not an error occurred.
    pub fn evaluate(&self, game: &mut Game, opponents: &mut [Box<dyn Player>]) -> Result<Vec<Candidate>, GameError> {
        if self.max_play_depth == 0 {
            return Ok(Vec::new());
        }

        let mut explored = HashSet::new();
        explored.insert(game.position_set(self.color));
        self.score_top_level(game, opponents, &mut explored)
    }

    fn score_top_level(
        &self,
        game: &mut Game,
        opponents: &mut [Box<dyn Player>],
        explored: &mut HashSet<PositionSet>,
    ) -> Result<Vec<Candidate>, GameError> {
        let mut out = Vec::new();
        for play in top_k(self.move_finder.moves(game)?, self.fanout) {
            if let Some(leaves) = self.branch(game, opponents, explored, &play.path, 0)? {
                trace!(
                    "{} plan {:?}: {} leaves, mean {:.2}",
                    self.color,
                    play.path,
                    leaves.count,
                    leaves.mean()
                );
                out.push(Candidate {
                    progress: leaves.mean(),
                    path: play.path,
                });
            }
        }
        Ok(out)
    }

    /// Play `path` and the opponents' replies, then look further.
    fn branch(
        &self,
        game: &mut Game,
        opponents: &mut [Box<dyn Player>],
        explored: &mut HashSet<PositionSet>,
        path: &[Coord],
        depth: usize,
    ) -> Result<Option<Leaves>, GameError> {
        let mut trial = Trial::new(game);
        trial.replay(self.color, path)?;
        if !explored.insert(trial.game().position_set(self.color)) {
            return Ok(None);
        }

        for opponent in opponents.iter_mut() {
            if let Some(reply) = opponent.play(trial.game_mut())? {
                trial.replay(opponent.color(), &reply)?;
            }
        }

        let leaves = self.leaves(trial.game_mut(), opponents, explored, depth + 1)?;
        Ok((leaves.count > 0).then_some(leaves))
    }

    fn leaves(
        &self,
        game: &mut Game,
        opponents: &mut [Box<dyn Player>],
        explored: &mut HashSet<PositionSet>,
        depth: usize,
    ) -> Result<Leaves, GameError> {
        if depth >= self.max_play_depth {
            return Ok(Leaves::single(f64::from(game.total_progress(self.color))));
        }
        let mut total = Leaves::default();
        for play in top_k(self.move_finder.moves(game)?, self.fanout) {
            if let Some(found) = self.branch(game, opponents, explored, &play.path, depth)? {
                total.merge(found);
            }
        }
        Ok(total)
    }
}
