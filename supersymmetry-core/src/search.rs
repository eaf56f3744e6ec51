//! Depth-limited exploration of chained moves.
//!
//! For one piece, the search walks every chain of legal moves out of its
//! spot, pushing each move on the live game and popping it again on the way
//! back. The explored spots form a tree rooted at the start; every node that
//! is a legal endpoint becomes a candidate turn.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::error::GameError;
use crate::game::{Game, MoveState, PositionSet, Trial};
use crate::{Color, Coord};

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_POSITION_MEMORY: usize = 5;

/// A scored turn. `path[0]` is the piece, the last spot its destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub progress: f64,
    pub path: Vec<Coord>,
}

#[derive(Clone, Copy, Debug)]
struct TreeNode {
    spot: Coord,
    parent: Option<usize>,
}

/// Spots reached from one start, each linked to the spot it was reached from.
#[derive(Clone, Debug)]
pub struct MoveTree {
    nodes: Vec<TreeNode>,
    index: HashMap<Coord, usize>,
}

impl MoveTree {
    pub fn new(start: Coord) -> MoveTree {
        let mut index = HashMap::new();
        index.insert(start, 0);
        MoveTree {
            nodes: vec![TreeNode { spot: start, parent: None }],
            index,
        }
    }

    #[inline]
    pub fn start(&self) -> Coord {
        self.nodes[0].spot
    }

    /// Number of nodes, the start included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: the start is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, spot: Coord) -> bool {
        self.index.contains_key(&spot)
    }

    fn insert(&mut self, spot: Coord, parent: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            spot,
            parent: Some(parent),
        });
        self.index.insert(spot, id);
        id
    }

    /// Every reached spot except the start, in discovery order.
    pub fn endpoints(&self) -> impl Iterator<Item = Coord> + '_ {
        self.nodes.iter().skip(1).map(|n| n.spot)
    }

    /// The chain of spots from the start to `spot`.
    pub fn path_to(&self, spot: Coord) -> Option<Vec<Coord>> {
        let mut cur = Some(*self.index.get(&spot)?);
        let mut path = Vec::new();
        while let Some(id) = cur {
            path.push(self.nodes[id].spot);
            cur = self.nodes[id].parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Full-depth move search for one color, with a short memory of recent
/// positions so a player does not walk back into where it just was.
#[derive(Clone, Debug)]
pub struct MoveSearch {
    color: Color,
    max_depth: usize,
    position_memory: usize,
    history: VecDeque<PositionSet>,
}

impl MoveSearch {
    pub fn new(color: Color, max_depth: usize, position_memory: usize) -> MoveSearch {
        MoveSearch {
            color,
            max_depth,
            position_memory,
            history: VecDeque::with_capacity(position_memory),
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Record the current position, dropping the oldest beyond the memory size.
    pub fn remember(&mut self, game: &Game) {
        if self.position_memory == 0 {
            return;
        }
        if self.history.len() == self.position_memory {
            self.history.pop_front();
        }
        self.history.push_back(game.position_set(self.color));
    }

    #[inline]
    pub fn has_seen(&self, position: &PositionSet) -> bool {
        self.history.contains(position)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Explore every chain out of `start`. The game is left as it was found.
    pub fn explore(&self, game: &mut Game, start: Coord) -> Result<MoveTree, GameError> {
        let mut tree = MoveTree::new(start);
        self.explore_from(game, &mut tree, 0, MoveState::First, 1)?;
        trace!("explored {} spots from {} for {}", tree.len(), start, self.color);
        Ok(tree)
    }

    fn explore_from(
        &self,
        game: &mut Game,
        tree: &mut MoveTree,
        node: usize,
        state: MoveState,
        depth: usize,
    ) -> Result<(), GameError> {
        if depth > self.max_depth {
            return Ok(());
        }
        let from = tree.nodes[node].spot;
        for (to, next) in game.get_legal_moves(from, state) {
            if tree.contains(to) {
                continue;
            }

            let mut trial = Trial::new(game);
            trial.push(self.color, from, to, state)?;
            if self.has_seen(&trial.game().position_set(self.color)) {
                continue;
            }

            let child = tree.insert(to, node);
            if depth < self.max_depth {
                self.explore_from(trial.game_mut(), tree, child, next, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Candidate turns for the piece on `start`, scored by progress gained.
    pub fn moves_for_piece(&self, game: &mut Game, start: Coord) -> Result<Vec<Candidate>, GameError> {
        let tree = self.explore(game, start)?;
        let before = game.board().progress(self.color, start);
        let mut out = Vec::new();
        for end in tree.endpoints() {
            if !game.is_legal_endpoint(self.color, start, end) {
                continue;
            }
            if let Some(path) = tree.path_to(end) {
                let gain = game.board().progress(self.color, end) - before;
                out.push(Candidate {
                    progress: f64::from(gain),
                    path,
                });
            }
        }
        Ok(out)
    }

    /// Candidate turns for every piece. Does not touch the history.
    pub fn moves(&self, game: &mut Game) -> Result<Vec<Candidate>, GameError> {
        let starts = game.spots(self.color)?.to_vec();
        let mut out = Vec::new();
        for start in starts {
            out.extend(self.moves_for_piece(game, start)?);
        }
        Ok(out)
    }

    /// Remember the current position, then search. This is what a player
    /// calls once per turn.
    pub fn candidates(&mut self, game: &mut Game) -> Result<Vec<Candidate>, GameError> {
        self.remember(game);
        self.moves(game)
    }
}

/// Every single move (one step or one jump) of every piece that ends on a
/// legal endpoint.
pub fn single_moves(game: &Game, color: Color) -> Result<Vec<Candidate>, GameError> {
    let board = game.board();
    let mut out = Vec::new();
    for &start in game.spots(color)? {
        let before = board.progress(color, start);
        for (end, _) in game.get_legal_moves(start, MoveState::First) {
            if game.is_legal_endpoint(color, start, end) {
                out.push(Candidate {
                    progress: f64::from(board.progress(color, end) - before),
                    path: vec![start, end],
                });
            }
        }
    }
    Ok(out)
}
