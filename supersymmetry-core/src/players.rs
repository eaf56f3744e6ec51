//! Player strategies.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::{Game, MoveState};
use crate::planning::{PlanningSearch, DEFAULT_FANOUT, DEFAULT_MAX_PLAY_DEPTH};
use crate::search::{single_moves, MoveSearch, DEFAULT_MAX_DEPTH, DEFAULT_POSITION_MEMORY};
use crate::select::choose_best;
use crate::{Color, Coord};

/// A turn: the moving piece's spot followed by each spot it moves to.
pub type Turn = Vec<Coord>;

/// Something that picks turns for one color.
pub trait Player {
    fn color(&self) -> Color;

    /// Short strategy name for logs and reports.
    fn kind(&self) -> &'static str;

    /// Pick a turn for the current position. `Ok(None)` is a pass.
    ///
    /// The game may be used for trial moves but must be left unchanged.
    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError>;
}

// ========== Random ==========

/// Steps or jumps one random piece once.
pub struct RandomSingleMovePlayer {
    color: Color,
    rng: StdRng,
}

impl RandomSingleMovePlayer {
    pub fn new(color: Color, seed: u64) -> Self {
        RandomSingleMovePlayer {
            color,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for RandomSingleMovePlayer {
    fn color(&self) -> Color {
        self.color
    }

    fn kind(&self) -> &'static str {
        "random_single"
    }

    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError> {
        let mut pieces = game.spots(self.color)?.to_vec();
        pieces.shuffle(&mut self.rng);
        // First piece (in random order) that can go anywhere.
        for start in pieces {
            let ends: Vec<Coord> = game
                .get_legal_moves(start, MoveState::First)
                .into_iter()
                .map(|(end, _)| end)
                .filter(|&end| game.is_legal_endpoint(self.color, start, end))
                .collect();
            if let Some(&end) = ends.choose(&mut self.rng) {
                return Ok(Some(vec![start, end]));
            }
        }
        Ok(None)
    }
}

/// Any reachable endpoint of any piece, uniformly.
pub struct RandomFullPlayer {
    search: MoveSearch,
    rng: StdRng,
}

impl RandomFullPlayer {
    pub fn new(color: Color, max_depth: usize, position_memory: usize, seed: u64) -> Self {
        RandomFullPlayer {
            search: MoveSearch::new(color, max_depth, position_memory),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for RandomFullPlayer {
    fn color(&self) -> Color {
        self.search.color()
    }

    fn kind(&self) -> &'static str {
        "random_full"
    }

    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError> {
        let mut candidates = self.search.candidates(game)?;
        if candidates.is_empty() {
            candidates = single_moves(game, self.color())?;
        }
        Ok(candidates.choose(&mut self.rng).map(|c| c.path.clone()))
    }
}

// ========== Greedy ==========

/// Best single move by progress.
pub struct GreedySinglePlayer {
    color: Color,
    rng: StdRng,
}

impl GreedySinglePlayer {
    pub fn new(color: Color, seed: u64) -> Self {
        GreedySinglePlayer {
            color,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for GreedySinglePlayer {
    fn color(&self) -> Color {
        self.color
    }

    fn kind(&self) -> &'static str {
        "greedy_single"
    }

    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError> {
        Ok(choose_best(single_moves(game, self.color)?, &mut self.rng))
    }
}

/// Best full-depth chain by progress.
pub struct GreedyFullPlayer {
    search: MoveSearch,
    rng: StdRng,
}

impl GreedyFullPlayer {
    pub fn new(color: Color, max_depth: usize, position_memory: usize, seed: u64) -> Self {
        GreedyFullPlayer {
            search: MoveSearch::new(color, max_depth, position_memory),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for GreedyFullPlayer {
    fn color(&self) -> Color {
        self.search.color()
    }

    fn kind(&self) -> &'static str {
        "greedy_full"
    }

    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError> {
        let mut candidates = self.search.candidates(game)?;
        if candidates.is_empty() {
            candidates = single_moves(game, self.color())?;
        }
        Ok(choose_best(candidates, &mut self.rng))
    }
}

// ========== Planning ==========

/// Lookahead against models of the other players.
pub struct PlanningPlayer {
    planner: PlanningSearch,
    opponents: Vec<Box<dyn Player>>,
    rng: StdRng,
}

impl PlanningPlayer {
    pub fn new(planner: PlanningSearch, opponents: Vec<Box<dyn Player>>, seed: u64) -> Self {
        PlanningPlayer {
            planner,
            opponents,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn opponents(&self) -> &[Box<dyn Player>] {
        &self.opponents
    }
}

impl Player for PlanningPlayer {
    fn color(&self) -> Color {
        self.planner.color()
    }

    fn kind(&self) -> &'static str {
        "planning"
    }

    fn play(&mut self, game: &mut Game) -> Result<Option<Turn>, GameError> {
        self.planner.move_finder_mut().remember(game);

        let mut candidates = self.planner.evaluate(game, &mut self.opponents)?;
        if candidates.is_empty() {
            debug!("{} planning found nothing, using greedy moves", self.color());
            candidates = self.planner.move_finder().moves(game)?;
        }
        if candidates.is_empty() {
            candidates = single_moves(game, self.color())?;
        }
        Ok(choose_best(candidates, &mut self.rng))
    }
}

// ========== Configuration ==========

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_position_memory() -> usize {
    DEFAULT_POSITION_MEMORY
}

fn default_fanout() -> usize {
    DEFAULT_FANOUT
}

fn default_max_play_depth() -> usize {
    DEFAULT_MAX_PLAY_DEPTH
}

/// Serializable strategy choice, e.g. `{"kind": "planning", "fanout": 4}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    RandomSingle,
    RandomFull {
        #[serde(default = "default_max_depth")]
        max_depth: usize,
        #[serde(default = "default_position_memory")]
        position_memory: usize,
    },
    GreedySingle,
    GreedyFull {
        #[serde(default = "default_max_depth")]
        max_depth: usize,
        #[serde(default = "default_position_memory")]
        position_memory: usize,
    },
    Planning {
        #[serde(default = "default_max_depth")]
        max_depth: usize,
        #[serde(default = "default_position_memory")]
        position_memory: usize,
        #[serde(default = "default_fanout")]
        fanout: usize,
        #[serde(default = "default_max_play_depth")]
        max_play_depth: usize,
    },
}

impl StrategyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::RandomSingle => "random_single",
            StrategyConfig::RandomFull { .. } => "random_full",
            StrategyConfig::GreedySingle => "greedy_single",
            StrategyConfig::GreedyFull { .. } => "greedy_full",
            StrategyConfig::Planning { .. } => "planning",
        }
    }

    #[inline]
    pub fn wants_opponents(&self) -> bool {
        matches!(self, StrategyConfig::Planning { .. })
    }

    /// Build the player. `opponents` is only used by planning players.
    pub fn build(&self, color: Color, seed: u64, opponents: Vec<Box<dyn Player>>) -> Box<dyn Player> {
        match *self {
            StrategyConfig::RandomSingle => Box::new(RandomSingleMovePlayer::new(color, seed)),
            StrategyConfig::RandomFull {
                max_depth,
                position_memory,
            } => Box::new(RandomFullPlayer::new(color, max_depth, position_memory, seed)),
            StrategyConfig::GreedySingle => Box::new(GreedySinglePlayer::new(color, seed)),
            StrategyConfig::GreedyFull {
                max_depth,
                position_memory,
            } => Box::new(GreedyFullPlayer::new(color, max_depth, position_memory, seed)),
            StrategyConfig::Planning {
                max_depth,
                position_memory,
                fanout,
                max_play_depth,
            } => {
                let planner = PlanningSearch::new(color, max_depth, position_memory, fanout, max_play_depth);
                Box::new(PlanningPlayer::new(planner, opponents, seed))
            }
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::GreedyFull {
            max_depth: DEFAULT_MAX_DEPTH,
            position_memory: DEFAULT_POSITION_MEMORY,
        }
    }
}

/// Build one player per seat. Planning players get a model of every other
/// seat, in seat order starting after their own, built from that seat's
/// config. All seeds derive from `seed`.
pub fn build_lineup(seats: &[(Color, StrategyConfig)], seed: u64) -> Vec<Box<dyn Player>> {
    let mut seeder = StdRng::seed_from_u64(seed);
    let m = seats.len();
    let mut players = Vec::with_capacity(m);
    for (i, (color, config)) in seats.iter().enumerate() {
        let mut opponents = Vec::new();
        if config.wants_opponents() {
            for j in 1..m {
                let (other, other_config) = &seats[(i + j) % m];
                opponents.push(other_config.build(*other, seeder.random(), Vec::new()));
            }
        }
        players.push(config.build(*color, seeder.random(), opponents));
    }
    players
}
