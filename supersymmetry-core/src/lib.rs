//! Supersymmetry: a six-player jump game on a star-shaped hex board.
//!
//! # Coordinates
//!
//! Spots live on a triangular lattice written in a symmetric three-axis form.
//! Every spot satisfies `z = x + y`, so each of the three lattice axes is a
//! set of spots sharing one component:
//!
//! ```text
//! axis 0: x fixed, spots sorted by y
//! axis 1: y fixed, spots sorted by z
//! axis 2: z fixed, spots sorted by x
//!
//! Neighbours of (x, y, z):
//!   (x±1, y,   z±1)
//!   (x,   y±1, z±1)
//!   (x±1, y∓1, z  )
//! ```
//!
//! # Board (size n)
//!
//! ```text
//! field:      |x| + |y| + |z| <= 2n           (hexagon of radius n)
//! first home: x > n, y >= -n, z <= n          (triangle of n(n+1)/2 spots)
//! home[c]:    first home tested on (x, y, z) · M^k(c)
//!
//! M = | 0 -1  0 |      (x, y, z) · M = (z, -x, y)
//!     | 0  0  1 |      a 60 degree rotation, M^6 = I
//!     | 1  0  0 |
//! ```
//!
//! # Turns
//!
//! A turn is either one adjacent step, or a chain of jumps. A jump travels
//! along an axis and is legal when the occupancy of the line between the two
//! ends (the moving piece excluded) is mirror symmetric and not empty.

pub mod board;
pub mod error;
pub mod game;
pub mod planning;
pub mod players;
pub mod runner;
pub mod search;
pub mod select;
pub mod transform;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use board::{Board, Region};
pub use error::{GameError, ParseColorError, TransformError};
pub use game::{line_symmetry, Game, GameConfig, LineSymmetry, MoveState, PositionSet, StackedMove, Trial};
pub use planning::PlanningSearch;
pub use players::{
    build_lineup, GreedyFullPlayer, GreedySinglePlayer, PlanningPlayer, Player, RandomFullPlayer,
    RandomSingleMovePlayer, StrategyConfig, Turn,
};
pub use runner::{run_game, Finish, GameRecord};
pub use search::{single_moves, Candidate, MoveSearch, MoveTree};
pub use select::{choose_best, top_k};
pub use transform::CoordinateTransformer;

/// Player color. Each color owns one home triangle of the star.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Yellow = 1,
    Green = 2,
    Black = 3,
    Blue = 4,
    Grey = 5,
}

impl Color {
    /// All six colors in board order.
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Yellow,
        Color::Green,
        Color::Black,
        Color::Blue,
        Color::Grey,
    ];

    /// Index into [`Color::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert from an index (0-5) to a Color.
    #[inline]
    pub fn from_index(idx: usize) -> Option<Color> {
        Color::ALL.get(idx).copied()
    }

    /// Exponent of the 60 degree rotation that maps this color's home onto
    /// the first (red) home.
    #[inline]
    pub fn rotation(self) -> i32 {
        match self {
            Color::Red => 0,
            Color::Yellow => 1,
            Color::Green => 2,
            Color::Black => 3,
            Color::Blue => -2,
            Color::Grey => -1,
        }
    }

    /// The color whose home lies opposite this one. This is the target home.
    #[inline]
    pub fn opposing(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Yellow => Color::Blue,
            Color::Green => Color::Grey,
            Color::Black => Color::Red,
            Color::Blue => Color::Yellow,
            Color::Grey => Color::Green,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Grey => "grey",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

/// A lattice spot in three-axis form.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Coord {
        Coord { x, y, z }
    }

    /// Component along axis 0, 1 or 2.
    #[inline]
    pub fn axis(self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(v: [i32; 3]) -> Coord {
        Coord::new(v[0], v[1], v[2])
    }

    /// `|x| + |y| + |z|`, twice the hex distance from the centre.
    #[inline]
    pub fn norm(self) -> i32 {
        self.x.abs() + self.y.abs() + self.z.abs()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Coord::new(x, y, z)
    }
}
