//! Error types for the engine.

use thiserror::Error;

use crate::transform::Matrix;
use crate::{Color, Coord};

/// Errors raised by [`crate::Game`] and the players driving it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A move rejected by the legality rules. Search code validates before
    /// pushing, so this indicates a caller bug.
    #[error("illegal move for {color}: {from} -> {to}")]
    IllegalMove { color: Color, from: Coord, to: Coord },

    /// A turn that would end inside a home other than the mover's own or target home.
    #[error("{color} cannot end a turn on {to} (started from {from})")]
    IllegalEndpoint { color: Color, from: Coord, to: Coord },

    /// The mover has no piece on the source spot.
    #[error("{color} has no piece on {at}")]
    PieceMissing { color: Color, at: Coord },

    /// A color that is not seated in this game.
    #[error("{0} is not playing in this game")]
    UnknownColor(Color),

    /// A starting position that puts a piece off the board or on top of another.
    #[error("spot {0} is off the board or already taken")]
    SpotUnavailable(Coord),

    #[error("a turn must name at least its starting spot")]
    EmptyTurn,
}

/// Errors from building a [`crate::CoordinateTransformer`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("matrix {matrix:?} has determinant {det}; negative powers need a determinant of 1 or -1")]
    NotInvertible { matrix: Matrix, det: i32 },
}

/// A color name that does not match any of the six colors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown color {0:?}")]
pub struct ParseColorError(pub String);
