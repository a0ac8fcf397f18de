//! Error types for move application
//!
//! Every rejection is recoverable: the board is left exactly as it was
//! before the call.

use crate::board::{Color, Square};
use thiserror::Error;

/// Reasons a move can be rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The source square is empty
    #[error("no piece on {square}")]
    NoPieceAtSource { square: Square },

    /// The piece on the source square belongs to the side not on move
    #[error("it is {expected}'s turn")]
    WrongSideToMove { expected: Color },

    /// The destination is not a pseudo-legal target for the piece
    #[error("invalid move from {from} to {to}")]
    IllegalDestination { from: Square, to: Square },

    /// The move follows the piece's pattern but leaves its own king in check
    #[error("moving from {from} to {to} would leave your own king in check")]
    WouldExposeOwnKing { from: Square, to: Square },

    /// `promote` was called for a move that does not take a pawn to its last rank
    #[error("moving from {from} to {to} is not a promotion")]
    NotAPromotion { from: Square, to: Square },
}

/// Result type alias for move application
pub type MoveResult<T> = Result<T, MoveError>;
