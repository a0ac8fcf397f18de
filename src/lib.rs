//! A chess rules engine: board representation, legal move generation,
//! game-state classification and a minimax opponent with difficulty tiers.

pub mod board;
pub mod console;
pub mod error;
pub mod evaluation;
pub mod game_state;
pub mod movegen;
pub mod search;

pub use board::{Board, Color, Piece, PieceKind, Square};
pub use error::{MoveError, MoveResult};
pub use game_state::GameState;
pub use movegen::{Move, MoveOutcome};
pub use search::{best_move, Difficulty, Search};

/// The standard starting position with white to move.
pub fn new_game() -> Board {
    Board::new()
}
