//! Game-state classification: check, checkmate, stalemate and the draw rules.

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::movegen::MoveGenerator;
use std::fmt;

/// Halfmove clock value at which the fifty-move rule applies.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Repetition is only looked for once the history is at least this long.
const MIN_HISTORY_FOR_REPETITION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// The given side is in check but has a way out.
    Check(Color),
    /// The given side delivered mate.
    Checkmate(Color),
    Stalemate,
    FiftyMoveDraw,
    ThreefoldRepetitionDraw,
    InsufficientMaterialDraw,
}

impl GameState {
    /// True once no further moves should be played.
    pub fn is_over(&self) -> bool {
        !matches!(self, GameState::Ongoing | GameState::Check(_))
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameState::Ongoing => write!(f, "Game in progress"),
            GameState::Check(color) => write!(f, "{color} is in check!"),
            GameState::Checkmate(winner) => write!(f, "Checkmate! {winner} wins!"),
            GameState::Stalemate => write!(f, "Stalemate! The game is a draw."),
            GameState::FiftyMoveDraw => write!(f, "50-move rule! The game is a draw."),
            GameState::ThreefoldRepetitionDraw => write!(f, "Threefold repetition! The game is a draw."),
            GameState::InsufficientMaterialDraw => write!(f, "Insufficient material! The game is a draw."),
        }
    }
}

impl MoveGenerator {
    pub fn is_checkmate(&self, board: &mut Board, color: Color) -> bool {
        self.is_king_in_check(board, color) && !self.has_legal_move(board, color)
    }

    pub fn is_stalemate(&self, board: &mut Board, color: Color) -> bool {
        !self.is_king_in_check(board, color) && !self.has_legal_move(board, color)
    }

    /// Classifies the position from the point of view of the side to move.
    pub fn get_game_state(&self, board: &mut Board) -> GameState {
        let color = board.side_to_move();

        if self.is_king_in_check(board, color) {
            return if self.has_legal_move(board, color) {
                GameState::Check(color)
            } else {
                GameState::Checkmate(color.opposite())
            };
        }

        if !self.has_legal_move(board, color) {
            return GameState::Stalemate;
        }
        if board.is_fifty_move_draw() {
            return GameState::FiftyMoveDraw;
        }
        if board.is_threefold_repetition() {
            return GameState::ThreefoldRepetitionDraw;
        }
        if board.is_insufficient_material() {
            return GameState::InsufficientMaterialDraw;
        }

        GameState::Ongoing
    }
}

impl Board {
    pub fn classify(&self) -> GameState {
        let mut scratch = self.clone();
        MoveGenerator::new().get_game_state(&mut scratch)
    }

    pub fn is_checkmate(&self, color: Color) -> bool {
        let mut scratch = self.clone();
        MoveGenerator::new().is_checkmate(&mut scratch, color)
    }

    pub fn is_stalemate(&self, color: Color) -> bool {
        let mut scratch = self.clone();
        MoveGenerator::new().is_stalemate(&mut scratch, color)
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_PLIES
    }

    /// True if the latest position key occurs at least three times in the history.
    pub fn is_threefold_repetition(&self) -> bool {
        if self.position_history.len() < MIN_HISTORY_FOR_REPETITION {
            return false;
        }
        let Some(current) = self.position_history.last() else {
            return false;
        };
        self.position_history.iter().filter(|&key| key == current).count() >= 3
    }

    /// Recognises K v K, K+minor v K, K+NN v K and K+B v K+B with same-colored
    /// bishops. Other drawn endings are not detected.
    pub fn is_insufficient_material(&self) -> bool {
        let white: Vec<_> = self.pieces(Color::White).collect();
        let black: Vec<_> = self.pieces(Color::Black).collect();

        match (white.len(), black.len()) {
            (1, 1) => true,
            (2, 1) | (1, 2) => {
                let stronger = if white.len() == 2 { &white } else { &black };
                count_kind(stronger, PieceKind::Bishop) == 1 || count_kind(stronger, PieceKind::Knight) == 1
            }
            (3, 1) | (1, 3) => {
                let stronger = if white.len() == 3 { &white } else { &black };
                count_kind(stronger, PieceKind::Knight) == 2
            }
            (2, 2) => match (bishop_is_light(&white), bishop_is_light(&black)) {
                (Some(white_light), Some(black_light)) => white_light == black_light,
                _ => false,
            },
            _ => false,
        }
    }
}

fn count_kind(side: &[(Square, Piece)], kind: PieceKind) -> usize {
    side.iter().filter(|(_, piece)| piece.kind == kind).count()
}

fn bishop_is_light(side: &[(Square, Piece)]) -> Option<bool> {
    side.iter()
        .find(|(_, piece)| piece.kind == PieceKind::Bishop)
        .map(|(square, _)| square.is_light())
}
