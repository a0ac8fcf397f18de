use crate::board::{Board, Color, PieceKind};
use crate::movegen::MoveGenerator;

/// Score of a checkmate, from white's point of view.
pub const MATE_SCORE: i32 = 10_000;

pub struct Evaluator {
    // Piece values; the king only counts through its table
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,

    // Positional bonuses, laid out from white's side of the board
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],
    pub king_position_bonus: [[i32; 8]; 8],

    move_generator: MoveGenerator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 10,
            knight_value: 30,
            bishop_value: 30,
            rook_value: 50,
            queen_value: 90,

            // Pawn position bonuses (encourages central control and advancement)
            pawn_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            knight_position_bonus: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            bishop_position_bonus: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 5, 10, 10, 5, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            rook_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            queen_position_bonus: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // King position bonuses (encourages staying behind the pawns)
            king_position_bonus: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],

            move_generator: MoveGenerator::new(),
        }
    }

    /// Static score from white's point of view, with mates and stalemates
    /// scored before material. The board is only used for trial moves and is
    /// returned unchanged.
    pub fn evaluate(&self, board: &mut Board) -> i32 {
        if self.move_generator.is_checkmate(board, Color::White) {
            return -MATE_SCORE;
        }
        if self.move_generator.is_checkmate(board, Color::Black) {
            return MATE_SCORE;
        }
        if self.move_generator.is_stalemate(board, Color::White)
            || self.move_generator.is_stalemate(board, Color::Black)
        {
            return 0;
        }

        self.material_score(board)
    }

    /// Material plus positional bonuses, white minus black.
    pub fn material_score(&self, board: &Board) -> i32 {
        let mut score = 0;
        for color in [Color::White, Color::Black] {
            for (square, piece) in board.pieces(color) {
                let rank = match color {
                    Color::White => square.row() as usize,
                    Color::Black => 7 - square.row() as usize,
                };
                let value = self.get_piece_value(piece.kind, rank, square.col() as usize);
                score += if color == Color::White { value } else { -value };
            }
        }
        score
    }

    fn get_piece_value(&self, piece: PieceKind, rank: usize, file: usize) -> i32 {
        let base_value = match piece {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => 0,
        };

        let position_bonus = match piece {
            PieceKind::Pawn => self.pawn_position_bonus[rank][file],
            PieceKind::Knight => self.knight_position_bonus[rank][file],
            PieceKind::Bishop => self.bishop_position_bonus[rank][file],
            PieceKind::Rook => self.rook_position_bonus[rank][file],
            PieceKind::Queen => self.queen_position_bonus[rank][file],
            PieceKind::King => self.king_position_bonus[rank][file],
        };

        base_value + position_bonus
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
