use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::error::{MoveError, MoveResult};
use std::fmt;
use tracing::trace;

/// A bare from/to pair, as chosen by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// What a committed move did, with enough detail to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub from: Square,
    pub to: Square,
    /// The moving piece as it stood before the move.
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<PieceKind>,
    pub is_castling: bool,
    pub is_en_passant: bool,
}

impl MoveOutcome {
    /// Coordinate notation such as `e2 e4`.
    pub fn notation(&self) -> String {
        format!("{} {}", self.from, self.to)
    }
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0), (0, 1), (1, 0), (0, -1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Destinations the piece on `from` can reach by its movement pattern,
    /// ignoring whether its own king is left in check.
    pub fn pseudo_legal_moves(&self, board: &Board, from: Square) -> Vec<Square> {
        let Some(piece) = board.piece_at(from) else {
            return Vec::new();
        };

        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(board, from, piece),
            PieceKind::Knight => self.step_moves(board, from, piece, &KNIGHT_OFFSETS),
            PieceKind::Bishop => self.slide_moves(board, from, piece, &BISHOP_DIRECTIONS),
            PieceKind::Rook => self.slide_moves(board, from, piece, &ROOK_DIRECTIONS),
            PieceKind::Queen => self.slide_moves(board, from, piece, &QUEEN_DIRECTIONS),
            PieceKind::King => self.king_moves(board, from, piece),
        }
    }

    fn pawn_moves(&self, board: &Board, from: Square, pawn: Piece) -> Vec<Square> {
        let mut moves = Vec::new();
        let direction = pawn.color.pawn_direction();

        if let Some(one) = from.offset(direction, 0) {
            if board.piece_at(one).is_none() {
                moves.push(one);

                let start_row = (pawn.color.home_row() as i8 + direction) as u8;
                if !pawn.has_moved && from.row() == start_row {
                    if let Some(two) = from.offset(2 * direction, 0) {
                        if board.piece_at(two).is_none() {
                            moves.push(two);
                        }
                    }
                }
            }
        }

        for dc in [-1, 1] {
            let Some(target) = from.offset(direction, dc) else {
                continue;
            };
            match board.piece_at(target) {
                Some(other) if other.color != pawn.color => moves.push(target),
                Some(_) => {}
                None => {
                    // En passant needs an enemy pawn right beside us
                    if board.en_passant_target() == Some(target) {
                        let beside = from.offset(0, dc);
                        let victim = beside.and_then(|square| board.piece_at(square));
                        if matches!(victim, Some(p) if p.kind == PieceKind::Pawn && p.color != pawn.color) {
                            moves.push(target);
                        }
                    }
                }
            }
        }

        moves
    }

    fn step_moves(&self, board: &Board, from: Square, piece: Piece, offsets: &[(i8, i8)]) -> Vec<Square> {
        offsets
            .iter()
            .filter_map(|&(dr, dc)| from.offset(dr, dc))
            .filter(|&to| !matches!(board.piece_at(to), Some(other) if other.color == piece.color))
            .collect()
    }

    fn slide_moves(&self, board: &Board, from: Square, piece: Piece, directions: &[(i8, i8)]) -> Vec<Square> {
        let mut moves = Vec::new();
        for &(dr, dc) in directions {
            let mut current = from;
            while let Some(next) = current.offset(dr, dc) {
                match board.piece_at(next) {
                    None => moves.push(next),
                    Some(other) => {
                        if other.color != piece.color {
                            moves.push(next);
                        }
                        break;
                    }
                }
                current = next;
            }
        }
        moves
    }

    /// Adjacent squares plus castling. Castling only checks move flags and
    /// empty squares here; king safety is left to the legality filter.
    fn king_moves(&self, board: &Board, from: Square, king: Piece) -> Vec<Square> {
        let mut moves = self.step_moves(board, from, king, &KING_OFFSETS);

        if king.has_moved || from.row() != king.color.home_row() || from.col() != 4 {
            return moves;
        }

        let row = from.row();
        let rook_ready = |col: u8| {
            Square::new(row, col)
                .and_then(|square| board.piece_at(square))
                .is_some_and(|p| p.kind == PieceKind::Rook && p.color == king.color && !p.has_moved)
        };
        let all_empty = |cols: &[u8]| {
            cols.iter()
                .filter_map(|&col| Square::new(row, col))
                .all(|square| board.piece_at(square).is_none())
        };

        if rook_ready(7) && all_empty(&[5, 6]) {
            moves.extend(Square::new(row, 6));
        }
        if rook_ready(0) && all_empty(&[1, 2, 3]) {
            moves.extend(Square::new(row, 2));
        }

        moves
    }

    /// True if any enemy piece can reach the cached square of `color`'s king.
    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        let king_square = board.king_position(color);
        board
            .pieces(color.opposite())
            .any(|(square, _)| self.pseudo_legal_moves(board, square).contains(&king_square))
    }

    /// Trial-applies `from -> to` and reports whether the mover's king is
    /// safe afterwards. The board is restored before returning.
    pub fn leaves_king_safe(&self, board: &mut Board, from: Square, to: Square) -> bool {
        let Some(mover) = board.piece_at(from) else {
            return false;
        };
        // Kings are attacked, never taken
        if matches!(board.piece_at(to), Some(p) if p.kind == PieceKind::King) {
            return false;
        }
        let Some(undo) = board.make_move(from, to, None) else {
            return false;
        };
        let safe = !self.is_king_in_check(board, mover.color);
        board.unmake_move(undo);
        safe
    }

    /// Pseudo-legal destinations of the piece on `from` that keep its king safe.
    pub fn legal_moves(&self, board: &mut Board, from: Square) -> Vec<Square> {
        self.pseudo_legal_moves(board, from)
            .into_iter()
            .filter(|&to| self.leaves_king_safe(board, from, to))
            .collect()
    }

    /// Every legal move for `color`, regardless of whose turn it is.
    pub fn generate_moves(&self, board: &mut Board, color: Color) -> Vec<Move> {
        let origins: Vec<Square> = board.pieces(color).map(|(square, _)| square).collect();
        let mut moves = Vec::new();
        for from in origins {
            for to in self.legal_moves(board, from) {
                moves.push(Move::new(from, to));
            }
        }
        moves
    }

    /// Stops at the first legal move found for `color`.
    pub fn has_legal_move(&self, board: &mut Board, color: Color) -> bool {
        let origins: Vec<Square> = board.pieces(color).map(|(square, _)| square).collect();
        origins.into_iter().any(|from| {
            self.pseudo_legal_moves(board, from)
                .into_iter()
                .any(|to| self.leaves_king_safe(board, from, to))
        })
    }
}

impl Board {
    /// Legal destinations for the piece on `from`; empty if the square is empty.
    pub fn legal_moves(&self, from: Square) -> Vec<Square> {
        let mut scratch = self.clone();
        MoveGenerator::new().legal_moves(&mut scratch, from)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        MoveGenerator::new().is_king_in_check(self, color)
    }

    /// True if moving the piece on `from` to `to` takes a pawn to its last rank.
    pub fn would_promote(&self, from: Square, to: Square) -> bool {
        matches!(self.piece_at(from), Some(p) if p.kind == PieceKind::Pawn && to.row() == p.color.promotion_row())
    }

    /// Commits the move `from -> to` for the side to move.
    ///
    /// A pawn reaching its last rank stays a pawn here; use `promote` for
    /// those moves. On error the board is unchanged.
    pub fn apply_move(&mut self, from: Square, to: Square) -> MoveResult<MoveOutcome> {
        self.commit(from, to, None)
    }

    /// Commits a pawn move to the last rank, replacing the pawn with `kind`.
    /// Kinds other than rook, bishop or knight become a queen.
    pub fn promote(&mut self, from: Square, to: Square, kind: PieceKind) -> MoveResult<MoveOutcome> {
        let movable = matches!(self.piece_at(from), Some(p) if p.color == self.side_to_move);
        if movable && !self.would_promote(from, to) {
            trace!(%from, %to, "rejected promotion: not a pawn reaching the last rank");
            return Err(MoveError::NotAPromotion { from, to });
        }
        self.commit(from, to, Some(kind.promotion_choice()))
    }

    fn commit(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> MoveResult<MoveOutcome> {
        let generator = MoveGenerator::new();

        let Some(piece) = self.piece_at(from) else {
            trace!(%from, "rejected move: empty source square");
            return Err(MoveError::NoPieceAtSource { square: from });
        };
        if piece.color != self.side_to_move {
            trace!(%from, %to, "rejected move: wrong side to move");
            return Err(MoveError::WrongSideToMove {
                expected: self.side_to_move,
            });
        }
        let takes_king = matches!(self.piece_at(to), Some(p) if p.kind == PieceKind::King);
        if takes_king || !generator.pseudo_legal_moves(self, from).contains(&to) {
            trace!(%from, %to, "rejected move: illegal destination");
            return Err(MoveError::IllegalDestination { from, to });
        }

        let undo = self
            .make_move(from, to, promotion)
            .ok_or(MoveError::NoPieceAtSource { square: from })?;
        if generator.is_king_in_check(self, piece.color) {
            self.unmake_move(undo);
            trace!(%from, %to, "rejected move: own king left in check");
            return Err(MoveError::WouldExposeOwnKing { from, to });
        }

        // Keyed after the side flips, so each entry names the side to move next
        let key = self.position_key();
        self.position_history.push(key);

        Ok(MoveOutcome {
            from,
            to,
            piece,
            captured: undo.captured().map(|(_, captured)| captured),
            promotion,
            is_castling: undo.is_castling(),
            is_en_passant: undo.is_en_passant(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(board: &mut Board, moves: &[(&str, &str)]) {
        for &(from, to) in moves {
            board.apply_move(sq(from), sq(to)).unwrap();
        }
    }

    #[test]
    fn test_initial_position() {
        let mut board = Board::new();
        let generator = MoveGenerator::new();
        let moves = generator.generate_moves(&mut board, Color::White);

        // White should have 20 legal moves in the initial position
        assert_eq!(moves.len(), 20);

        for col in 0..8 {
            let from = Square::new(6, col).unwrap();
            let targets = board.legal_moves(from);
            assert!(targets.contains(&from.offset(-1, 0).unwrap()));
            assert!(targets.contains(&from.offset(-2, 0).unwrap()));
        }
    }

    #[test]
    fn test_sliders_stop_at_pieces() {
        let mut board = Board::empty(sq("e1"), sq("e8")).unwrap();
        board.set_piece(sq("d4"), Piece::new(PieceKind::Rook, Color::White));
        board.set_piece(sq("d6"), Piece::new(PieceKind::Pawn, Color::Black));
        board.set_piece(sq("f4"), Piece::new(PieceKind::Pawn, Color::White));

        let moves = MoveGenerator::new().pseudo_legal_moves(&board, sq("d4"));
        assert!(moves.contains(&sq("d5")));
        assert!(moves.contains(&sq("d6")));
        assert!(!moves.contains(&sq("d7")));
        assert!(moves.contains(&sq("e4")));
        assert!(!moves.contains(&sq("f4")));
        assert!(moves.contains(&sq("d1")));
        assert!(moves.contains(&sq("a4")));
        assert_eq!(moves.len(), 9);
    }

    #[test]
    fn test_knight_moves() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        let mut moves = generator.pseudo_legal_moves(&board, sq("b1"));
        moves.sort_by_key(|s| (s.row(), s.col()));
        assert_eq!(moves, vec![sq("a3"), sq("c3")]);
    }

    #[test]
    fn test_castling() {
        let mut board = Board::empty(sq("e1"), sq("e8")).unwrap();
        board.set_piece(sq("a1"), Piece::new(PieceKind::Rook, Color::White));
        board.set_piece(sq("h1"), Piece::new(PieceKind::Rook, Color::White));

        let moves = board.legal_moves(sq("e1"));
        assert!(moves.contains(&sq("g1")));
        assert!(moves.contains(&sq("c1")));

        let outcome = board.apply_move(sq("e1"), sq("c1")).unwrap();
        assert!(outcome.is_castling);
        assert_eq!(board.piece_at(sq("d1")).unwrap().kind, PieceKind::Rook);
        assert!(board.piece_at(sq("d1")).unwrap().has_moved);
        assert_eq!(board.king_position(Color::White), sq("c1"));
    }

    #[test]
    fn test_castling_blocked_or_rook_moved() {
        let mut board = Board::empty(sq("e1"), sq("e8")).unwrap();
        board.set_piece(sq("a1"), Piece::new(PieceKind::Rook, Color::White));
        board.set_piece(sq("b1"), Piece::new(PieceKind::Knight, Color::White));
        board.set_piece(
            sq("h1"),
            Piece {
                has_moved: true,
                ..Piece::new(PieceKind::Rook, Color::White)
            },
        );

        let moves = board.legal_moves(sq("e1"));
        assert!(!moves.contains(&sq("g1")));
        assert!(!moves.contains(&sq("c1")));
    }

    #[test]
    fn test_castling_only_checks_destination_square() {
        // f1 is attacked but g1 is not: the king may still castle through f1
        let mut board = Board::empty(sq("e1"), sq("a8")).unwrap();
        board.set_piece(sq("h1"), Piece::new(PieceKind::Rook, Color::White));
        board.set_piece(sq("f8"), Piece::new(PieceKind::Rook, Color::Black));

        assert!(board.legal_moves(sq("e1")).contains(&sq("g1")));
        assert!(!board.legal_moves(sq("e1")).contains(&sq("f1")));
    }

    #[test]
    fn test_en_passant_window() {
        let mut board = Board::new();
        play(&mut board, &[("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")]);
        assert!(board.legal_moves(sq("e5")).contains(&sq("d6")));

        let mut taken = board.clone();
        let outcome = taken.apply_move(sq("e5"), sq("d6")).unwrap();
        assert!(outcome.is_en_passant);
        assert_eq!(outcome.captured.map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(taken.piece_at(sq("d5")), None);

        // One ply later the chance is gone
        play(&mut board, &[("h2", "h3"), ("h7", "h6")]);
        assert!(!board.legal_moves(sq("e5")).contains(&sq("d6")));
        assert_eq!(
            board.apply_move(sq("e5"), sq("d6")),
            Err(MoveError::IllegalDestination {
                from: sq("e5"),
                to: sq("d6"),
            })
        );
    }

    #[test]
    fn test_en_passant_target_is_not_reachable_by_own_pawns() {
        let mut board = Board::new();
        play(&mut board, &[("e2", "e4")]);
        board.set_side_to_move(Color::White);
        assert!(!board.legal_moves(sq("d2")).contains(&sq("e3")));
        assert!(!board.legal_moves(sq("f2")).contains(&sq("e3")));
    }

    #[test]
    fn test_rejections_leave_board_untouched() {
        let mut board = Board::new();
        let before = board.clone();

        assert_eq!(
            board.apply_move(sq("e4"), sq("e5")),
            Err(MoveError::NoPieceAtSource { square: sq("e4") })
        );
        assert_eq!(
            board.apply_move(sq("e7"), sq("e5")),
            Err(MoveError::WrongSideToMove {
                expected: Color::White,
            })
        );
        assert_eq!(
            board.apply_move(sq("e2"), sq("e5")),
            Err(MoveError::IllegalDestination {
                from: sq("e2"),
                to: sq("e5"),
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_pinned_piece_would_expose_king() {
        let mut board = Board::empty(sq("e1"), sq("a8")).unwrap();
        board.set_piece(sq("e2"), Piece::new(PieceKind::Bishop, Color::White));
        board.set_piece(sq("e7"), Piece::new(PieceKind::Rook, Color::Black));
        let before = board.clone();

        let err = board.apply_move(sq("e2"), sq("d3")).unwrap_err();
        assert_eq!(
            err,
            MoveError::WouldExposeOwnKing {
                from: sq("e2"),
                to: sq("d3"),
            }
        );
        assert!(err.to_string().contains("check"));
        assert_eq!(board, before);
        assert!(board.legal_moves(sq("e2")).is_empty());
    }

    #[test]
    fn test_king_is_never_captured() {
        // Black is left in check with white to move
        let mut board = Board::empty(sq("e1"), sq("e8")).unwrap();
        board.set_piece(sq("e5"), Piece::new(PieceKind::Rook, Color::White));
        let before = board.clone();

        assert!(board.is_in_check(Color::Black));
        assert!(!board.legal_moves(sq("e5")).contains(&sq("e8")));
        assert_eq!(
            board.apply_move(sq("e5"), sq("e8")),
            Err(MoveError::IllegalDestination {
                from: sq("e5"),
                to: sq("e8"),
            })
        );
        assert_eq!(board, before);

        let moves = MoveGenerator::new().generate_moves(&mut board, Color::White);
        assert!(moves.iter().all(|mv| mv.to != sq("e8")));
        assert_eq!(board.king_position(Color::Black), sq("e8"));
    }

    #[test]
    fn test_promote_checks_side_to_move_first() {
        let mut board = Board::empty(sq("e1"), sq("h8")).unwrap();
        board.set_piece(sq("c7"), Piece::new(PieceKind::Pawn, Color::Black));
        let before = board.clone();

        assert_eq!(
            board.promote(sq("c7"), sq("c6"), PieceKind::Queen),
            Err(MoveError::WrongSideToMove {
                expected: Color::White,
            })
        );
        assert_eq!(
            board.promote(sq("d4"), sq("d5"), PieceKind::Queen),
            Err(MoveError::NoPieceAtSource { square: sq("d4") })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_history_and_clock_only_change_on_commit() {
        let mut board = Board::new();
        let _ = board.legal_moves(sq("g1"));
        let _ = board.is_in_check(Color::White);
        assert!(board.position_history().is_empty());

        play(&mut board, &[("g1", "f3"), ("g8", "f6")]);
        assert_eq!(board.position_history().len(), 2);
        assert_eq!(board.halfmove_clock(), 2);

        play(&mut board, &[("e2", "e4")]);
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.position_history().last(), Some(&board.position_key()));
    }

    #[test]
    fn test_promotion() {
        let mut board = Board::empty(sq("e1"), sq("h8")).unwrap();
        board.set_piece(sq("b7"), Piece::new(PieceKind::Pawn, Color::White));
        board.set_piece(sq("a8"), Piece::new(PieceKind::Rook, Color::Black));

        assert!(board.would_promote(sq("b7"), sq("b8")));
        assert!(board.would_promote(sq("b7"), sq("a8")));
        assert!(!board.would_promote(sq("e1"), sq("e2")));
        assert_eq!(
            board.promote(sq("e1"), sq("e2"), PieceKind::Queen),
            Err(MoveError::NotAPromotion {
                from: sq("e1"),
                to: sq("e2"),
            })
        );

        let outcome = board.promote(sq("b7"), sq("a8"), PieceKind::Knight).unwrap();
        assert_eq!(outcome.promotion, Some(PieceKind::Knight));
        assert_eq!(outcome.captured.map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(outcome.notation(), "b7 a8");

        let promoted = board.piece_at(sq("a8")).unwrap();
        assert_eq!(promoted.kind, PieceKind::Knight);
        assert_eq!(promoted.color, Color::White);
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.position_history().len(), 1);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut board = Board::empty(sq("e1"), sq("h8")).unwrap();
        board.set_piece(sq("c2"), Piece::new(PieceKind::Pawn, Color::Black));
        board.set_side_to_move(Color::Black);

        let outcome = board.promote(sq("c2"), sq("c1"), PieceKind::King).unwrap();
        assert_eq!(outcome.promotion, Some(PieceKind::Queen));
        assert_eq!(board.piece_at(sq("c1")).unwrap().kind, PieceKind::Queen);
    }

    #[test]
    fn test_check_is_clone_invariant() {
        let mut board = Board::new();
        play(&mut board, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
        let copy = board.clone();
        assert!(board.is_in_check(Color::White));
        assert_eq!(copy.is_in_check(Color::White), board.is_in_check(Color::White));
        assert_eq!(copy.is_in_check(Color::Black), board.is_in_check(Color::Black));
    }

    #[test]
    fn test_random_playouts_keep_invariants() {
        let generator = MoveGenerator::new();
        let mut rng = StdRng::seed_from_u64(0x5EED);

        for _ in 0..4 {
            let mut board = Board::new();
            for _ in 0..120 {
                let color = board.side_to_move();
                for (square, _) in board.pieces(color).collect::<Vec<_>>() {
                    for to in generator.pseudo_legal_moves(&board, square) {
                        assert!(to.row() < 8 && to.col() < 8);
                    }
                }

                let moves = generator.generate_moves(&mut board, color);
                let Some(mv) = moves.choose(&mut rng).copied() else {
                    break;
                };

                let key_before = board.position_key();
                let mut trial = board.clone();
                let undo = trial.make_move(mv.from, mv.to, None).unwrap();
                trial.unmake_move(undo);
                assert_eq!(trial.position_key(), key_before);

                if board.would_promote(mv.from, mv.to) {
                    board.promote(mv.from, mv.to, PieceKind::Queen).unwrap();
                } else {
                    board.apply_move(mv.from, mv.to).unwrap();
                }

                for color in [Color::White, Color::Black] {
                    let king = board.piece_at(board.king_position(color)).unwrap();
                    assert_eq!(king.kind, PieceKind::King);
                    assert_eq!(king.color, color);
                    let kings = board
                        .pieces(color)
                        .filter(|(_, p)| p.kind == PieceKind::King)
                        .count();
                    assert_eq!(kings, 1);
                }
                assert!(!board.is_in_check(color));
            }
        }
    }
}
