use crate::board::{Board, Color, PieceKind, Undo};
use crate::evaluation::{Evaluator, MATE_SCORE};
use crate::movegen::{Move, MoveGenerator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Unbounded window edge for alpha-beta. Never produced as a score.
pub const INFINITY: i32 = i32::MAX;

/// Chance that an easy opponent ignores the search and plays any legal move.
const RANDOM_MOVE_CHANCE: f64 = 0.4;
/// Chance that a medium opponent picks among its best few one-ply moves.
const TOP_MOVES_CHANCE: f64 = 0.3;
const TOP_MOVES: usize = 3;

/// Opponent strength. Levels 1 to 3 map to the same search depth; any other
/// level searches two plies without the randomised tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Difficulty = Difficulty(1);
    pub const MEDIUM: Difficulty = Difficulty(2);
    pub const HARD: Difficulty = Difficulty(3);

    pub fn new(level: u8) -> Self {
        Difficulty(level)
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn depth(&self) -> u32 {
        match self.0 {
            1 => 1,
            2 => 2,
            3 => 3,
            _ => 2,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::MEDIUM
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::EASY),
            "medium" => Ok(Difficulty::MEDIUM),
            "hard" => Ok(Difficulty::HARD),
            other => other
                .parse::<u8>()
                .map(Difficulty)
                .map_err(|_| format!("Invalid difficulty: {other}")),
        }
    }
}

pub struct Search<R = StdRng> {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    difficulty: Difficulty,
    max_depth: Option<u32>,
    rng: R,
    nodes_searched: u64,
}

impl Search<StdRng> {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_rng(difficulty, StdRng::from_entropy())
    }

    /// A search whose random choices repeat for the same seed.
    pub fn seeded(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Search<R> {
    pub fn with_rng(difficulty: Difficulty, rng: R) -> Self {
        Self {
            evaluator: Evaluator::new(),
            move_generator: MoveGenerator::new(),
            difficulty,
            max_depth: None,
            rng,
            nodes_searched: 0,
        }
    }

    /// Picks a move for `color`, or `None` if it has no legal move.
    pub fn find_best_move(&mut self, board: &Board, color: Color) -> Option<Move> {
        self.nodes_searched = 0;

        let mut board = board.clone();
        let moves = self.move_generator.generate_moves(&mut board, color);
        if moves.is_empty() {
            debug!(%color, "no legal moves to search");
            return None;
        }

        match self.difficulty.level() {
            1 if self.rng.gen_bool(RANDOM_MOVE_CHANCE) => {
                let mv = moves.choose(&mut self.rng).copied();
                debug!(%color, chosen = ?mv, "easy opponent played a random move");
                return mv;
            }
            2 if self.rng.gen_bool(TOP_MOVES_CHANCE) => {
                let mv = self.pick_from_top_moves(&mut board, &moves, color);
                debug!(%color, chosen = ?mv, "medium opponent picked among its top moves");
                return mv;
            }
            _ => {}
        }

        let depth = self.max_depth.unwrap_or_else(|| self.difficulty.depth());
        let (score, best_move) = self.minimax(&mut board, depth, -INFINITY, INFINITY, color);
        debug!(
            %color,
            difficulty = %self.difficulty,
            depth,
            nodes = self.nodes_searched,
            score,
            chosen = ?best_move,
            "search finished"
        );

        best_move
    }

    /// Scores every move one ply deep from `color`'s side and picks one of
    /// the best few at random.
    fn pick_from_top_moves(&mut self, board: &mut Board, moves: &[Move], color: Color) -> Option<Move> {
        let mut scored = Vec::with_capacity(moves.len());
        for &mv in moves {
            let Some(undo) = self.play(board, mv) else {
                continue;
            };
            self.nodes_searched += 1;
            let score = self.evaluator.evaluate(board);
            board.unmake_move(undo);
            scored.push((mv, if color == Color::White { score } else { -score }));
        }

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(TOP_MOVES);
        scored.choose(&mut self.rng).map(|&(mv, _)| mv)
    }

    /// Minimax with alpha-beta pruning. White maximises, black minimises.
    fn minimax(&mut self, board: &mut Board, depth: u32, mut alpha: i32, mut beta: i32, color: Color) -> (i32, Option<Move>) {
        self.nodes_searched += 1;

        if depth == 0 {
            return (self.evaluator.evaluate(board), None);
        }

        let moves = self.move_generator.generate_moves(board, color);
        if moves.is_empty() {
            let score = if self.move_generator.is_king_in_check(board, color) {
                match color {
                    Color::White => -MATE_SCORE,
                    Color::Black => MATE_SCORE,
                }
            } else {
                0
            };
            return (score, None);
        }

        let maximizing = color == Color::White;
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_move = None;

        for mv in moves {
            let Some(undo) = self.play(board, mv) else {
                continue;
            };
            let (score, _) = self.minimax(board, depth - 1, alpha, beta, color.opposite());
            board.unmake_move(undo);

            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(score);
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                beta = beta.min(score);
            }

            if beta <= alpha {
                break;
            }
        }

        (best_score, best_move)
    }

    /// Engine moves that reach the last rank always promote to a queen.
    fn play(&self, board: &mut Board, mv: Move) -> Option<Undo> {
        let promotion = board.would_promote(mv.from, mv.to).then_some(PieceKind::Queen);
        board.make_move(mv.from, mv.to, promotion)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Overrides the difficulty's depth. Depths below one are raised to one.
    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = Some(depth.max(1));
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

/// Chooses a move for `color` at the given difficulty, drawing any random
/// choices from `rng`.
pub fn best_move<R: Rng>(board: &Board, difficulty: Difficulty, color: Color, rng: &mut R) -> Option<Move> {
    Search::with_rng(difficulty, rng).find_best_move(board, color)
}
