use crate::board::{Board, Color, PieceKind, Square};
use crate::game_state::GameState;
use crate::movegen::MoveOutcome;
use crate::search::Search;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::debug;

const HELP: &str = "\
Commands:
  <from><to>[q|r|b|n]  play a move, e.g. e2e4 or e7e8n
  moves <square>       list legal destinations for a piece
  go                   let the engine move for the side to play
  show                 print the board
  history              print the moves and captured pieces
  new                  start a new game
  quit                 leave
";

/// Text front end: a human plays one color, the engine answers with the other.
pub struct Console {
    board: Board,
    search: Search,
    human: Color,
    history: Vec<MoveOutcome>,
    state: GameState,
}

impl Console {
    pub fn new(search: Search, human: Color) -> Self {
        Self {
            board: Board::new(),
            search,
            human,
            history: Vec::new(),
            state: GameState::Ongoing,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn history(&self) -> &[MoveOutcome] {
        &self.history
    }

    /// Reads commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        writeln!(stdout, "{}", self.board)?;
        if self.board.side_to_move() != self.human {
            write!(stdout, "{}", self.engine_move())?;
        }
        stdout.flush()?;

        for line in stdin.lock().lines() {
            let line = line.context("failed to read a command from stdin")?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            write!(stdout, "{}", self.handle_command(command))?;
            stdout.flush().context("failed to write to stdout")?;
        }
        Ok(())
    }

    /// Lets the engine play both sides until the game is decided.
    pub fn play_out<W: Write>(&mut self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.board)?;
        while !self.state.is_over() {
            let before = self.history.len();
            write!(out, "{}", self.engine_move())?;
            if self.history.len() == before {
                break;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> String {
        let parts: Vec<&str> = command.split_whitespace().collect();

        match parts.as_slice() {
            [] => String::new(),
            ["help"] => HELP.to_string(),
            ["moves", square] => self.handle_moves(square),
            ["go"] => self.engine_move(),
            ["show"] => format!("{}\n{}\n", self.board, self.state),
            ["history"] => self.handle_history(),
            ["new"] => {
                self.reset();
                format!("{}\n", self.board)
            }
            [mv] => self.handle_move(mv),
            _ => format!("Unknown command: {command}\n"),
        }
    }

    fn reset(&mut self) {
        self.board = Board::new();
        self.history.clear();
        self.state = GameState::Ongoing;
    }

    fn handle_moves(&self, square: &str) -> String {
        let square = match square.parse::<Square>() {
            Ok(square) => square,
            Err(err) => return format!("{err}\n"),
        };

        let destinations: Vec<String> = self
            .board
            .legal_moves(square)
            .iter()
            .map(|to| to.to_string())
            .collect();
        if destinations.is_empty() {
            format!("No legal moves from {square}\n")
        } else {
            format!("{}\n", destinations.join(" "))
        }
    }

    fn handle_move(&mut self, text: &str) -> String {
        let Some((from, to, promotion)) = parse_move(text) else {
            return format!("Unknown command: {text}\n");
        };
        if self.state.is_over() {
            return format!("The game is over. {}\n", self.state);
        }

        let result = if self.board.would_promote(from, to) {
            self.board.promote(from, to, promotion.unwrap_or(PieceKind::Queen))
        } else {
            self.board.apply_move(from, to)
        };

        match result {
            Ok(outcome) => {
                let mut response = self.record(outcome);
                if !self.state.is_over() && self.board.side_to_move() != self.human {
                    response.push_str(&self.engine_move());
                }
                response
            }
            Err(err) => format!("Illegal move: {err}\n"),
        }
    }

    fn engine_move(&mut self) -> String {
        if self.state.is_over() {
            return format!("The game is over. {}\n", self.state);
        }

        let color = self.board.side_to_move();
        let Some(mv) = self.search.find_best_move(&self.board, color) else {
            return format!("{color} has no legal moves\n");
        };

        let result = if self.board.would_promote(mv.from, mv.to) {
            self.board.promote(mv.from, mv.to, PieceKind::Queen)
        } else {
            self.board.apply_move(mv.from, mv.to)
        };

        match result {
            Ok(outcome) => self.record(outcome),
            Err(err) => format!("Engine move {mv} was rejected: {err}\n"),
        }
    }

    fn record(&mut self, outcome: MoveOutcome) -> String {
        self.history.push(outcome);
        self.state = self.board.classify();
        debug!(mv = %outcome.notation(), state = ?self.state, "move committed");

        let mut response = format!("{} plays {}", outcome.piece.color, outcome.notation());
        if let Some(captured) = outcome.captured {
            response.push_str(&format!(", taking a {captured}"));
        }
        if let Some(kind) = outcome.promotion {
            response.push_str(&format!(", promoting to a {kind}"));
        }
        if outcome.is_castling {
            response.push_str(", castling");
        }
        response.push('\n');

        response.push_str(&format!("{}\n", self.board));
        if self.state != GameState::Ongoing {
            response.push_str(&format!("{}\n", self.state));
        }
        response
    }

    fn handle_history(&self) -> String {
        let mut response = String::new();
        for (number, pair) in self.history.chunks(2).enumerate() {
            let moves: Vec<String> = pair.iter().map(|outcome| outcome.notation()).collect();
            response.push_str(&format!("{}. {}\n", number + 1, moves.join("  ")));
        }

        for color in [Color::White, Color::Black] {
            let captured: Vec<String> = self
                .history
                .iter()
                .filter(|outcome| outcome.piece.color == color)
                .filter_map(|outcome| outcome.captured)
                .map(|piece| piece.kind.to_string())
                .collect();
            response.push_str(&format!("Captured by {color}: {}\n", captured.join(", ")));
        }
        response
    }
}

/// Parses `e2e4` or `e7e8q` into squares and an optional promotion kind.
fn parse_move(text: &str) -> Option<(Square, Square, Option<PieceKind>)> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return None;
    }

    let from = text[0..2].parse().ok()?;
    let to = text[2..4].parse().ok()?;
    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c @ ('q' | 'r' | 'b' | 'n')) => Some(PieceKind::from_promotion_char(c)),
        Some(_) => return None,
    };

    Some((from, to, promotion))
}
