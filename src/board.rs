use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// Maps a promotion choice to the piece that is actually placed.
    /// Anything other than rook, bishop or knight becomes a queen.
    pub fn promotion_choice(self) -> PieceKind {
        match self {
            PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight => self,
            _ => PieceKind::Queen,
        }
    }

    /// Parses a promotion suffix such as `q` or `N`, defaulting to a queen.
    pub fn from_promotion_char(c: char) -> PieceKind {
        match c.to_ascii_lowercase() {
            'r' => PieceKind::Rook,
            'b' => PieceKind::Bishop,
            'n' => PieceKind::Knight,
            _ => PieceKind::Queen,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Row the pawns of this color advance towards.
    pub fn promotion_row(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row of this color's back rank.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row delta of a single pawn step.
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(format!("Invalid color: {other}")),
        }
    }
}

/// A piece as it sits on a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    /// Set on the piece's first committed move, castling rook moves included.
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
        }
    }

    /// Two-character code used in position keys, e.g. `WP` or `BK`.
    pub fn code(&self) -> [char; 2] {
        let color = match self.color {
            Color::White => 'W',
            Color::Black => 'B',
        };
        [color, self.kind.letter()]
    }

    fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// A board coordinate. Row 0 is black's back rank (rank 8), row 7 is white's (rank 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if row < 8 && col < 8 {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// The square `dr` rows and `dc` columns away, if it is on the board.
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// All 64 squares, row by row starting from black's back rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }

    /// Parity of the square, used to tell light and dark squares apart.
    pub fn is_light(&self) -> bool {
        (self.row + self.col) % 2 == 0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

impl FromStr for Square {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("Invalid square format: {s}"));
        };

        let col = match file.to_ascii_lowercase() {
            f @ 'a'..='h' => f as u8 - b'a',
            _ => return Err(format!("Invalid file: {file}")),
        };
        let row = match rank {
            r @ '1'..='8' => 8 - (r as u8 - b'0'),
            _ => return Err(format!("Invalid rank: {rank}")),
        };

        Ok(Square { row, col })
    }
}

/// Everything `unmake_move` needs to put the board back the way it was.
#[derive(Debug, Clone)]
pub struct Undo {
    from: Square,
    to: Square,
    moved: Piece,
    captured: Option<(Square, Piece)>,
    rook: Option<(Square, Square, Piece)>,
    en_passant_target: Option<Square>,
    halfmove_clock: u32,
    side_to_move: Color,
    king_position: Square,
}

impl Undo {
    /// The piece removed by the move and the square it stood on.
    pub fn captured(&self) -> Option<(Square, Piece)> {
        self.captured
    }

    pub fn is_castling(&self) -> bool {
        self.rook.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        matches!(self.captured, Some((square, _)) if square != self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) grid: [[Option<Piece>; 8]; 8],
    pub(crate) side_to_move: Color,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) king_positions: [Square; 2],
    pub(crate) halfmove_clock: u32,
    pub(crate) position_history: Vec<String>,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// The standard opening position with white to move.
    pub fn new() -> Self {
        let mut grid = [[None; 8]; 8];
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            grid[0][col] = Some(Piece::new(kind, Color::Black));
            grid[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            grid[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            grid[7][col] = Some(Piece::new(kind, Color::White));
        }

        Self {
            grid,
            side_to_move: Color::White,
            en_passant_target: None,
            king_positions: [Square { row: 7, col: 4 }, Square { row: 0, col: 4 }],
            halfmove_clock: 0,
            position_history: Vec::new(),
        }
    }

    /// A board holding only the two kings, white to move.
    ///
    /// Returns `None` if both kings are given the same square.
    pub fn empty(white_king: Square, black_king: Square) -> Option<Self> {
        if white_king == black_king {
            return None;
        }

        let mut grid = [[None; 8]; 8];
        grid[white_king.row as usize][white_king.col as usize] =
            Some(Piece::new(PieceKind::King, Color::White));
        grid[black_king.row as usize][black_king.col as usize] =
            Some(Piece::new(PieceKind::King, Color::Black));

        Some(Self {
            grid,
            side_to_move: Color::White,
            en_passant_target: None,
            king_positions: [white_king, black_king],
            halfmove_clock: 0,
            position_history: Vec::new(),
        })
    }

    /// Places `piece` on `square`. Placing a king relocates that color's king.
    ///
    /// Returns `false` and leaves the board untouched if `square` holds a king.
    pub fn set_piece(&mut self, square: Square, piece: Piece) -> bool {
        if matches!(self.piece_at(square), Some(p) if p.kind == PieceKind::King) {
            return false;
        }

        if piece.kind == PieceKind::King {
            let old = self.king_positions[piece.color.index()];
            self.grid[old.row as usize][old.col as usize] = None;
            self.king_positions[piece.color.index()] = square;
        }
        self.grid[square.row as usize][square.col as usize] = Some(piece);
        true
    }

    /// Removes and returns the piece on `square`. Kings stay where they are.
    pub fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        match self.piece_at(square) {
            Some(piece) if piece.kind != PieceKind::King => self.take(square),
            _ => None,
        }
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.grid[square.row as usize][square.col as usize]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn king_position(&self, color: Color) -> Square {
        self.king_positions[color.index()]
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn position_history(&self) -> &[String] {
        &self.position_history
    }

    /// Every occupied square holding a piece of `color`.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| {
            self.piece_at(square)
                .filter(|piece| piece.color == color)
                .map(|piece| (square, piece))
        })
    }

    fn take(&mut self, square: Square) -> Option<Piece> {
        self.grid[square.row as usize][square.col as usize].take()
    }

    fn put(&mut self, square: Square, piece: Option<Piece>) {
        self.grid[square.row as usize][square.col as usize] = piece;
    }

    /// Applies the move `from -> to` without any legality checks and returns
    /// the token that reverts it.
    ///
    /// Handles en passant removal, the castling rook, the en passant target,
    /// the halfmove clock, the king cache and the side to move. The position
    /// history is left alone; committing a move is the caller's business.
    /// Returns `None` if `from` is empty.
    pub fn make_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> Option<Undo> {
        let moved = self.piece_at(from)?;
        let mut undo = Undo {
            from,
            to,
            moved,
            captured: None,
            rook: None,
            en_passant_target: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            side_to_move: self.side_to_move,
            king_position: self.king_position(moved.color),
        };

        // En passant takes the pawn beside the mover, not the one on the target
        let is_en_passant = moved.kind == PieceKind::Pawn
            && self.en_passant_target == Some(to)
            && from.col != to.col
            && self.piece_at(to).is_none();
        if is_en_passant {
            let victim = Square { row: from.row, col: to.col };
            undo.captured = self.take(victim).map(|piece| (victim, piece));
        } else {
            undo.captured = self.take(to).map(|piece| (to, piece));
        }

        if moved.kind == PieceKind::King && from.col.abs_diff(to.col) == 2 {
            let (rook_from_col, rook_to_col) = if to.col > from.col { (7, 5) } else { (0, 3) };
            let rook_from = Square { row: from.row, col: rook_from_col };
            let rook_to = Square { row: from.row, col: rook_to_col };
            if let Some(rook) = self.take(rook_from) {
                self.put(
                    rook_to,
                    Some(Piece {
                        has_moved: true,
                        ..rook
                    }),
                );
                undo.rook = Some((rook_from, rook_to, rook));
            }
        }

        self.en_passant_target = None;
        if moved.kind == PieceKind::Pawn && from.row.abs_diff(to.row) == 2 {
            self.en_passant_target = Some(Square {
                row: (from.row + to.row) / 2,
                col: from.col,
            });
        }

        if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        self.take(from);
        let kind = match (moved.kind, promotion) {
            (PieceKind::Pawn, Some(kind)) => kind.promotion_choice(),
            _ => moved.kind,
        };
        self.put(
            to,
            Some(Piece {
                kind,
                color: moved.color,
                has_moved: true,
            }),
        );
        if moved.kind == PieceKind::King {
            self.king_positions[moved.color.index()] = to;
        }

        self.side_to_move = moved.color.opposite();

        Some(undo)
    }

    /// Reverts a move made by `make_move`. Tokens must be undone in reverse order.
    pub fn unmake_move(&mut self, undo: Undo) {
        self.take(undo.to);
        if let Some((rook_from, rook_to, rook)) = undo.rook {
            self.take(rook_to);
            self.put(rook_from, Some(rook));
        }
        if let Some((square, piece)) = undo.captured {
            self.put(square, Some(piece));
        }
        self.put(undo.from, Some(undo.moved));

        self.en_passant_target = undo.en_passant_target;
        self.halfmove_clock = undo.halfmove_clock;
        self.side_to_move = undo.side_to_move;
        self.king_positions[undo.moved.color.index()] = undo.king_position;
    }

    /// Castling letters derived from the king and rook move flags.
    fn castling_rights(&self) -> String {
        let mut rights = String::new();
        for color in [Color::White, Color::Black] {
            let row = color.home_row();
            let king = self.piece_at(Square { row, col: 4 });
            if !matches!(king, Some(p) if p.kind == PieceKind::King && p.color == color && !p.has_moved) {
                continue;
            }
            for (col, letter) in [(7, 'K'), (0, 'Q')] {
                let rook = self.piece_at(Square { row, col });
                if matches!(rook, Some(p) if p.kind == PieceKind::Rook && p.color == color && !p.has_moved) {
                    rights.push(match color {
                        Color::White => letter,
                        Color::Black => letter.to_ascii_lowercase(),
                    });
                }
            }
        }
        if rights.is_empty() {
            rights.push('-');
        }
        rights
    }

    /// Canonical key of the current position: placement, side to move,
    /// castling rights and en passant target.
    pub fn position_key(&self) -> String {
        let mut key = String::with_capacity(96);
        for row in &self.grid {
            let mut empty = 0;
            for cell in row {
                match cell {
                    None => empty += 1,
                    Some(piece) => {
                        if empty > 0 {
                            key.push_str(&empty.to_string());
                            empty = 0;
                        }
                        key.extend(piece.code());
                    }
                }
            }
            if empty > 0 {
                key.push_str(&empty.to_string());
            }
            key.push('/');
        }

        key.push(' ');
        key.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        key.push(' ');
        key.push_str(&self.castling_rights());
        key.push(' ');
        match self.en_passant_target {
            Some(square) => key.push_str(&square.to_string()),
            None => key.push('-'),
        }
        key
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (row, cells) in self.grid.iter().enumerate() {
            write!(f, "{} ", 8 - row)?;
            for (col, cell) in cells.iter().enumerate() {
                let symbol = cell.map(|piece| piece.symbol()).unwrap_or('.');
                write!(f, "{}", symbol)?;
                if col < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
