use crate::game::{Board, Cell, PlayerId, CONNECT};

/// Side marker for the searching bot.
pub const OWN: i8 = 1;
/// Side marker for its opponent.
pub const OPPONENT: i8 = -1;

const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Search copy of a board, seen from one bot's perspective: cells hold
/// [`OWN`], [`OPPONENT`] or 0. Supports cheap play/undo during lookahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    width: usize,
    height: usize,
    cells: Vec<i8>,
    heights: Vec<usize>,
}

impl Position {
    pub fn from_board(board: &Board, own: PlayerId) -> Self {
        let (width, height) = (board.width(), board.height());
        let mut cells = vec![0; width * height];
        for row in 0..height {
            for col in 0..width {
                cells[row * width + col] = match board.get(col, row) {
                    Cell::Empty => 0,
                    Cell::Owned(id) if id == own => OWN,
                    Cell::Owned(_) => OPPONENT,
                };
            }
        }
        Position {
            width,
            height,
            cells,
            heights: (0..width).map(|c| board.column_height(c)).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, col: usize, row: usize) -> i8 {
        self.cells[row * self.width + col]
    }

    pub fn can_play(&self, col: usize) -> bool {
        col < self.width && self.heights[col] < self.height
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h == self.height)
    }

    pub fn legal_columns(&self) -> Vec<usize> {
        (0..self.width).filter(|&c| self.can_play(c)).collect()
    }

    /// Drop a token for `side`. The column must be playable.
    pub fn play(&mut self, col: usize, side: i8) {
        let row = self.heights[col];
        self.cells[row * self.width + col] = side;
        self.heights[col] += 1;
    }

    /// Take back the top token of `col`.
    pub fn undo(&mut self, col: usize) {
        self.heights[col] -= 1;
        let row = self.heights[col];
        self.cells[row * self.width + col] = 0;
    }

    /// Whether dropping a `side` token into `col` would complete a line.
    pub fn is_winning_move(&self, col: usize, side: i8) -> bool {
        if !self.can_play(col) {
            return false;
        }
        let row = self.heights[col];
        AXES.iter().any(|&(dc, dr)| {
            1 + self.run(col, row, dc, dr, side) + self.run(col, row, -dc, -dr, side) >= CONNECT
        })
    }

    fn run(&self, col: usize, row: usize, dc: isize, dr: isize, side: i8) -> usize {
        let mut count = 0;
        let mut c = col as isize + dc;
        let mut r = row as isize + dr;
        while c >= 0
            && r >= 0
            && (c as usize) < self.width
            && (r as usize) < self.height
            && self.get(c as usize, r as usize) == side
        {
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// FNV-1a over the width and cell contents, used to seed per-position
    /// randomness. Fixed across platforms and toolchains.
    pub fn fingerprint(&self) -> u64 {
        let width = (self.width as u64).to_le_bytes();
        let cells = self.cells.iter().map(|&c| c as u8);
        width
            .into_iter()
            .chain(cells)
            .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
    }
}

/// Columns ordered from the horizontal center outwards, left first on ties.
/// Used both for alpha-beta move ordering and for tie-breaking.
pub fn center_order(width: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..width).collect();
    order.sort_by_key(|&c| ((2 * c).abs_diff(width - 1), c));
    order
}
