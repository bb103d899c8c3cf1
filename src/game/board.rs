use super::player::PlayerId;

pub const DEFAULT_WIDTH: usize = 7;
pub const DEFAULT_HEIGHT: usize = 6;

/// Number of same-owner cells in a line needed to win.
pub const CONNECT: usize = 4;

/// The four line axes through a cell: horizontal, vertical, `/` and `\`.
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Owned(PlayerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {column} is outside the board (width {width})")]
    InvalidColumn { column: usize, width: usize },

    #[error("column {0} is full")]
    ColumnFull(usize),
}

/// Result of a single placement. Consumed by the orchestrator and discarded;
/// only its effect on the board persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub player_id: PlayerId,
    pub column: usize,
    /// Landing row, counted from the bottom starting at 0.
    pub row: usize,
    pub is_connected: bool,
    pub is_tie: bool,
}

impl Move {
    /// Whether this move ended the game.
    pub fn is_terminal(&self) -> bool {
        self.is_connected || self.is_tie
    }
}

/// Board dimensions, loadable from the `[board]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Rectangular drop-token grid. Cells only ever go from empty to owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    // Row-major, row 0 at the bottom.
    cells: Vec<Cell>,
    heights: Vec<usize>,
}

impl Board {
    /// Create an empty board.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "board dimensions must be non-zero");
        Board {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
            heights: vec![0; width],
        }
    }

    /// The classic 7x6 board.
    pub fn standard() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the cell at a column and row (row 0 is the bottom).
    pub fn get(&self, column: usize, row: usize) -> Cell {
        self.cells[row * self.width + column]
    }

    /// Number of tokens already in a column.
    pub fn column_height(&self, column: usize) -> usize {
        self.heights.get(column).copied().unwrap_or(self.height)
    }

    pub fn is_move_legal(&self, column: usize) -> bool {
        column < self.width && self.heights[column] < self.height
    }

    /// Columns that can still take a token, left to right.
    pub fn legal_columns(&self) -> Vec<usize> {
        (0..self.width).filter(|&c| self.is_move_legal(c)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h == self.height)
    }

    pub fn move_count(&self) -> usize {
        self.heights.iter().sum()
    }

    /// Drop a token for `player_id` into `column` and report what it did.
    pub fn place(&mut self, column: usize, player_id: PlayerId) -> Result<Move, MoveError> {
        if column >= self.width {
            return Err(MoveError::InvalidColumn {
                column,
                width: self.width,
            });
        }
        let row = self.heights[column];
        if row >= self.height {
            return Err(MoveError::ColumnFull(column));
        }

        self.cells[row * self.width + column] = Cell::Owned(player_id);
        self.heights[column] += 1;

        let is_connected = self.connects_at(column, row);
        // A tie is only possible when the last move did not win.
        let is_tie = !is_connected && self.is_full();

        Ok(Move {
            player_id,
            column,
            row,
            is_connected,
            is_tie,
        })
    }

    /// Whether the token at (column, row) sits on a line of at least [`CONNECT`].
    pub fn connects_at(&self, column: usize, row: usize) -> bool {
        let owner = match self.get(column, row) {
            Cell::Empty => return false,
            Cell::Owned(id) => id,
        };

        AXES.iter().any(|&(dc, dr)| {
            let run = 1
                + self.run_length(column, row, dc, dr, owner)
                + self.run_length(column, row, -dc, -dr, owner);
            run >= CONNECT
        })
    }

    /// Count same-owner cells stepping away from (column, row), excluding the origin.
    fn run_length(&self, column: usize, row: usize, dc: isize, dr: isize, owner: PlayerId) -> usize {
        let mut count = 0;
        let mut c = column as isize + dc;
        let mut r = row as isize + dr;
        while c >= 0
            && r >= 0
            && (c as usize) < self.width
            && (r as usize) < self.height
            && self.get(c as usize, r as usize) == Cell::Owned(owner)
        {
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// Exhaustive scan of every cell for a winning line. Independent of the
    /// incremental check in [`Board::place`]; used to cross-check it.
    pub fn find_any_line(&self) -> Option<PlayerId> {
        for row in 0..self.height {
            for column in 0..self.width {
                if let Cell::Owned(owner) = self.get(column, row) {
                    for &(dc, dr) in &AXES {
                        let complete = (0..CONNECT as isize).all(|k| {
                            let c = column as isize + dc * k;
                            let r = row as isize + dr * k;
                            c >= 0
                                && r >= 0
                                && (c as usize) < self.width
                                && (r as usize) < self.height
                                && self.get(c as usize, r as usize) == Cell::Owned(owner)
                        });
                        if complete {
                            return Some(owner);
                        }
                    }
                }
            }
        }
        None
    }

    /// Build a board from explicit cells, ignoring gravity.
    #[cfg(test)]
    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Self {
        assert_eq!(cells.len(), width * height);
        let heights = (0..width)
            .map(|c| {
                (0..height)
                    .filter(|&r| cells[r * width + c] != Cell::Empty)
                    .count()
            })
            .collect();
        Board {
            width,
            height,
            cells,
            heights,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
