use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::rules::RuleError;

/// 棋盘格子数量。
pub const CELL_COUNT: usize = 9;

/// 中心格。
pub const CENTER: usize = 4;

/// 四个角。
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// 三行、三列、两条对角线。
pub const WIN_PATTERNS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::X),
            "O" | "o" => Ok(Player::O),
            _ => Err(()),
        }
    }
}

/// 单个格子。序列化为 `""`、`"X"`、`"O"`，与前端数组保持一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' | '-' | '_' | ' ' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' => Some(Cell::O),
            _ => None,
        }
    }
}

/// 对局结果，每次按需从棋盘推导，不单独保存。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "winner")]
pub enum GameResult {
    InProgress,
    Win(Player),
    Tie,
}

impl GameResult {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameResult::InProgress)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// 越界时返回 `false`。
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    pub fn set(&mut self, index: usize, player: Player) -> Result<(), RuleError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(RuleError::InvalidIndex { index })?;
        if *cell != Cell::Empty {
            return Err(RuleError::CellOccupied { index });
        }
        *cell = player.to_cell();
        Ok(())
    }

    pub fn clear(&mut self, index: usize) -> Result<(), RuleError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(RuleError::InvalidIndex { index })?;
        *cell = Cell::Empty;
        Ok(())
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| *cell != Cell::Empty)
    }

    /// 按 `WIN_PATTERNS` 顺序返回第一条三连的归属方。
    pub fn winner(&self) -> Option<Player> {
        WIN_PATTERNS.iter().find_map(|&[a, b, c]| {
            let first = self.cells[a];
            if first != Cell::Empty && first == self.cells[b] && first == self.cells[c] {
                first.player()
            } else {
                None
            }
        })
    }

    pub fn terminal_state(&self) -> GameResult {
        if let Some(player) = self.winner() {
            GameResult::Win(player)
        } else if self.is_full() {
            GameResult::Tie
        } else {
            GameResult::InProgress
        }
    }

    /// 仅供搜索内部使用：调用方保证下标有效。
    pub(crate) fn place_unchecked(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }
}

pub fn terminal_state(board: &Board) -> GameResult {
    board.terminal_state()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardParseError {
    #[error("expected {CELL_COUNT} cells, got {got}")]
    Length { got: usize },
    #[error("invalid character '{character}' at position {position}")]
    Character { character: char, position: usize },
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// 例如 `"XX.O....."`，忽略换行和 `|`。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().filter(|c| *c != '\n' && *c != '|').collect();
        if chars.len() != CELL_COUNT {
            return Err(BoardParseError::Length { got: chars.len() });
        }
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (position, (slot, character)) in cells.iter_mut().zip(chars).enumerate() {
            *slot = Cell::from_char(character).ok_or(BoardParseError::Character {
                character,
                position,
            })?;
        }
        Ok(Self { cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                write!(f, "{}", cell.to_char())?;
            }
        }
        Ok(())
    }
}
