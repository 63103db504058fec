use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::board::{Board, GameResult, Player};

/// 单步落子可能出现的错误，均可恢复：调用方放弃本次落子即可。
#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("cell index {index} is outside 0-8")]
    InvalidIndex { index: usize },
    #[error("cell {index} is already occupied")]
    CellOccupied { index: usize },
    #[error("game is already over")]
    GameAlreadyOver,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
}

pub fn new_game() -> Board {
    Board::new()
}

/// 校验并落子，返回落子后的对局结果。
pub fn apply_move(board: &mut Board, index: usize, player: Player) -> Result<GameResult, RuleError> {
    if board.terminal_state().is_terminal() {
        warn!(index, %player, "move rejected: game already over");
        return Err(RuleError::GameAlreadyOver);
    }
    if let Err(error) = board.set(index, player) {
        warn!(index, %player, %error, "move rejected");
        return Err(error);
    }
    let result = board.terminal_state();
    debug!(index, %player, ?result, "move applied");
    Ok(result)
}

/// 从空棋盘出发、X 先手轮流落子能到达的全部局面（含空棋盘与终局）。
#[cfg(test)]
pub(crate) fn reachable_boards() -> Vec<Board> {
    use std::collections::HashSet;

    let start = new_game();
    let mut seen = HashSet::from([start]);
    let mut stack = vec![(start, Player::X)];
    let mut boards = vec![start];
    while let Some((board, player)) = stack.pop() {
        if board.terminal_state().is_terminal() {
            continue;
        }
        for index in board.empty_cells() {
            let mut next = board;
            apply_move(&mut next, index, player).expect("empty cell on a live board");
            if seen.insert(next) {
                boards.push(next);
                stack.push((next, player.opponent()));
            }
        }
    }
    boards
}
