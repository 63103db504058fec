use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::game::{Board, Cell, GameResult, Player, CELL_COUNT};

pub const WIN_VALUE: i32 = 10;
pub const LOSS_VALUE: i32 = -10;
pub const TIE_VALUE: i32 = 0;

/// 试探性落子。离开作用域时自动清空该格，剪枝提前退出也不会泄漏。
struct TrialMove<'a> {
    board: &'a mut Board,
    index: usize,
}

impl<'a> TrialMove<'a> {
    fn place(board: &'a mut Board, index: usize, player: Player) -> Self {
        board.place_unchecked(index, player.to_cell());
        Self { board, index }
    }
}

impl Deref for TrialMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for TrialMove<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for TrialMove<'_> {
    fn drop(&mut self) {
        self.board.place_unchecked(self.index, Cell::Empty);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
}

/// 根节点搜索结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub index: usize,
    pub score: i32,
    pub nodes: u64,
}

/// 全深度 alpha-beta 搜索，`ai` 为极大方。
///
/// 根节点按 0..8 顺序扫描空格，每个分支使用完整窗口，
/// 只有严格更高的分数才会替换当前最佳，因此平分时取最小下标。
pub fn search(board: &mut Board, ai: Player) -> Option<SearchResult> {
    let mut stats = SearchStats::default();
    let mut best: Option<(usize, i32)> = None;

    for index in 0..CELL_COUNT {
        if !board.is_empty(index) {
            continue;
        }
        let score = {
            let mut trial = TrialMove::place(board, index, ai);
            minimax(&mut trial, ai, false, i32::MIN, i32::MAX, &mut stats)
        };
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    let (index, score) = best?;
    trace!(index, score, nodes = stats.nodes, %ai, "minimax search finished");
    Some(SearchResult {
        index,
        score,
        nodes: stats.nodes,
    })
}

/// 给出 `ai` 的最优落点；棋盘没有空格时返回 `None`。
pub fn best_move(board: &mut Board, ai: Player) -> Option<usize> {
    search(board, ai).map(|result| result.index)
}

fn leaf_value(result: GameResult, ai: Player) -> Option<i32> {
    match result {
        GameResult::InProgress => None,
        GameResult::Tie => Some(TIE_VALUE),
        GameResult::Win(winner) if winner == ai => Some(WIN_VALUE),
        GameResult::Win(_) => Some(LOSS_VALUE),
    }
}

fn minimax(
    board: &mut Board,
    ai: Player,
    maximizing: bool,
    mut alpha: i32,
    mut beta: i32,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if let Some(value) = leaf_value(board.terminal_state(), ai) {
        return value;
    }

    let mover = if maximizing { ai } else { ai.opponent() };

    if maximizing {
        let mut value = i32::MIN;
        for index in 0..CELL_COUNT {
            if !board.is_empty(index) {
                continue;
            }
            let mut trial = TrialMove::place(board, index, mover);
            let score = minimax(&mut trial, ai, false, alpha, beta, stats);
            value = value.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        value
    } else {
        let mut value = i32::MAX;
        for index in 0..CELL_COUNT {
            if !board.is_empty(index) {
                continue;
            }
            let mut trial = TrialMove::place(board, index, mover);
            let score = minimax(&mut trial, ai, true, alpha, beta, stats);
            value = value.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        value
    }
}
