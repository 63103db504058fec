//! 非困难难度使用的单步启发式评分。

use crate::game::{Board, Player, RuleError, CELL_COUNT, CENTER, CORNERS};

pub const WIN_SCORE: i32 = 100;
pub const BLOCK_SCORE: i32 = 90;
pub const CENTER_SCORE: i32 = 70;
pub const CORNER_SCORE: i32 = 60;
pub const EDGE_SCORE: i32 = 50;

/// 按优先级给候选格打分，命中第一条规则即返回：
/// 直接获胜 > 必须封堵 > 中心 > 角 > 边。
///
/// 在副本上试探，不会修改传入的棋盘。下标越界或该格已有棋子时返回错误。
pub fn evaluate_move(board: &Board, index: usize, ai: Player) -> Result<i32, RuleError> {
    if index >= CELL_COUNT {
        return Err(RuleError::InvalidIndex { index });
    }
    if !board.is_empty(index) {
        return Err(RuleError::CellOccupied { index });
    }
    Ok(score_cell(board, index, ai))
}

// 调用方保证 index 是空格。
fn score_cell(board: &Board, index: usize, ai: Player) -> i32 {
    let mut scratch = *board;

    scratch.place_unchecked(index, ai.to_cell());
    if scratch.winner() == Some(ai) {
        return WIN_SCORE;
    }

    let opponent = ai.opponent();
    scratch.place_unchecked(index, opponent.to_cell());
    if scratch.winner() == Some(opponent) {
        return BLOCK_SCORE;
    }

    if index == CENTER {
        CENTER_SCORE
    } else if CORNERS.contains(&index) {
        CORNER_SCORE
    } else {
        EDGE_SCORE
    }
}

/// 所有空格及其评分，按扫描顺序排列。
pub fn score_empty_cells(board: &Board, ai: Player) -> Vec<(usize, i32)> {
    board
        .empty_cells()
        .into_iter()
        .map(|index| (index, score_cell(board, index, ai)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("test board should parse")
    }

    #[test]
    fn completing_own_line_scores_win() {
        let board = board("OO.......");
        assert_eq!(evaluate_move(&board, 2, Player::O), Ok(WIN_SCORE));
    }

    #[test]
    fn blocking_opponent_line_scores_block() {
        let board = board("XX.......");
        assert_eq!(evaluate_move(&board, 2, Player::O), Ok(BLOCK_SCORE));
    }

    #[test]
    fn win_outranks_block_on_same_cell() {
        // 6 既完成 O 的第一列，也封堵 X 的底行
        let board = board("O..O...XX");
        assert_eq!(evaluate_move(&board, 6, Player::O), Ok(WIN_SCORE));
    }

    #[test]
    fn positional_fallbacks() {
        let board = Board::new();
        assert_eq!(evaluate_move(&board, 4, Player::O), Ok(CENTER_SCORE));
        for corner in CORNERS {
            assert_eq!(evaluate_move(&board, corner, Player::O), Ok(CORNER_SCORE));
        }
        for edge in [1, 3, 5, 7] {
            assert_eq!(evaluate_move(&board, edge, Player::O), Ok(EDGE_SCORE));
        }
    }

    #[test]
    fn out_of_range_or_occupied_cell_is_rejected() {
        let board = board("X........");
        assert_eq!(
            evaluate_move(&board, 9, Player::O),
            Err(RuleError::InvalidIndex { index: 9 })
        );
        assert_eq!(
            evaluate_move(&board, usize::MAX, Player::X),
            Err(RuleError::InvalidIndex { index: usize::MAX })
        );
        assert_eq!(
            evaluate_move(&board, 0, Player::O),
            Err(RuleError::CellOccupied { index: 0 })
        );
    }

    #[test]
    fn scores_follow_priority_order() {
        assert!(WIN_SCORE > BLOCK_SCORE);
        assert!(BLOCK_SCORE > CENTER_SCORE);
        assert!(CENTER_SCORE > CORNER_SCORE);
        assert!(CORNER_SCORE > EDGE_SCORE);
    }

    #[test]
    fn evaluation_leaves_board_untouched() {
        let board = board("XX..O....");
        let before = board;
        let scores = score_empty_cells(&board, Player::O);
        assert_eq!(board, before);
        assert_eq!(scores.first(), Some(&(2, BLOCK_SCORE)));
        assert_eq!(scores.len(), 6);
    }

    #[test]
    fn evaluates_from_x_perspective_too() {
        let board = board("XX..O....");
        assert_eq!(evaluate_move(&board, 2, Player::X), Ok(WIN_SCORE));
    }
}
