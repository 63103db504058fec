//! 游戏核心逻辑模块（棋盘、规则、回合状态机）。

pub mod board;
pub mod rules;
pub mod session;

pub use board::{
    terminal_state,
    Board,
    BoardParseError,
    Cell,
    GameResult,
    Player,
    CELL_COUNT,
    CENTER,
    CORNERS,
    WIN_PATTERNS,
};
pub use rules::{apply_move, new_game, RuleError};
pub use session::{Session, SessionState, TurnReport};
