use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::{Board, GameResult, Player};
use super::rules::{apply_move, new_game, RuleError};
use crate::ai::{AiAgent, AiDecision, RandomSource};

/// 回合状态机。`Won` 与 `Tie` 为终止状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "winner")]
pub enum SessionState {
    XTurn,
    OTurn,
    Won(Player),
    Tie,
}

impl SessionState {
    pub fn turn_of(player: Player) -> Self {
        match player {
            Player::X => SessionState::XTurn,
            Player::O => SessionState::OTurn,
        }
    }

    pub fn current_player(self) -> Option<Player> {
        match self {
            SessionState::XTurn => Some(Player::X),
            SessionState::OTurn => Some(Player::O),
            SessionState::Won(_) | SessionState::Tie => None,
        }
    }

    pub fn is_over(self) -> bool {
        self.current_player().is_none()
    }
}

/// 一次玩家操作的结果：玩家落子以及随后电脑的应对。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnReport {
    pub human_move: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_move: Option<AiDecision>,
    pub board: Board,
    pub state: SessionState,
    pub result: GameResult,
    pub status: String,
}

/// 一局对局，独占自己的棋盘。玩家执 X 先手。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    board: Board,
    state: SessionState,
    human: Player,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            board: new_game(),
            state: SessionState::XTurn,
            human: Player::X,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn human(&self) -> Player {
        self.human
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_over()
    }

    pub fn result(&self) -> GameResult {
        self.board.terminal_state()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
        debug!("session reset");
    }

    /// 当前行棋方在 `index` 落子。非法落子返回错误且不改变状态。
    pub fn play(&mut self, index: usize) -> Result<GameResult, RuleError> {
        let player = self
            .state
            .current_player()
            .ok_or(RuleError::GameAlreadyOver)?;
        let result = apply_move(&mut self.board, index, player)?;
        self.state = match result {
            GameResult::InProgress => SessionState::turn_of(player.opponent()),
            GameResult::Win(winner) => SessionState::Won(winner),
            GameResult::Tie => SessionState::Tie,
        };
        Ok(result)
    }

    /// 若轮到电脑，则让电脑走一步。
    pub fn ai_turn<R: RandomSource>(
        &mut self,
        agent: &mut AiAgent<R>,
    ) -> Result<Option<AiDecision>, RuleError> {
        let Some(decision) = self.plan_ai(agent) else {
            return Ok(None);
        };
        self.commit_ai(&decision)?;
        Ok(Some(decision))
    }

    /// 轮到电脑时算出它的落子，但不改变棋盘。
    pub fn plan_ai<R: RandomSource>(&self, agent: &mut AiAgent<R>) -> Option<AiDecision> {
        if self.state.current_player() != Some(agent.player()) {
            return None;
        }
        agent.choose_move(&self.board)
    }

    /// 落下事先算好的电脑着法。
    pub fn commit_ai(&mut self, decision: &AiDecision) -> Result<GameResult, RuleError> {
        match self.state.current_player() {
            None => return Err(RuleError::GameAlreadyOver),
            Some(player) if player != decision.player => return Err(RuleError::NotPlayerTurn),
            Some(_) => {}
        }
        self.play(decision.index)
    }

    /// 玩家落子；对局未结束且轮到电脑时，电脑恰好应对一步。
    pub fn play_turn<R: RandomSource>(
        &mut self,
        index: usize,
        agent: &mut AiAgent<R>,
    ) -> Result<TurnReport, RuleError> {
        match self.state.current_player() {
            None => return Err(RuleError::GameAlreadyOver),
            Some(player) if player != self.human => return Err(RuleError::NotPlayerTurn),
            Some(_) => {}
        }
        self.play(index)?;
        let ai_move = self.ai_turn(agent)?;
        Ok(self.report(index, ai_move))
    }

    pub fn report(&self, human_move: usize, ai_move: Option<AiDecision>) -> TurnReport {
        TurnReport {
            human_move,
            ai_move,
            board: self.board,
            state: self.state,
            result: self.result(),
            status: self.status_text(),
        }
    }

    /// 页面上显示的状态文字。
    pub fn status_text(&self) -> String {
        match self.state {
            SessionState::Won(winner) => format!("{winner} wins!"),
            SessionState::Tie => "It's a tie!".to_string(),
            _ if self.board == Board::new() => format!("Your turn ({})", self.human),
            SessionState::XTurn => "X's turn".to_string(),
            SessionState::OTurn => "O's turn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiConfig, AiDifficulty, AiStrategy, ScriptedRandom};

    fn hard_agent() -> AiAgent<ScriptedRandom> {
        AiAgent::with_rng(
            AiConfig::from_difficulty(AiDifficulty::Hard),
            ScriptedRandom::new([0.5]),
        )
    }

    #[test]
    fn starts_with_x_to_move() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::XTurn);
        assert!(session.is_active());
        assert_eq!(session.status_text(), "Your turn (X)");
    }

    #[test]
    fn play_alternates_turns() {
        let mut session = Session::new();
        assert_eq!(session.play(0), Ok(GameResult::InProgress));
        assert_eq!(session.state(), SessionState::OTurn);
        assert_eq!(session.status_text(), "O's turn");
        assert_eq!(session.play(4), Ok(GameResult::InProgress));
        assert_eq!(session.state(), SessionState::XTurn);
    }

    #[test]
    fn occupied_cell_is_rejected_without_state_change() {
        let mut session = Session::new();
        session.play(4).expect("center is free");
        let before = session.clone();
        assert_eq!(session.play(4), Err(RuleError::CellOccupied { index: 4 }));
        assert_eq!(session.play(11), Err(RuleError::InvalidIndex { index: 11 }));
        assert_eq!(session, before);
    }

    #[test]
    fn win_is_absorbing() {
        let mut session = Session::new();
        for index in [0, 3, 1, 4] {
            session.play(index).expect("scripted move is legal");
        }
        assert_eq!(session.play(2), Ok(GameResult::Win(Player::X)));
        assert_eq!(session.state(), SessionState::Won(Player::X));
        assert_eq!(session.status_text(), "X wins!");
        assert_eq!(session.play(8), Err(RuleError::GameAlreadyOver));
        assert!(!session.is_active());
    }

    #[test]
    fn tie_is_absorbing() {
        let mut session = Session::new();
        // X O X / X O O / O X X
        for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            session.play(index).expect("scripted move is legal");
        }
        assert_eq!(session.state(), SessionState::Tie);
        assert_eq!(session.result(), GameResult::Tie);
        assert_eq!(session.status_text(), "It's a tie!");
    }

    #[test]
    fn play_turn_schedules_exactly_one_ai_move() {
        let mut session = Session::new();
        let mut agent = hard_agent();
        let report = session
            .play_turn(0, &mut agent)
            .expect("opening move is legal");
        let ai_move = report.ai_move.expect("ai should reply");
        assert_eq!(ai_move.strategy, AiStrategy::Minimax);
        assert_eq!(report.state, SessionState::XTurn);
        assert_eq!(session.board().empty_cells().len(), 7);
    }

    #[test]
    fn play_turn_skips_ai_when_human_wins() {
        let mut session = Session::new();
        for index in [0, 3, 1, 4] {
            session.play(index).expect("scripted move is legal");
        }
        let mut agent = hard_agent();
        let report = session.play_turn(2, &mut agent).expect("winning move is legal");
        assert!(report.ai_move.is_none());
        assert_eq!(report.result, GameResult::Win(Player::X));
        assert_eq!(
            session.play_turn(8, &mut agent),
            Err(RuleError::GameAlreadyOver)
        );
    }

    #[test]
    fn play_turn_rejects_move_during_ai_turn() {
        let mut session = Session::new();
        session.play(0).expect("opening move is legal");
        let mut agent = hard_agent();
        assert_eq!(
            session.play_turn(1, &mut agent),
            Err(RuleError::NotPlayerTurn)
        );
        let decision = session
            .ai_turn(&mut agent)
            .expect("ai move is legal")
            .expect("it is the ai's turn");
        assert_eq!(session.board().get(decision.index), Some(Player::O.to_cell()));
    }

    #[test]
    fn planned_ai_move_is_the_one_committed() {
        let mut session = Session::new();
        let mut agent = hard_agent();
        assert!(session.plan_ai(&mut agent).is_none(), "x moves first");

        session.play(0).expect("opening move is legal");
        let before = session.clone();
        let planned = session.plan_ai(&mut agent).expect("it is the ai's turn");
        assert_eq!(session, before, "planning must not touch the board");

        assert_eq!(session.commit_ai(&planned), Ok(GameResult::InProgress));
        assert_eq!(session.board().get(planned.index), Some(Player::O.to_cell()));
        assert_eq!(session.state(), SessionState::XTurn);
        assert_eq!(session.commit_ai(&planned), Err(RuleError::NotPlayerTurn));
    }

    #[test]
    fn commit_ai_after_game_over_is_rejected() {
        let mut agent = hard_agent();
        let mut other = Session::new();
        other.play(0).expect("opening move is legal");
        let decision = other.plan_ai(&mut agent).expect("it is the ai's turn");

        let mut session = Session::new();
        for index in [0, 3, 1, 4, 2] {
            session.play(index).expect("scripted move is legal");
        }
        assert!(session.plan_ai(&mut agent).is_none());
        assert_eq!(session.commit_ai(&decision), Err(RuleError::GameAlreadyOver));
    }

    #[test]
    fn hard_ai_never_loses_a_full_session() {
        // 玩家总是走第一个空格
        let mut session = Session::new();
        let mut agent = hard_agent();
        while session.is_active() {
            let index = session.board().empty_cells()[0];
            session.play_turn(index, &mut agent).expect("move is legal");
        }
        assert_ne!(session.state(), SessionState::Won(Player::X));
    }

    #[test]
    fn reset_starts_new_game() {
        let mut session = Session::new();
        session.play(4).expect("center is free");
        session.reset();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn report_serializes_for_the_page() {
        let mut session = Session::new();
        let mut agent = hard_agent();
        let report = session.play_turn(4, &mut agent).expect("center is free");
        let json = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(json["human_move"], 4);
        assert_eq!(json["state"]["type"], "XTurn");
        assert_eq!(json["board"][4], "X");
        assert_eq!(json["ai_move"]["strategy"], "minimax");
    }
}
