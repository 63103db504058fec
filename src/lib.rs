pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    best_move, choose_move, evaluate_move, AiAgent, AiConfig, AiDecision, AiDifficulty,
    AiStrategy, NeuralError, NeuralPredictor, RandomSource, ScriptedRandom,
};
pub use game::{
    apply_move, new_game, terminal_state, Board, Cell, GameResult, Player, RuleError, Session,
    SessionState, TurnReport,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    if let Err(error) = utils::init_logging(tracing::Level::INFO) {
        web_sys::console::warn_1(&JsValue::from_str(&error.to_string()));
    }
}

/// 调整控制台日志级别（`trace`/`debug`/`info`/`warn`/`error`），只有第一次调用生效。
/// 返回实际生效的级别；日志未能安装时抛出错误。
#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(level: Option<String>) -> Result<String, JsValue> {
    utils::init_logging(utils::parse_level(level.as_deref()))
        .map(|level| level.to_string())
        .map_err(serde_to_js_error)
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_difficulty(difficulty: Option<&str>) -> AiDifficulty {
    difficulty
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or_default()
}

fn parse_player(player: Option<&str>, fallback: Player) -> Player {
    player
        .and_then(|value| Player::from_str(value).ok())
        .unwrap_or(fallback)
}

fn make_agent(config: AiConfig, seed: Option<u64>) -> AiAgent {
    match seed {
        Some(seed) => AiAgent::with_seed(config, seed),
        None => AiAgent::new(config),
    }
}

#[derive(Serialize)]
struct EngineSnapshot<'a> {
    session: &'a Session,
    config: &'a AiConfig,
    result: GameResult,
    status: String,
    neural: bool,
}

/// 前端持有的一局对局：会话、电脑玩家及其配置。
#[wasm_bindgen]
pub struct TicTacToeEngine {
    session: Session,
    agent: AiAgent,
    neural_loaded: bool,
    // think_ai 算好、尚未落下的电脑着法，以及当时的棋盘
    pending: Option<(Board, AiDecision)>,
}

#[wasm_bindgen]
impl TicTacToeEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: Option<String>, seed: Option<u64>) -> TicTacToeEngine {
        let config = AiConfig::from_difficulty(parse_difficulty(difficulty.as_deref()));
        TicTacToeEngine {
            session: Session::new(),
            agent: make_agent(config, seed),
            neural_loaded: false,
            pending: None,
        }
    }

    /// 用 JSON 配置创建，未给出的字段使用默认值。
    pub fn with_config_json(config_json: &str, seed: Option<u64>) -> Result<TicTacToeEngine, JsValue> {
        let config = AiConfig::from_json(config_json).map_err(serde_to_js_error)?;
        Ok(TicTacToeEngine {
            session: Session::new(),
            agent: make_agent(config, seed),
            neural_loaded: false,
            pending: None,
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let snapshot = EngineSnapshot {
            session: &self.session,
            config: self.agent.config(),
            result: self.session.result(),
            status: self.session.status_text(),
            neural: self.neural_loaded,
        };
        serde_json::to_string(&snapshot).map_err(serde_to_js_error)
    }

    pub fn board(&self) -> Result<JsValue, JsValue> {
        to_value(self.session.board()).map_err(JsValue::from)
    }

    pub fn status_text(&self) -> String {
        self.session.status_text()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn think_delay_ms(&self) -> u32 {
        self.agent.config().think_delay_ms
    }

    /// 玩家落子，随后电脑立即应对一步。
    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let report = self
            .session
            .play_turn(index, &mut self.agent)
            .map_err(to_js_error)?;
        serde_json::to_string(&report).map_err(serde_to_js_error)
    }

    /// 只落玩家这一步，电脑的应对交给 `ai_move`（配合前端的思考延迟）。
    pub fn play_single(&mut self, index: usize) -> Result<String, JsValue> {
        if self.session.state().current_player() != Some(self.session.human()) {
            let error = if self.session.is_active() {
                RuleError::NotPlayerTurn
            } else {
                RuleError::GameAlreadyOver
            };
            return Err(to_js_error(error));
        }
        self.session.play(index).map_err(to_js_error)?;
        serde_json::to_string(&self.session.report(index, None)).map_err(serde_to_js_error)
    }

    /// 电脑落子。若 `think_ai` 已在当前棋盘上算好着法，则落下那一步。
    pub fn ai_move(&mut self) -> Result<String, JsValue> {
        let decision = match self.pending.take() {
            Some((planned_on, decision)) if planned_on == *self.session.board() => {
                self.session.commit_ai(&decision).map_err(to_js_error)?;
                Some(decision)
            }
            _ => self
                .session
                .ai_turn(&mut self.agent)
                .map_err(to_js_error)?,
        };
        serde_json::to_string(&decision).map_err(serde_to_js_error)
    }

    /// 立即算好电脑落子，延迟 `delay_ms`（默认取配置）后交给页面；
    /// 随后的 `ai_move` 落下的就是这一步。不修改当前对局。
    pub fn think_ai(&mut self, delay_ms: Option<u32>) -> Promise {
        let decision = self.plan_ai_move();
        let delay = delay_ms.unwrap_or(self.agent.config().think_delay_ms);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.pending = None;
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let difficulty = AiDifficulty::from_str(difficulty)
            .map_err(|_| JsValue::from_str(&format!("unknown difficulty '{difficulty}'")))?;
        self.agent.set_difficulty(difficulty);
        self.pending = None;
        Ok(())
    }

    /// 加载神经网络权重，之后电脑改用网络落子。
    pub fn load_neural_json(&mut self, network_json: &str) -> Result<(), JsValue> {
        let predictor = NeuralPredictor::from_json(network_json).map_err(serde_to_js_error)?;
        self.agent.set_neural(Some(predictor));
        self.neural_loaded = true;
        self.pending = None;
        Ok(())
    }

    pub fn clear_neural(&mut self) {
        self.agent.set_neural(None);
        self.neural_loaded = false;
        self.pending = None;
    }
}

impl TicTacToeEngine {
    /// 同一棋盘上重复调用返回同一着法。
    fn plan_ai_move(&mut self) -> Option<AiDecision> {
        let board = *self.session.board();
        if let Some((planned_on, decision)) = &self.pending {
            if *planned_on == board {
                return Some(decision.clone());
            }
        }
        let decision = self.session.plan_ai(&mut self.agent);
        self.pending = decision.clone().map(|decision| (board, decision));
        decision
    }
}

#[wasm_bindgen(js_name = "newGame")]
pub fn new_game_js() -> Result<JsValue, JsValue> {
    to_value(&new_game()).map_err(JsValue::from)
}

/// 在传入的棋盘上落子，返回 `{ board, result }`。
#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move_js(board: JsValue, index: usize, player: String) -> Result<JsValue, JsValue> {
    #[derive(Serialize)]
    struct Applied {
        board: Board,
        result: GameResult,
    }

    let mut board: Board = from_value(board).map_err(JsValue::from)?;
    let player = Player::from_str(&player)
        .map_err(|_| JsValue::from_str(&format!("unknown player '{player}'")))?;
    let result = apply_move(&mut board, index, player).map_err(to_js_error)?;
    to_value(&Applied { board, result }).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "terminalState")]
pub fn terminal_state_js(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&terminal_state(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "evaluateMove")]
pub fn evaluate_move_js(board: JsValue, index: usize, player: Option<String>) -> Result<i32, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let player = parse_player(player.as_deref(), Player::O);
    evaluate_move(&board, index, player).map_err(to_js_error)
}

/// 极小极大最优落点；棋盘已满时返回 `undefined`。
#[wasm_bindgen(js_name = "bestMove")]
pub fn best_move_js(board: JsValue, player: Option<String>) -> Result<Option<usize>, JsValue> {
    let mut board: Board = from_value(board).map_err(JsValue::from)?;
    let player = parse_player(player.as_deref(), Player::O);
    Ok(best_move(&mut board, player))
}

#[wasm_bindgen(js_name = "chooseMove")]
pub fn choose_move_js(
    board: JsValue,
    difficulty: Option<String>,
    seed: Option<u64>,
) -> Result<Option<usize>, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    if board.terminal_state().is_terminal() {
        return Err(to_js_error(RuleError::GameAlreadyOver));
    }
    let difficulty = parse_difficulty(difficulty.as_deref());
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    Ok(choose_move(&board, difficulty, Player::O, &mut rng))
}
