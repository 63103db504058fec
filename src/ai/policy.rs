use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::heuristic::{score_empty_cells, BLOCK_SCORE};
use super::minimax;
use super::neural::NeuralPredictor;
use super::random::RandomSource;
use crate::game::{Board, Player};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

/// 决策所用的策略，随结果一起返回给前端展示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Minimax,
    Heuristic,
    Random,
    Neural,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    /// 中等难度直接随机落子的概率。
    pub random_move_chance: f64,
    /// 简单难度发现致胜/封堵点时采纳它的概率。
    pub strategic_chance: f64,
    /// 简单难度视为“明显好棋”的评分下限。
    pub strategic_threshold: i32,
    /// 前端思考延迟，仅影响展示节奏。
    pub think_delay_ms: u32,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        Self {
            difficulty,
            random_move_chance: 0.3,
            strategic_chance: 0.3,
            strategic_threshold: BLOCK_SCORE,
            think_delay_ms: 500,
        }
    }

    /// 未给出的字段沿用默认值。
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_difficulty(mut self, difficulty: AiDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Medium)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiDecision {
    pub index: usize,
    pub player: Player,
    pub difficulty: AiDifficulty,
    pub strategy: AiStrategy,
    /// 极小极大值、启发式分数或网络输出，随机落子时为 `None`。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<f64>,
    pub nodes: u64,
}

impl AiDecision {
    fn new(index: usize, player: Player, difficulty: AiDifficulty, strategy: AiStrategy) -> Self {
        Self {
            index,
            player,
            difficulty,
            strategy,
            evaluation: None,
            nodes: 0,
        }
    }

    fn with_evaluation(mut self, evaluation: f64) -> Self {
        self.evaluation = Some(evaluation);
        self
    }
}

/// 按难度选择落点。棋盘没有空格时返回 `None`。
pub fn choose_move<R: RandomSource>(
    board: &Board,
    difficulty: AiDifficulty,
    ai: Player,
    rng: &mut R,
) -> Option<usize> {
    let config = AiConfig::from_difficulty(difficulty);
    decide(board, &config, ai, rng).map(|decision| decision.index)
}

fn decide<R: RandomSource>(
    board: &Board,
    config: &AiConfig,
    ai: Player,
    rng: &mut R,
) -> Option<AiDecision> {
    let difficulty = config.difficulty;
    match difficulty {
        AiDifficulty::Hard => {
            let mut scratch = *board;
            let result = minimax::search(&mut scratch, ai)?;
            let mut decision = AiDecision::new(result.index, ai, difficulty, AiStrategy::Minimax)
                .with_evaluation(f64::from(result.score));
            decision.nodes = result.nodes;
            Some(decision)
        }
        AiDifficulty::Medium => {
            let roll = rng.next_unit();
            let mut scored = score_empty_cells(board, ai);
            // 稳定排序：同分保持扫描顺序
            scored.sort_by(|a, b| b.1.cmp(&a.1));

            if roll < config.random_move_chance {
                let empty = board.empty_cells();
                let index = rng.pick(&empty)?;
                Some(AiDecision::new(index, ai, difficulty, AiStrategy::Random))
            } else {
                let (index, score) = *scored.first()?;
                Some(
                    AiDecision::new(index, ai, difficulty, AiStrategy::Heuristic)
                        .with_evaluation(f64::from(score)),
                )
            }
        }
        AiDifficulty::Easy => {
            let strategic = score_empty_cells(board, ai)
                .into_iter()
                .find(|(_, score)| *score >= config.strategic_threshold);

            if let Some((index, score)) = strategic {
                if rng.next_unit() < config.strategic_chance {
                    return Some(
                        AiDecision::new(index, ai, difficulty, AiStrategy::Heuristic)
                            .with_evaluation(f64::from(score)),
                    );
                }
            }

            let empty = board.empty_cells();
            let index = rng.pick(&empty)?;
            Some(AiDecision::new(index, ai, difficulty, AiStrategy::Random))
        }
    }
}

/// 电脑玩家：持有配置、随机源以及可选的神经网络。
pub struct AiAgent<R = SmallRng> {
    config: AiConfig,
    player: Player,
    rng: R,
    neural: Option<NeuralPredictor>,
}

impl AiAgent<SmallRng> {
    pub fn new(config: AiConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: RandomSource> AiAgent<R> {
    pub fn with_rng(config: AiConfig, rng: R) -> Self {
        Self {
            config,
            player: Player::O,
            rng,
            neural: None,
        }
    }

    pub fn playing(mut self, player: Player) -> Self {
        self.player = player;
        self
    }

    pub fn with_neural(mut self, predictor: NeuralPredictor) -> Self {
        self.neural = Some(predictor);
        self
    }

    pub fn set_neural(&mut self, predictor: Option<NeuralPredictor>) {
        self.neural = predictor;
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn set_difficulty(&mut self, difficulty: AiDifficulty) {
        self.config.difficulty = difficulty;
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub fn choose_move(&mut self, board: &Board) -> Option<AiDecision> {
        if let Some(neural) = &self.neural {
            if let Some((index, score)) = neural.predict(board, self.player) {
                debug!(index, "ai move from neural predictor");
                return Some(
                    AiDecision::new(index, self.player, self.config.difficulty, AiStrategy::Neural)
                        .with_evaluation(score),
                );
            }
        }

        let decision = decide(board, &self.config, self.player, &mut self.rng)?;
        debug!(
            index = decision.index,
            difficulty = ?decision.difficulty,
            strategy = ?decision.strategy,
            "ai move chosen"
        );
        Some(decision)
    }
}
