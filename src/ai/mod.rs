//! AI 算法模块（极小极大搜索、启发式评分、神经网络与难度策略）。

pub mod heuristic;
pub mod minimax;
pub mod neural;
pub mod policy;
pub mod random;

pub use heuristic::evaluate_move;
pub use minimax::{best_move, search, SearchResult};
pub use neural::{Activation, DenseLayer, NeuralError, NeuralPredictor};
pub use policy::{choose_move, AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy};
pub use random::{RandomSource, ScriptedRandom};
