//! 神经网络对手：只做推理的前馈网络，权重以 JSON 形式由前端提供。
//!
//! 输入为 9 维向量（己方 +1，对方 -1，空 0），输出 9 个分数，
//! 屏蔽已占用的格子后取最高分。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::game::{Board, Cell, Player, CELL_COUNT};

#[derive(Debug, Error)]
pub enum NeuralError {
    #[error("network has no layers")]
    EmptyNetwork,
    #[error("first layer expects {got} inputs, board encoding has {expected}")]
    InputWidth { expected: usize, got: usize },
    #[error("layer {layer}: {detail}")]
    ShapeMismatch { layer: usize, detail: String },
    #[error("last layer produces {got} outputs, expected {expected}")]
    OutputWidth { expected: usize, got: usize },
    #[error("failed to parse network: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    #[default]
    Linear,
}

impl Activation {
    fn apply(self, value: f64) -> f64 {
        match self {
            Activation::Relu => value.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-value).exp()),
            Activation::Tanh => value.tanh(),
            Activation::Linear => value,
        }
    }
}

/// 全连接层，`weights[o][i]` 为第 `i` 个输入到第 `o` 个输出的权重。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                let sum: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                self.activation.apply(sum + bias)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeuralPredictor {
    layers: Vec<DenseLayer>,
}

impl NeuralPredictor {
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, NeuralError> {
        let predictor = Self { layers };
        predictor.validate()?;
        Ok(predictor)
    }

    pub fn from_json(json: &str) -> Result<Self, NeuralError> {
        let predictor: NeuralPredictor = serde_json::from_str(json)?;
        predictor.validate()?;
        Ok(predictor)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    fn validate(&self) -> Result<(), NeuralError> {
        let first = self.layers.first().ok_or(NeuralError::EmptyNetwork)?;
        if first.inputs() != CELL_COUNT {
            return Err(NeuralError::InputWidth {
                expected: CELL_COUNT,
                got: first.inputs(),
            });
        }

        let mut width = CELL_COUNT;
        for (layer_index, layer) in self.layers.iter().enumerate() {
            if layer.outputs() == 0 {
                return Err(NeuralError::ShapeMismatch {
                    layer: layer_index,
                    detail: "layer has no outputs".into(),
                });
            }
            if let Some(row) = layer.weights.iter().position(|row| row.len() != width) {
                return Err(NeuralError::ShapeMismatch {
                    layer: layer_index,
                    detail: format!(
                        "weight row {row} has {} entries, expected {width}",
                        layer.weights[row].len()
                    ),
                });
            }
            if layer.biases.len() != layer.outputs() {
                return Err(NeuralError::ShapeMismatch {
                    layer: layer_index,
                    detail: format!(
                        "{} biases for {} outputs",
                        layer.biases.len(),
                        layer.outputs()
                    ),
                });
            }
            width = layer.outputs();
        }

        if width != CELL_COUNT {
            return Err(NeuralError::OutputWidth {
                expected: CELL_COUNT,
                got: width,
            });
        }
        Ok(())
    }

    pub fn encode(board: &Board, ai: Player) -> [f64; CELL_COUNT] {
        let own = ai.to_cell();
        let mut input = [0.0; CELL_COUNT];
        for (slot, cell) in input.iter_mut().zip(board.cells()) {
            *slot = match *cell {
                Cell::Empty => 0.0,
                cell if cell == own => 1.0,
                _ => -1.0,
            };
        }
        input
    }

    /// 每个格子的原始输出分数。
    pub fn scores(&self, board: &Board, ai: Player) -> Vec<f64> {
        self.layers
            .iter()
            .fold(Self::encode(board, ai).to_vec(), |activations, layer| {
                layer.forward(&activations)
            })
    }

    /// 在空格中取分数最高者，平分时取较小下标。
    pub fn predict(&self, board: &Board, ai: Player) -> Option<(usize, f64)> {
        let scores = self.scores(board, ai);
        let mut best: Option<(usize, f64)> = None;
        for index in board.empty_cells() {
            let score = scores[index];
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }
        if let Some((index, score)) = best {
            debug!(index, score, %ai, "neural prediction");
        }
        best
    }
}
