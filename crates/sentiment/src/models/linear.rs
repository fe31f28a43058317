//! 线性 softmax 文本分类模型

use crate::preprocessing::ngram_counts;
use crate::types::{SentimentError, SentimentLabel, SentimentResult};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const DEFAULT_MAX_TOKENS: usize = 512;

/// 模型文件格式（JSON）
///
/// `features` 中每个 n-gram 对应一行权重，顺序与 `labels` 一致。
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    name: Option<String>,
    labels: Vec<String>,
    bias: Vec<f64>,
    #[serde(default)]
    max_tokens: Option<usize>,
    features: BTreeMap<String, Vec<f64>>,
}

/// 线性文本模型：logits = W · x + b
#[derive(Debug, Clone)]
pub struct LinearTextModel {
    name: String,
    labels: Vec<SentimentLabel>,
    vocab: HashMap<String, usize>,
    /// (类别数, 词表大小)
    weights: Array2<f64>,
    bias: Array1<f64>,
    max_tokens: usize,
}

impl LinearTextModel {
    pub fn from_json(raw: &str) -> SentimentResult<Self> {
        let file: ModelFile = serde_json::from_str(raw)?;
        Self::from_model_file(file)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SentimentResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn from_model_file(file: ModelFile) -> SentimentResult<Self> {
        let labels = file
            .labels
            .iter()
            .map(|name| {
                SentimentLabel::from_class_name(name)
                    .ok_or_else(|| SentimentError::InvalidModel(format!("未知类别: {name}")))
            })
            .collect::<SentimentResult<Vec<_>>>()?;

        let n_classes = labels.len();
        if n_classes == 0 {
            return Err(SentimentError::InvalidModel("类别为空".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(SentimentError::InvalidModel(format!("重复类别: {label}")));
            }
        }
        if file.bias.len() != n_classes {
            return Err(SentimentError::DimensionMismatch {
                expected: n_classes,
                actual: file.bias.len(),
            });
        }

        let mut vocab = HashMap::with_capacity(file.features.len());
        let mut weights = Array2::<f64>::zeros((n_classes, file.features.len()));
        for (column, (feature, row)) in file.features.into_iter().enumerate() {
            if row.len() != n_classes {
                return Err(SentimentError::DimensionMismatch {
                    expected: n_classes,
                    actual: row.len(),
                });
            }
            for (class, weight) in row.into_iter().enumerate() {
                weights[[class, column]] = weight;
            }
            vocab.insert(feature, column);
        }

        Ok(Self {
            name: file.name.unwrap_or_else(|| "linear".to_string()),
            labels,
            vocab,
            weights,
            bias: Array1::from(file.bias),
            max_tokens: file.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// 词表内 n-gram 计数，L2 归一化
    fn featurize(&self, text: &str) -> Array1<f64> {
        let mut x = Array1::<f64>::zeros(self.vocab.len());
        for (feature, count) in ngram_counts(text, self.max_tokens) {
            if let Some(&column) = self.vocab.get(&feature) {
                x[column] = count;
            }
        }

        let norm = x.dot(&x).sqrt();
        if norm > 0.0 {
            x /= norm;
        }
        x
    }

    /// 各类别 softmax 概率，顺序与模型文件中的类别一致
    pub fn scores(&self, text: &str) -> Vec<(SentimentLabel, f64)> {
        let logits = self.weights.dot(&self.featurize(text)) + &self.bias;

        let max = logits.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let exp = logits.mapv(|v| (v - max).exp());
        let total = exp.sum();

        self.labels.iter().copied().zip(exp.iter().map(|v| v / total)).collect()
    }

    /// 概率最高的类别；并列时取模型文件中靠前的类别
    pub fn predict(&self, text: &str) -> SentimentLabel {
        let scores = self.scores(text);
        tracing::debug!(
            "model scores - {}",
            scores
                .iter()
                .map(|(label, p)| format!("{label}: {p:.3}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut best = scores[0];
        for &candidate in &scores[1..] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_MODEL: &str = r#"{
        "labels": ["positive", "negative", "neutral"],
        "bias": [0.0, 0.0, 0.5],
        "features": {
            "beat": [2.0, -1.0, -1.0],
            "miss": [-1.0, 2.0, -1.0],
            "raises guidance": [3.0, -1.0, -1.0]
        }
    }"#;

    #[test]
    fn test_predict() {
        let model = LinearTextModel::from_json(TINY_MODEL).unwrap();
        assert_eq!(model.vocab_size(), 3);
        assert_eq!(model.predict("Vendor results beat expectations"), SentimentLabel::Bullish);
        assert_eq!(model.predict("Vendor results miss expectations"), SentimentLabel::Bearish);
        assert_eq!(model.predict("Vendor holds annual meeting"), SentimentLabel::Neutral);
        assert_eq!(model.predict("Company raises guidance"), SentimentLabel::Bullish);
    }

    #[test]
    fn test_scores_sum_to_one() {
        let model = LinearTextModel::from_json(TINY_MODEL).unwrap();
        let scores = model.scores("beat and miss");
        let total: f64 = scores.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(scores[0].0, SentimentLabel::Bullish);
    }

    #[test]
    fn test_tie_prefers_first_label() {
        let raw = r#"{"labels":["positive","negative","neutral"],"bias":[0.0,0.0,0.0],"features":{}}"#;
        let model = LinearTextModel::from_json(raw).unwrap();
        assert_eq!(model.predict("anything"), SentimentLabel::Bullish);
    }

    #[test]
    fn test_dimension_mismatch() {
        let raw = r#"{"labels":["positive","negative","neutral"],"bias":[0.0,0.0],"features":{}}"#;
        assert!(matches!(
            LinearTextModel::from_json(raw),
            Err(SentimentError::DimensionMismatch { expected: 3, actual: 2 })
        ));

        let raw = r#"{"labels":["positive","negative","neutral"],"bias":[0,0,0],"features":{"up":[1.0]}}"#;
        assert!(matches!(
            LinearTextModel::from_json(raw),
            Err(SentimentError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_invalid_labels() {
        let raw = r#"{"labels":["positive","mixed"],"bias":[0,0],"features":{}}"#;
        assert!(matches!(LinearTextModel::from_json(raw), Err(SentimentError::InvalidModel(_))));

        let raw = r#"{"labels":["positive","positive"],"bias":[0,0],"features":{}}"#;
        assert!(matches!(LinearTextModel::from_json(raw), Err(SentimentError::InvalidModel(_))));
    }
}
