//! 核心类型定义

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type SentimentResult<T> = Result<T, SentimentError>;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("模型文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("模型文件解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的模型: {0}")]
    InvalidModel(String),

    #[error("数据维度不匹配: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// 情感标签
///
/// 聚合优先级：bullish > neutral > bearish，`NotAvailable` 不参与排序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "bullish")]
    Bullish,
    #[serde(rename = "bearish")]
    Bearish,
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl SentimentLabel {
    pub const NOT_AVAILABLE: &'static str = "N/A";

    /// 聚合排序值，`NotAvailable` 没有排序值
    pub fn rank(&self) -> Option<u8> {
        match self {
            SentimentLabel::Bullish => Some(2),
            SentimentLabel::Neutral => Some(1),
            SentimentLabel::Bearish => Some(0),
            SentimentLabel::NotAvailable => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bullish => "bullish",
            SentimentLabel::Bearish => "bearish",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::NotAvailable => Self::NOT_AVAILABLE,
        }
    }

    /// 模型输出类别名 → 标签（positive / negative / neutral）
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "positive" | "bullish" => Some(SentimentLabel::Bullish),
            "negative" | "bearish" => Some(SentimentLabel::Bearish),
            "neutral" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
