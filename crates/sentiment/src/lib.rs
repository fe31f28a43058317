//! # Sentiment
//!
//! 新闻文本情感分类，以及供应商维度的情感聚合
//!
//! ## 主要模块
//!
//! - `types`: 情感标签与错误类型
//! - `preprocessing`: 分词与 n-gram 特征
//! - `lexicon`: 基于词典的分类器（VADER 风格）
//! - `models`: 基于模型的分类器（线性 softmax，进程级懒加载）
//! - `aggregator`: 多篇文章情感 → 单一供应商情感

pub mod aggregator;
pub mod lexicon;
pub mod models;
pub mod preprocessing;
pub mod types;

pub use aggregator::aggregate;
pub use lexicon::LexiconClassifier;
pub use models::{LinearTextModel, ModelClassifier, ModelSource};
pub use types::{SentimentError, SentimentLabel, SentimentResult};

/// 文本情感分类器
///
/// 实现只返回 bullish / bearish / neutral，`N/A` 由调用方在分类前处理。
pub trait SentimentClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, text: &str) -> SentimentLabel;
}

/// 对文本打分；空文本或 `N/A` 占位符直接返回 `N/A`，不调用分类器
pub fn score_text(classifier: &dyn SentimentClassifier, text: &str) -> SentimentLabel {
    let text = text.trim();
    if text.is_empty() || text == SentimentLabel::NOT_AVAILABLE {
        return SentimentLabel::NotAvailable;
    }
    classifier.classify(text)
}
