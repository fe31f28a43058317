//! 基于模型的情感分类器
//!
//! 模型参数在进程内只加载一次（首次分类时触发），之后常驻内存。
//! 测试可以用 [`ModelClassifier::with_model`] 注入自有模型，不触碰全局状态。

pub mod linear;

pub use linear::LinearTextModel;

use crate::types::{SentimentLabel, SentimentResult};
use crate::SentimentClassifier;
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const EMBEDDED_MODEL: &str = include_str!("../../assets/finsent_linear.json");

static SHARED_MODEL: OnceCell<Arc<LinearTextModel>> = OnceCell::new();

/// 模型参数来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// 随 crate 一起编译的默认参数
    Embedded,
    /// JSON 参数文件
    File(PathBuf),
}

impl ModelSource {
    pub fn load(&self) -> SentimentResult<LinearTextModel> {
        match self {
            ModelSource::Embedded => LinearTextModel::from_json(EMBEDDED_MODEL),
            ModelSource::File(path) => LinearTextModel::from_file(path),
        }
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Embedded => write!(f, "embedded"),
            ModelSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 获取进程级共享模型，首次调用时加载
///
/// 单例只认第一次成功加载的来源；加载失败不会被缓存，下次调用会重试。
pub fn shared_model(source: &ModelSource) -> SentimentResult<Arc<LinearTextModel>> {
    SHARED_MODEL
        .get_or_try_init(|| {
            info!("Loading sentiment model ({source})...");
            let model = source.load()?;
            info!("✓ Sentiment model {} loaded ({} features)", model.name(), model.vocab_size());
            Ok(Arc::new(model))
        })
        .cloned()
}

enum ModelSlot {
    Shared(ModelSource),
    Owned(Arc<LinearTextModel>),
}

/// 模型分类器
pub struct ModelClassifier {
    slot: ModelSlot,
}

impl ModelClassifier {
    /// 使用进程级共享模型（懒加载）
    pub fn shared(source: ModelSource) -> Self {
        Self { slot: ModelSlot::Shared(source) }
    }

    /// 使用调用方持有的模型
    pub fn with_model(model: LinearTextModel) -> Self {
        Self { slot: ModelSlot::Owned(Arc::new(model)) }
    }

    fn model(&self) -> Option<Arc<LinearTextModel>> {
        match &self.slot {
            ModelSlot::Owned(model) => Some(Arc::clone(model)),
            ModelSlot::Shared(source) => match shared_model(source) {
                Ok(model) => Some(model),
                Err(e) => {
                    warn!("Failed to load sentiment model from {source}: {e}");
                    None
                }
            },
        }
    }
}

impl SentimentClassifier for ModelClassifier {
    fn name(&self) -> &'static str {
        "finbert"
    }

    fn classify(&self, text: &str) -> SentimentLabel {
        predict_or_neutral(self.model().as_deref(), text)
    }
}

/// 模型不可用时一律返回 neutral
fn predict_or_neutral(model: Option<&LinearTextModel>, text: &str) -> SentimentLabel {
    match model {
        Some(model) => model.predict(text),
        None => {
            warn!("Sentiment model not available, falling back to neutral");
            SentimentLabel::Neutral
        }
    }
}
