//! G2P（字素 → 音素）发音预测
//!
//! 1. 规则表：语言相关的字素映射（内置 it/en，可注入 JSON）
//! 2. 预测器：最长匹配切分字素，按覆盖度给出置信度

mod predictor;
mod rules;

pub use predictor::{G2pPrediction, PhoneticPredictor, RuleBasedPredictor};
pub use rules::{GraphemeRule, RuleTable, FALLBACK_LANGUAGE};
