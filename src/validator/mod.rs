//! 识别预测（校验编排层）
//!
//! ## 单词流程
//! 1. 归一化（空 → error）
//! 2. 词典查询（命中 → known）
//! 3. G2P 预测（置信度达标 → guessed）
//! 4. 相似词推荐（未命中时总是执行）
//! 5. 以上都不成立 → unknown
//!
//! 实体按分隔符拆词后逐词校验再汇总；批量校验基于同一模型快照并行执行。

mod engine;
pub mod entity;
mod types;

pub use engine::{ValidationConfig, Validator};
pub use types::{BatchVerdict, ConfidenceTier, EntityVerdict, WordStatus, WordVerdict};
