//! 词典层
//!
//! 加载当前模型的词表（词 → 发音集合），自动识别两种磁盘格式：
//! 1. SQLite 结构化词典（lexicon.db）
//! 2. 纯文本词典（lexicon.txt，Speech-to-Phrase 训练产物）
//!
//! 并根据规模和来源判定 "完整词典" 或 "受限词典"。

mod flat_text;
pub mod normalize;
mod store;
mod structured;
mod types;

pub use flat_text::FlatTextReport;
pub use normalize::{normalize_word, split_entity_name};
pub use store::{LexiconBuilder, LexiconStore};
pub use types::{
    LexiconEntry, LexiconFormat, LexiconKind, LexiconSource, LexiconStats, Pronunciation,
};
