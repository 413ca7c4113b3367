//! Speech-to-Phrase 识别预测
//!
//! 判断单词 / Home Assistant 实体名能否被固定语法的语音识别词典识别，
//! 未命中时给出估计发音、置信度和相似词。

mod cli;
pub mod config;
pub mod errors;
pub mod g2p;
pub mod lexicon;
pub mod model;
pub mod suggest;
pub mod validator;

pub use cli::run;
pub use config::ValidatorConfig;
pub use errors::{ErrorKind, ValidatorError, ValidatorResult};
pub use model::{ModelContext, ModelInfo, ModelProvider};
pub use suggest::{SimilaritySuggester, Suggestion};
pub use validator::{
    BatchVerdict, ConfidenceTier, EntityVerdict, ValidationConfig, Validator, WordStatus,
    WordVerdict,
};
