//! 模型管理
//!
//! 1. 发现：扫描模型目录（或使用固定列表）
//! 2. 上下文：持有当前模型快照，原子切换

mod context;
mod discovery;

pub use context::{ActiveModel, ContextSettings, ModelContext, ModelSelection, ModelSummary};
pub use discovery::{
    parse_model_language, DirectoryModelProvider, ModelInfo, ModelProvider, StaticModelProvider,
    LEXICON_FILE_NAMES,
};
