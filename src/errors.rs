//! 错误分类
//!
//! 单词级的 "未识别" 不是错误（见 `WordStatus::Unknown`），
//! 这里只收录输入非法、部署损坏、模型不存在这几类。

use std::path::PathBuf;

/// 校验器错误
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// 空词或归一化后为空
    #[error("invalid word: {word:?}")]
    InvalidWord { word: String },

    /// 配置位置上不存在词典文件
    #[error("lexicon not found: {}", path.display())]
    LexiconNotFound { path: PathBuf },

    /// 文件存在但不属于任何已知格式
    #[error("unrecognized lexicon format in {}: {reason}", path.display())]
    LexiconFormat { path: PathBuf, reason: String },

    /// 请求了未发现的模型
    #[error("model not found: {model_id}")]
    ModelNotFound { model_id: String },

    /// 注入的 G2P 规则表无法使用
    #[error("invalid G2P rule table: {reason}")]
    RuleTable { reason: String },

    /// 尚未选择任何模型
    #[error("no model selected")]
    NoModelSelected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 错误对应的调用方类别（传输层据此映射状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 调用方输入错误（4xx）
    InvalidInput,
    /// 请求的资源不存在（404）
    NotFound,
    /// 部署或配置损坏（5xx）
    Deployment,
}

impl ValidatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidatorError::InvalidWord { .. } => ErrorKind::InvalidInput,
            ValidatorError::ModelNotFound { .. } | ValidatorError::NoModelSelected => {
                ErrorKind::NotFound
            }
            ValidatorError::LexiconNotFound { .. }
            | ValidatorError::LexiconFormat { .. }
            | ValidatorError::RuleTable { .. }
            | ValidatorError::Io(_) => ErrorKind::Deployment,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ValidatorError::LexiconFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;
