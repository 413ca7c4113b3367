//! 模型发现
//!
//! 模型的下载与缓存不在本 crate 内：这里只扫描本地目录，
//! 把 "模型 ID → 词典路径" 交给模型上下文。

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ValidatorResult;

/// 按优先级查找的词典文件名
pub const LEXICON_FILE_NAMES: [&str; 4] =
    ["lexicon.db", "lexicon.sqlite", "word_phonemes.db", "lexicon.txt"];

/// 可选的模型描述文件
const MANIFEST_FILE: &str = "model_info.json";

/// 模型信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    /// 如 `it_IT`
    pub language: String,
    /// 如 `it`，用于选择 G2P 规则表
    pub language_family: String,
    pub description: String,
    pub lexicon_path: PathBuf,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, lexicon_path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        let (language, language_family) = parse_model_language(&id);
        let description = format!("{} speech-to-phrase model", language);
        Self {
            id,
            language,
            language_family,
            description,
            lexicon_path: lexicon_path.into(),
        }
    }
}

/// 从模型 ID 解析语言
///
/// `it_IT-rhasspy` → (`it_IT`, `it`)；`english` → (`english`, `english`)
pub fn parse_model_language(model_id: &str) -> (String, String) {
    let language = model_id.split('-').next().unwrap_or(model_id).to_string();
    let family = language
        .split('_')
        .next()
        .unwrap_or(&language)
        .to_lowercase();
    (language, family)
}

/// 模型来源
pub trait ModelProvider: Send + Sync + fmt::Debug {
    /// 列出可用模型（按 ID 排序）
    fn discover(&self) -> ValidatorResult<Vec<ModelInfo>>;

    /// 按 ID 查找
    fn find(&self, model_id: &str) -> ValidatorResult<Option<ModelInfo>> {
        Ok(self.discover()?.into_iter().find(|m| m.id == model_id))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelManifest {
    #[serde(default)]
    description: Option<String>,
}

/// 目录扫描：`<root>/<model_id>/` 下含词典文件的子目录即为一个模型
#[derive(Debug, Clone)]
pub struct DirectoryModelProvider {
    root: PathBuf,
}

impl DirectoryModelProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 查找模型目录内的词典文件（直接放置或位于 `model/phones/`）
    pub fn find_lexicon(model_dir: &Path) -> Option<PathBuf> {
        let phones_dir = model_dir.join("model").join("phones");
        for dir in [model_dir, phones_dir.as_path()] {
            for name in LEXICON_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn read_manifest(model_dir: &Path) -> Option<ModelManifest> {
        let path = model_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!("忽略无法解析的模型描述 {:?}: {}", path, e);
                None
            }
        }
    }
}

impl ModelProvider for DirectoryModelProvider {
    fn discover(&self) -> ValidatorResult<Vec<ModelInfo>> {
        if !self.root.is_dir() {
            tracing::warn!("模型目录不存在: {:?}", self.root);
            return Ok(Vec::new());
        }

        let mut models = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let model_dir = entry.path();
            if !model_dir.is_dir() {
                continue;
            }
            let Some(model_id) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("跳过非 UTF-8 模型目录: {:?}", model_dir);
                continue;
            };
            let Some(lexicon_path) = Self::find_lexicon(&model_dir) else {
                tracing::debug!("目录 {:?} 中没有词典文件，跳过", model_dir);
                continue;
            };

            let mut info = ModelInfo::new(model_id, lexicon_path);
            if let Some(description) = Self::read_manifest(&model_dir).and_then(|m| m.description) {
                info.description = description;
            }
            tracing::info!("发现模型: {} ({:?})", info.id, info.lexicon_path);
            models.push(info);
        }

        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}

/// 固定模型列表（测试与嵌入方使用）
#[derive(Debug, Clone, Default)]
pub struct StaticModelProvider {
    models: Vec<ModelInfo>,
}

impl StaticModelProvider {
    pub fn new(mut models: Vec<ModelInfo>) -> Self {
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Self { models }
    }
}

impl ModelProvider for StaticModelProvider {
    fn discover(&self) -> ValidatorResult<Vec<ModelInfo>> {
        Ok(self.models.clone())
    }
}
