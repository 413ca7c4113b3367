//! 模型上下文
//!
//! 进程内唯一的可变状态：当前激活的模型（词典 + 预测器）。
//! 切换时先在锁外完整加载新模型，再一次性替换 `Arc`，
//! 正在进行的校验持有旧快照，不会看到新旧混合的词典。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;

use super::discovery::{ModelInfo, ModelProvider};
use crate::errors::{ValidatorError, ValidatorResult};
use crate::g2p::{PhoneticPredictor, RuleBasedPredictor, RuleTable};
use crate::lexicon::{LexiconStats, LexiconStore};

/// 已加载的模型快照（不可变）
#[derive(Debug)]
pub struct ActiveModel {
    pub info: ModelInfo,
    pub lexicon: LexiconStore,
    pub predictor: Arc<dyn PhoneticPredictor>,
}

/// 模型加载参数
#[derive(Debug, Clone)]
pub struct ContextSettings {
    /// 低于该词数的纯文本词典视为受限词典
    pub constrained_size_threshold: usize,
    /// 语言族 → 自定义 G2P 规则表路径
    pub g2p_rules: HashMap<String, PathBuf>,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            constrained_size_threshold: 500,
            g2p_rules: HashMap::new(),
        }
    }
}

/// 模型选择结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSelection {
    pub model: ModelInfo,
    pub stats: LexiconStats,
    /// 是否发生了切换（重复选择同一模型为 false）
    pub changed: bool,
}

/// 模型列表项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    #[serde(flatten)]
    pub info: ModelInfo,
    pub is_current: bool,
}

/// 模型上下文
#[derive(Debug)]
pub struct ModelContext {
    provider: Box<dyn ModelProvider>,
    settings: ContextSettings,
    active: RwLock<Option<Arc<ActiveModel>>>,
    /// 串行化选择/重载，避免并发加载同一模型
    select_lock: Mutex<()>,
}

impl ModelContext {
    pub fn new(provider: impl ModelProvider + 'static, settings: ContextSettings) -> Self {
        Self {
            provider: Box::new(provider),
            settings,
            active: RwLock::new(None),
            select_lock: Mutex::new(()),
        }
    }

    /// 当前模型快照
    pub fn active(&self) -> Option<Arc<ActiveModel>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_model_id(&self) -> Option<String> {
        self.active().map(|m| m.info.id.clone())
    }

    /// 当前词典统计
    pub fn stats(&self) -> ValidatorResult<LexiconStats> {
        self.active()
            .map(|m| m.lexicon.stats().clone())
            .ok_or(ValidatorError::NoModelSelected)
    }

    /// 列出可用模型并标记当前模型
    pub fn list_models(&self) -> ValidatorResult<Vec<ModelSummary>> {
        let current = self.current_model_id();
        Ok(self
            .provider
            .discover()?
            .into_iter()
            .map(|info| ModelSummary {
                is_current: current.as_deref() == Some(info.id.as_str()),
                info,
            })
            .collect())
    }

    /// 选择模型
    ///
    /// 未知 ID 或加载失败时保持原模型不变
    pub fn select(&self, model_id: &str) -> ValidatorResult<ModelSelection> {
        let _guard = self
            .select_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = self.active() {
            if current.info.id == model_id {
                tracing::debug!("模型 {} 已激活，跳过加载", model_id);
                return Ok(ModelSelection {
                    model: current.info.clone(),
                    stats: current.lexicon.stats().clone(),
                    changed: false,
                });
            }
        }

        let info = self
            .provider
            .find(model_id)?
            .ok_or_else(|| ValidatorError::ModelNotFound {
                model_id: model_id.to_string(),
            })?;

        let model = self.load_model(info).map_err(|e| {
            tracing::error!("加载模型 {} 失败，保留当前模型: {}", model_id, e);
            e
        })?;
        Ok(self.swap(model))
    }

    /// 选择默认模型：指定 ID 优先，否则取第一个发现的模型
    pub fn select_default(&self, preferred: Option<&str>) -> ValidatorResult<ModelSelection> {
        if let Some(model_id) = preferred {
            return self.select(model_id);
        }
        let first = self
            .provider
            .discover()?
            .into_iter()
            .next()
            .ok_or_else(|| ValidatorError::ModelNotFound {
                model_id: "<default>".to_string(),
            })?;
        self.select(&first.id)
    }

    /// 重新加载当前模型的词典（同样整体替换）
    pub fn reload(&self) -> ValidatorResult<ModelSelection> {
        let _guard = self
            .select_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.active().ok_or(ValidatorError::NoModelSelected)?;
        let model = self.load_model(current.info.clone()).map_err(|e| {
            tracing::error!("重新加载模型 {} 失败，保留原词典: {}", current.info.id, e);
            e
        })?;
        Ok(self.swap(model))
    }

    fn load_model(&self, info: ModelInfo) -> ValidatorResult<ActiveModel> {
        let lexicon = LexiconStore::load(&info.lexicon_path, self.settings.constrained_size_threshold)?;
        let predictor = self.predictor_for(&info.language_family)?;
        Ok(ActiveModel {
            info,
            lexicon,
            predictor,
        })
    }

    /// 规则表：配置覆盖 → 内置 → 回退表
    fn predictor_for(&self, language_family: &str) -> ValidatorResult<Arc<dyn PhoneticPredictor>> {
        let predictor = match self.settings.g2p_rules.get(language_family) {
            Some(path) => {
                tracing::info!("使用自定义 G2P 规则表 {:?} ({})", path, language_family);
                RuleBasedPredictor::new(RuleTable::load(path)?)?
            }
            None => RuleBasedPredictor::for_language(language_family)?,
        };
        Ok(Arc::new(predictor))
    }

    fn swap(&self, model: ActiveModel) -> ModelSelection {
        let selection = ModelSelection {
            model: model.info.clone(),
            stats: model.lexicon.stats().clone(),
            changed: true,
        };
        let model = Arc::new(model);

        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            active.replace(model)
        };

        match previous {
            Some(prev) => tracing::info!(
                "模型已切换: {} -> {} ({} 个词)",
                prev.info.id,
                selection.model.id,
                selection.stats.total_words
            ),
            None => tracing::info!(
                "模型已激活: {} ({} 个词)",
                selection.model.id,
                selection.stats.total_words
            ),
        }
        selection
    }
}
