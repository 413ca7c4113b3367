// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::model::ContextSettings;
use crate::validator::ValidationConfig;

/// 应用目录名（位于系统配置目录下）
const APP_DIR: &str = "SpeechToPhraseValidator";

/// 覆盖配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "S2P_VALIDATOR_CONFIG";

// ============================================================================
// 全局配置操作锁
// ============================================================================

lazy_static::lazy_static! {
    /// 全局配置操作锁
    ///
    /// 保护 load->modify->save，防止并发写入导致的数据丢失
    pub static ref CONFIG_LOCK: Mutex<()> = Mutex::new(());
}

// ============================================================================
// 默认值
// ============================================================================

fn default_models_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("models")
}

fn default_similarity_floor() -> f64 {
    0.5
}

fn default_max_suggestions() -> usize {
    5
}

fn default_usable_guess_threshold() -> f64 {
    0.5
}

fn default_constrained_size_threshold() -> usize {
    500
}

fn default_rename_ratio_threshold() -> f64 {
    0.5
}

fn default_batch_rename_score_threshold() -> f64 {
    0.8
}

fn default_similarity_boost() -> f64 {
    0.3
}

// ============================================================================
// 校验器配置
// ============================================================================

/// 校验器配置
///
/// 所有字段都有默认值，旧配置文件缺字段也能加载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// 模型根目录（每个子目录一个模型）
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    /// 启动时选择的模型；为空则使用第一个发现的模型
    #[serde(default)]
    pub default_model: Option<String>,
    /// 相似词分数下限
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f64,
    /// 相似词最多返回数量
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// G2P 置信度可用阈值
    #[serde(default = "default_usable_guess_threshold")]
    pub usable_guess_threshold: f64,
    /// 受限词典的词数阈值
    #[serde(default = "default_constrained_size_threshold")]
    pub constrained_size_threshold: usize,
    /// 实体重命名建议阈值（识别占比）
    #[serde(default = "default_rename_ratio_threshold")]
    pub rename_ratio_threshold: f64,
    /// 批量重命名建议阈值（总分）
    #[serde(default = "default_batch_rename_score_threshold")]
    pub batch_rename_score_threshold: f64,
    /// 未识别词的相似度加成系数
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f64,
    /// 语言族 → 自定义 G2P 规则表
    #[serde(default)]
    pub g2p_rules: HashMap<String, PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self {
            models_dir: default_models_dir(),
            default_model: None,
            similarity_floor: default_similarity_floor(),
            max_suggestions: default_max_suggestions(),
            usable_guess_threshold: default_usable_guess_threshold(),
            constrained_size_threshold: default_constrained_size_threshold(),
            rename_ratio_threshold: default_rename_ratio_threshold(),
            batch_rename_score_threshold: default_batch_rename_score_threshold(),
            similarity_boost: default_similarity_boost(),
            g2p_rules: HashMap::new(),
        }
    }

    /// 配置文件路径（环境变量优先）
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?;
        Ok(config_dir.join(APP_DIR).join("config.json"))
    }

    /// 从默认路径加载
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// 从指定路径加载；文件不存在时返回默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::info!("尝试从以下路径加载配置: {:?}", path);

        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: ValidatorConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证阈值范围
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("similarity_floor", self.similarity_floor),
            ("usable_guess_threshold", self.usable_guess_threshold),
            ("rename_ratio_threshold", self.rename_ratio_threshold),
            ("batch_rename_score_threshold", self.batch_rename_score_threshold),
            ("similarity_boost", self.similarity_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} 必须在 [0, 1] 范围内，当前为 {}", name, value);
            }
        }
        if self.max_suggestions == 0 {
            anyhow::bail!("max_suggestions 至少为 1");
        }
        // 未识别词的置信度 = 相似分 × 加成，必须低于 guessed 的门槛
        if self.similarity_boost > 0.0 && self.similarity_boost >= self.usable_guess_threshold {
            anyhow::bail!(
                "similarity_boost ({}) 必须小于 usable_guess_threshold ({})",
                self.similarity_boost,
                self.usable_guess_threshold
            );
        }
        Ok(())
    }

    /// 保存到默认路径
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// 写到同目录的临时文件，再 rename 覆盖目标文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let _guard = CONFIG_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
        }

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("写入临时配置失败: {}", temp_path.display()))?;

        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e).with_context(|| format!("替换配置文件失败: {}", path.display()));
        }
        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }

    /// 校验阈值
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            similarity_floor: self.similarity_floor,
            max_suggestions: self.max_suggestions,
            usable_guess_threshold: self.usable_guess_threshold,
            rename_ratio_threshold: self.rename_ratio_threshold,
            batch_rename_score_threshold: self.batch_rename_score_threshold,
            similarity_boost: self.similarity_boost,
        }
    }

    /// 模型加载参数
    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings {
            constrained_size_threshold: self.constrained_size_threshold,
            g2p_rules: self.g2p_rules.clone(),
        }
    }
}
