//! 词典类型定义

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 发音：有序音素序列
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pronunciation(Vec<String>);

impl Pronunciation {
    /// 构造发音，空序列返回 None
    pub fn new(phonemes: Vec<String>) -> Option<Self> {
        if phonemes.is_empty() {
            None
        } else {
            Some(Self(phonemes))
        }
    }

    /// 按空白拆分音素串（数据库中的存储格式）
    pub fn parse(text: &str) -> Option<Self> {
        Self::new(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Pronunciation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// 词典条目
///
/// 发音去重，保留首次出现的顺序（第一个为主发音）
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    pub word: String,
    pub pronunciations: Vec<Pronunciation>,
    /// 可选权重（结构化词典的 weight 列或 lexiconp 概率列）
    pub weight: Option<f64>,
}

impl LexiconEntry {
    pub fn new(word: String) -> Self {
        Self {
            word,
            pronunciations: Vec::new(),
            weight: None,
        }
    }

    /// 追加发音，已存在则忽略；返回是否新增
    pub fn add_pronunciation(&mut self, pronunciation: Pronunciation) -> bool {
        if self.pronunciations.contains(&pronunciation) {
            return false;
        }
        self.pronunciations.push(pronunciation);
        true
    }

    /// 合并权重（保留最大值）
    pub fn merge_weight(&mut self, weight: Option<f64>) {
        if let Some(w) = weight {
            self.weight = Some(self.weight.map_or(w, |current| current.max(w)));
        }
    }

    pub fn primary(&self) -> Option<&Pronunciation> {
        self.pronunciations.first()
    }
}

/// 词典类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexiconKind {
    /// 完整通用词典
    Full,
    /// 受限词典（模板训练产物，词量小）
    Constrained,
}

impl LexiconKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            LexiconKind::Full => "full lexicon",
            LexiconKind::Constrained => "constrained lexicon",
        }
    }
}

/// 词典来源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexiconFormat {
    /// SQLite 行式数据库
    Structured,
    /// 纯文本 "word ph ph ..."
    FlatText,
}

/// 已解析的词典来源
///
/// 加载时一次性判定格式，查询时不再检查
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexiconSource {
    Structured(PathBuf),
    FlatText(PathBuf),
}

impl LexiconSource {
    pub fn path(&self) -> &Path {
        match self {
            LexiconSource::Structured(p) | LexiconSource::FlatText(p) => p,
        }
    }

    pub fn format(&self) -> LexiconFormat {
        match self {
            LexiconSource::Structured(_) => LexiconFormat::Structured,
            LexiconSource::FlatText(_) => LexiconFormat::FlatText,
        }
    }
}

/// 词典统计快照（只读，重新加载时整体替换）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconStats {
    pub total_words: usize,
    pub total_pronunciations: usize,
    pub avg_pronunciations_per_word: f64,
    #[serde(rename = "model_type")]
    pub kind: LexiconKind,
    #[serde(rename = "lexicon_format")]
    pub format: LexiconFormat,
    pub is_constrained: bool,
    pub sample_words: Vec<String>,
    /// 被跳过的畸形行数（纯文本行或结构化表行）
    pub skipped_lines: usize,
    pub source_path: PathBuf,
    /// 源文件 SHA-256
    pub fingerprint: String,
}
