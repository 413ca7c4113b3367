//! 词典存储
//!
//! 加载后不可变；重新加载时整体替换（不做增量合并）

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::flat_text;
use super::normalize::normalize_word;
use super::structured;
use super::types::{
    LexiconEntry, LexiconFormat, LexiconKind, LexiconSource, LexiconStats, Pronunciation,
};
use crate::errors::{ValidatorError, ValidatorResult};

/// 统计快照中的示例词数量
const SAMPLE_WORDS: usize = 10;

/// 词典构建器（解析器共用，保证归一化规则与查询一致）
#[derive(Debug, Default)]
pub struct LexiconBuilder {
    entries: Vec<LexiconEntry>,
    index: HashMap<String, usize>,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条发音；单词归一化后为空则返回 false
    pub fn insert(&mut self, raw_word: &str, pronunciation: Pronunciation, weight: Option<f64>) -> bool {
        let word = normalize_word(raw_word);
        if word.is_empty() {
            return false;
        }

        let idx = match self.index.get(&word) {
            Some(&idx) => idx,
            None => {
                self.entries.push(LexiconEntry::new(word.clone()));
                self.index.insert(word, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        entry.add_pronunciation(pronunciation);
        entry.merge_weight(weight);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> (Vec<LexiconEntry>, HashMap<String, usize>) {
        (self.entries, self.index)
    }
}

/// 已加载的词典
#[derive(Debug, Clone)]
pub struct LexiconStore {
    source: LexiconSource,
    constrained_threshold: usize,
    entries: Vec<LexiconEntry>,
    index: HashMap<String, usize>,
    stats: LexiconStats,
}

impl LexiconStore {
    /// 检测词典格式
    ///
    /// SQLite 文件头 → 结构化；合法 UTF-8 文本 → 纯文本；其他 → 格式错误
    pub fn detect_source(path: &Path) -> ValidatorResult<LexiconSource> {
        let bytes = Self::read_file(path)?;
        Self::source_from_bytes(path, &bytes)
    }

    fn source_from_bytes(path: &Path, bytes: &[u8]) -> ValidatorResult<LexiconSource> {
        if structured::is_sqlite(bytes) {
            Ok(LexiconSource::Structured(path.to_path_buf()))
        } else if std::str::from_utf8(bytes).is_ok() {
            Ok(LexiconSource::FlatText(path.to_path_buf()))
        } else {
            Err(ValidatorError::format(
                path,
                "neither a SQLite database nor UTF-8 text",
            ))
        }
    }

    fn read_file(path: &Path) -> ValidatorResult<Vec<u8>> {
        if !path.is_file() {
            return Err(ValidatorError::LexiconNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(std::fs::read(path)?)
    }

    /// 从路径加载（自动检测格式，文件只读一次）
    pub fn load(path: &Path, constrained_threshold: usize) -> ValidatorResult<Self> {
        let bytes = Self::read_file(path)?;
        let source = Self::source_from_bytes(path, &bytes)?;
        Self::from_bytes(source, bytes, constrained_threshold)
    }

    /// 从已判定的来源加载
    pub fn from_source(source: LexiconSource, constrained_threshold: usize) -> ValidatorResult<Self> {
        let bytes = Self::read_file(source.path())?;
        Self::from_bytes(source, bytes, constrained_threshold)
    }

    fn from_bytes(
        source: LexiconSource,
        bytes: Vec<u8>,
        constrained_threshold: usize,
    ) -> ValidatorResult<Self> {
        let path = source.path().to_path_buf();
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));

        let mut builder = LexiconBuilder::new();
        let skipped_lines = match &source {
            LexiconSource::Structured(p) => {
                let report = structured::load_into(p, &mut builder)?;
                if report.skipped_rows > 0 {
                    tracing::warn!(
                        "结构化词典 {} 表中跳过 {} 行无效数据",
                        report.table,
                        report.skipped_rows
                    );
                }
                if builder.is_empty() {
                    return Err(ValidatorError::format(
                        p,
                        format!("table {} has no usable rows", report.table),
                    ));
                }
                report.skipped_rows
            }
            LexiconSource::FlatText(p) => {
                let content = String::from_utf8(bytes)
                    .map_err(|_| ValidatorError::format(p, "lexicon text is not valid UTF-8"))?;
                let report = flat_text::parse_into(&content, &mut builder);
                if report.skipped_lines > 0 {
                    tracing::warn!("跳过 {} 行格式错误的词典条目", report.skipped_lines);
                }
                if builder.is_empty() {
                    return Err(ValidatorError::format(p, "no valid `word phoneme ...` lines"));
                }
                report.skipped_lines
            }
        };

        let (entries, index) = builder.finish();
        let stats = Self::compute_stats(
            &source,
            &entries,
            skipped_lines,
            fingerprint,
            constrained_threshold,
        );

        tracing::info!(
            "已加载词典 {:?}: {} 个词, {} 个发音 ({})",
            path,
            stats.total_words,
            stats.total_pronunciations,
            stats.kind.display_name()
        );

        Ok(Self {
            source,
            constrained_threshold,
            entries,
            index,
            stats,
        })
    }

    /// 重新读取同一来源，成功后整体替换；失败时保持原状态
    pub fn reload(&mut self) -> ValidatorResult<()> {
        let fresh = Self::load(self.source.path(), self.constrained_threshold)?;
        *self = fresh;
        Ok(())
    }

    fn classify(format: LexiconFormat, total_words: usize, threshold: usize) -> LexiconKind {
        if format == LexiconFormat::FlatText && total_words < threshold {
            LexiconKind::Constrained
        } else {
            LexiconKind::Full
        }
    }

    fn compute_stats(
        source: &LexiconSource,
        entries: &[LexiconEntry],
        skipped_lines: usize,
        fingerprint: String,
        constrained_threshold: usize,
    ) -> LexiconStats {
        let total_words = entries.len();
        let total_pronunciations: usize = entries.iter().map(|e| e.pronunciations.len()).sum();
        let avg = if total_words > 0 {
            (total_pronunciations as f64 / total_words as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };
        let kind = Self::classify(source.format(), total_words, constrained_threshold);

        LexiconStats {
            total_words,
            total_pronunciations,
            avg_pronunciations_per_word: avg,
            kind,
            format: source.format(),
            is_constrained: kind == LexiconKind::Constrained,
            sample_words: entries
                .iter()
                .take(SAMPLE_WORDS)
                .map(|e| e.word.clone())
                .collect(),
            skipped_lines,
            source_path: source.path().to_path_buf(),
            fingerprint,
        }
    }

    /// 查询发音（输入先归一化）
    pub fn lookup(&self, word: &str) -> Option<&[Pronunciation]> {
        self.entry(word).map(|e| e.pronunciations.as_slice())
    }

    pub fn entry(&self, word: &str) -> Option<&LexiconEntry> {
        let normalized = normalize_word(word);
        self.index.get(&normalized).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entry(word).is_some()
    }

    /// 按加载顺序遍历所有词（相似词候选池）
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.word.as_str())
    }

    pub fn stats(&self) -> &LexiconStats {
        &self.stats
    }

    pub fn source(&self) -> &LexiconSource {
        &self.source
    }

    pub fn kind(&self) -> LexiconKind {
        self.stats.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
