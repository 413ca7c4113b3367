//! 基于规则的发音预测
//!
//! 词典未命中时的兜底：确定性、全函数（除空词外从不失败）。
//! 置信度按规则覆盖度计算，不代表实测准确率。

use std::fmt;

use aho_corasick::{AhoCorasick, MatchKind};
use serde::Serialize;

use super::rules::RuleTable;
use crate::errors::{ValidatorError, ValidatorResult};
use crate::lexicon::{normalize_word, Pronunciation};

/// 预测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct G2pPrediction {
    pub word: String,
    /// 无可推导音素时为 None
    pub pronunciation: Option<Pronunciation>,
    /// 置信度 (0.0 - 1.0)
    pub confidence: f64,
    /// 未被规则覆盖的字母数
    pub unmapped_letters: usize,
    /// 是否包含数字或符号
    pub has_non_alphabetic: bool,
}

/// 发音预测策略
///
/// 目前只有规则实现，后续可替换为训练模型而不影响校验器
pub trait PhoneticPredictor: Send + Sync + fmt::Debug {
    /// 策略名称（用于日志与备注）
    fn name(&self) -> &str;

    /// 目标语言
    fn language(&self) -> &str;

    /// 预测发音；空词返回 `InvalidWord`
    fn predict(&self, word: &str) -> ValidatorResult<G2pPrediction>;
}

/// 规则预测器（字素最长匹配）
pub struct RuleBasedPredictor {
    table: RuleTable,
    matcher: AhoCorasick,
}

impl fmt::Debug for RuleBasedPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBasedPredictor")
            .field("language", &self.table.language)
            .field("rules", &self.table.rules.len())
            .finish()
    }
}

impl RuleBasedPredictor {
    /// 用注入的规则表创建预测器（先归一化并校验）
    pub fn new(mut table: RuleTable) -> ValidatorResult<Self> {
        table.prepare()?;
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(table.rules.iter().map(|r| r.grapheme.as_str()))
            .map_err(|e| ValidatorError::RuleTable {
                reason: e.to_string(),
            })?;
        Ok(Self { table, matcher })
    }

    /// 使用内置表；未知语言回退到意大利语表
    pub fn for_language(language_family: &str) -> ValidatorResult<Self> {
        let table = match RuleTable::builtin(language_family) {
            Some(table) => table,
            None => {
                tracing::warn!(
                    "没有 {} 的内置 G2P 规则表，回退到 {}",
                    language_family,
                    super::rules::FALLBACK_LANGUAGE
                );
                RuleTable::builtin(super::rules::FALLBACK_LANGUAGE).ok_or_else(|| {
                    ValidatorError::RuleTable {
                        reason: "builtin fallback table unavailable".to_string(),
                    }
                })?
            }
        };
        Self::new(table.clone())
    }
}

impl PhoneticPredictor for RuleBasedPredictor {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn language(&self) -> &str {
        &self.table.language
    }

    fn predict(&self, word: &str) -> ValidatorResult<G2pPrediction> {
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            return Err(ValidatorError::InvalidWord {
                word: word.to_string(),
            });
        }

        let has_non_alphabetic = normalized.chars().any(|c| !c.is_alphabetic());
        // 只用字母子序列推导发音
        let letters: String = normalized.chars().filter(|c| c.is_alphabetic()).collect();

        let mut phonemes: Vec<String> = Vec::new();
        let mut rule_confidence = 1.0;
        let mut unmapped_letters = 0usize;
        let mut last_end = 0;

        for m in self.matcher.find_iter(&letters) {
            unmapped_letters += letters[last_end..m.start()].chars().count();
            let rule = &self.table.rules[m.pattern().as_usize()];
            phonemes.extend(rule.phonemes.iter().cloned());
            rule_confidence *= rule.confidence;
            last_end = m.end();
        }
        unmapped_letters += letters[last_end..].chars().count();

        let pronunciation = Pronunciation::new(phonemes);
        let confidence = match pronunciation {
            None => 0.0,
            Some(_) => {
                let mut c = self.table.base_confidence
                    * rule_confidence
                    * self.table.unmapped_confidence.powi(unmapped_letters as i32);
                if has_non_alphabetic {
                    c = c.min(self.table.non_alphabetic_ceiling);
                }
                c.clamp(0.0, 1.0)
            }
        };

        Ok(G2pPrediction {
            word: normalized,
            pronunciation,
            confidence,
            unmapped_letters,
            has_non_alphabetic,
        })
    }
}
