//! G2P 规则表
//!
//! 字素 → 音素映射属于语言配置数据，不写死在代码里：
//! 内置意大利语 / 英语两张表，其他语言通过 JSON 文件注入。

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ValidatorError, ValidatorResult};
use crate::lexicon::normalize_word;

const BUILTIN_IT: &str = include_str!("../../rules/it.json");
const BUILTIN_EN: &str = include_str!("../../rules/en.json");

/// 未识别语言时使用的内置表
pub const FALLBACK_LANGUAGE: &str = "it";

lazy_static::lazy_static! {
    /// 内置规则表（按语言族索引，进程内只解析一次）
    static ref BUILTIN_TABLES: HashMap<&'static str, RuleTable> = {
        let mut tables = HashMap::new();
        for (lang, json) in [("it", BUILTIN_IT), ("en", BUILTIN_EN)] {
            match RuleTable::from_json(json) {
                Ok(table) => {
                    tables.insert(lang, table);
                }
                Err(e) => tracing::error!("内置 G2P 规则表 {} 解析失败: {}", lang, e),
            }
        }
        tables
    };
}

/// 单条字素规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphemeRule {
    /// 字素（单字母或字母组合，如 "gli"）
    pub grapheme: String,
    /// 音素；为空表示不发音（如意大利语的 h）
    #[serde(default)]
    pub phonemes: Vec<String>,
    /// 该映射的可信度，需要上下文消歧的字素取较低值
    #[serde(default = "default_rule_confidence")]
    pub confidence: f64,
}

fn default_rule_confidence() -> f64 {
    1.0
}

fn default_base_confidence() -> f64 {
    0.9
}

fn default_non_alphabetic_ceiling() -> f64 {
    0.2
}

fn default_unmapped_confidence() -> f64 {
    0.3
}

/// 规则表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub language: String,
    /// 全部字素都无歧义时的置信度上限
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
    /// 含数字/符号的词的置信度上限（最低档）
    #[serde(default = "default_non_alphabetic_ceiling")]
    pub non_alphabetic_ceiling: f64,
    /// 每个未覆盖字母的惩罚系数
    #[serde(default = "default_unmapped_confidence")]
    pub unmapped_confidence: f64,
    pub rules: Vec<GraphemeRule>,
}

impl RuleTable {
    /// 解析 JSON 规则表并校验
    pub fn from_json(json: &str) -> ValidatorResult<Self> {
        let mut table: RuleTable = serde_json::from_str(json).map_err(|e| ValidatorError::RuleTable {
            reason: e.to_string(),
        })?;
        table.prepare()?;
        Ok(table)
    }

    /// 从文件加载
    pub fn load(path: &Path) -> ValidatorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 获取内置表
    pub fn builtin(language_family: &str) -> Option<&'static RuleTable> {
        BUILTIN_TABLES.get(language_family.to_lowercase().as_str())
    }

    /// 已内置的语言
    pub fn builtin_languages() -> Vec<&'static str> {
        let mut langs: Vec<&'static str> = BUILTIN_TABLES.keys().copied().collect();
        langs.sort_unstable();
        langs
    }

    /// 归一化字素并校验
    pub(crate) fn prepare(&mut self) -> ValidatorResult<()> {
        self.normalize_graphemes();
        self.validate()
    }

    /// 字素与查询词使用相同的归一化
    fn normalize_graphemes(&mut self) {
        for rule in &mut self.rules {
            rule.grapheme = normalize_word(&rule.grapheme);
        }
    }

    fn validate(&self) -> ValidatorResult<()> {
        let invalid = |reason: String| Err(ValidatorError::RuleTable { reason });

        if self.rules.is_empty() {
            return invalid(format!("table '{}' has no rules", self.language));
        }
        for (name, value) in [
            ("base_confidence", self.base_confidence),
            ("non_alphabetic_ceiling", self.non_alphabetic_ceiling),
            ("unmapped_confidence", self.unmapped_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.grapheme.is_empty() || !rule.grapheme.chars().all(char::is_alphabetic) {
                return invalid(format!("grapheme {:?} must be alphabetic", rule.grapheme));
            }
            if !(rule.confidence > 0.0 && rule.confidence <= 1.0) {
                return invalid(format!(
                    "confidence of '{}' must be within (0, 1], got {}",
                    rule.grapheme, rule.confidence
                ));
            }
            if !seen.insert(rule.grapheme.as_str()) {
                return invalid(format!("duplicate grapheme '{}'", rule.grapheme));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables() {
        assert_eq!(RuleTable::builtin_languages(), vec!["en", "it"]);

        let it = RuleTable::builtin("it").unwrap();
        assert_eq!(it.language, "it");
        assert!(it.rules.iter().any(|r| r.grapheme == "gli"));
        // 大小写不敏感
        assert!(RuleTable::builtin("IT").is_some());
        assert!(RuleTable::builtin("xx").is_none());
    }

    #[test]
    fn test_defaults_applied() {
        let table = RuleTable::from_json(
            r#"{"language": "es", "rules": [{"grapheme": "A", "phonemes": ["a"]}]}"#,
        )
        .unwrap();
        assert!((table.base_confidence - 0.9).abs() < f64::EPSILON);
        assert!((table.rules[0].confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(table.rules[0].grapheme, "a");
    }

    #[test]
    fn test_invalid_tables() {
        let cases = [
            r#"{"language": "es", "rules": []}"#,
            r#"{"language": "es", "rules": [{"grapheme": "a1", "phonemes": ["a"]}]}"#,
            r#"{"language": "es", "rules": [{"grapheme": "a", "confidence": 0.0}]}"#,
            r#"{"language": "es", "rules": [{"grapheme": "a"}, {"grapheme": "A"}]}"#,
            r#"{"language": "es", "base_confidence": 1.5, "rules": [{"grapheme": "a"}]}"#,
            r#"{"rules": "nope"}"#,
        ];
        for json in cases {
            assert!(
                matches!(RuleTable::from_json(json), Err(ValidatorError::RuleTable { .. })),
                "应拒绝规则表: {}",
                json
            );
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("es.json");
        std::fs::write(
            &path,
            r#"{"language": "es", "rules": [{"grapheme": "ñ", "phonemes": ["J"]}]}"#,
        )
        .unwrap();
        let table = RuleTable::load(&path).unwrap();
        assert_eq!(table.rules[0].grapheme, "ñ");
    }
}
