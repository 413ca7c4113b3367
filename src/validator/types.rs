//! 校验结果类型定义

use serde::{Deserialize, Serialize};

use crate::lexicon::Pronunciation;
use crate::suggest::Suggestion;

/// 校验状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    /// 词典命中
    Known,
    /// 词典未命中，G2P 估计可用
    Guessed,
    /// 无法识别
    Unknown,
    /// 输入非法或没有可用模型
    Error,
}

/// 置信度分档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Excellent,
    Good,
    Moderate,
    Poor,
    Unknown,
}

impl ConfidenceTier {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.95 {
            ConfidenceTier::Excellent
        } else if confidence >= 0.70 {
            ConfidenceTier::Good
        } else if confidence >= 0.50 {
            ConfidenceTier::Moderate
        } else if confidence >= 0.25 {
            ConfidenceTier::Poor
        } else {
            ConfidenceTier::Unknown
        }
    }
}

/// 单词校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordVerdict {
    /// 归一化后的单词（非法输入时保留原文）
    pub word: String,
    pub status: WordStatus,
    /// 置信度 (0.0 - 1.0)
    pub confidence: f64,
    pub tier: ConfidenceTier,
    /// 词典中的全部发音（仅 known）
    pub pronunciations: Vec<Pronunciation>,
    /// G2P 估计的发音（仅 guessed）
    pub guessed_pronunciation: Option<Pronunciation>,
    /// G2P 自身的置信度（执行过预测即存在）
    pub guess_confidence: Option<f64>,
    /// 相似词（分数降序）
    pub similar_words: Vec<Suggestion>,
    pub notes: Vec<String>,
    pub recommendation: String,
    pub model_id: Option<String>,
}

impl WordVerdict {
    /// 错误结果（非法输入 / 无模型）
    pub fn error(word: &str, note: impl Into<String>, model_id: Option<String>) -> Self {
        let note = note.into();
        Self {
            word: word.to_string(),
            status: WordStatus::Error,
            confidence: 0.0,
            tier: ConfidenceTier::Unknown,
            pronunciations: Vec::new(),
            guessed_pronunciation: None,
            guess_confidence: None,
            similar_words: Vec::new(),
            recommendation: note.clone(),
            notes: vec![note],
            model_id,
        }
    }

    pub fn is_known(&self) -> bool {
        self.status == WordStatus::Known
    }

    /// 最佳相似词
    pub fn top_suggestion(&self) -> Option<&Suggestion> {
        self.similar_words.first()
    }
}

/// 实体校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityVerdict {
    /// 原始实体名
    pub entity_id: String,
    /// 拆分出的单词
    pub words: Vec<String>,
    pub overall_status: WordStatus,
    /// 已识别单词占比
    pub recognized_ratio: f64,
    /// 各单词置信度的平均值
    pub overall_score: f64,
    pub overall_tier: ConfidenceTier,
    pub words_results: Vec<WordVerdict>,
    pub recommendations: Vec<String>,
    /// 替换未识别单词后的候选实体名（最多 3 个）
    pub alternatives: Vec<String>,
}

/// 批量校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchVerdict {
    pub model_id: Option<String>,
    pub total_entities: usize,
    pub known_entities: usize,
    pub partially_known_entities: usize,
    pub unknown_entities: usize,
    /// 各实体识别占比的平均值
    pub overall_score: f64,
    /// 与输入顺序一致
    pub entity_results: Vec<EntityVerdict>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ConfidenceTier::from_score(1.0), ConfidenceTier::Excellent);
        assert_eq!(ConfidenceTier::from_score(0.95), ConfidenceTier::Excellent);
        assert_eq!(ConfidenceTier::from_score(0.9), ConfidenceTier::Good);
        assert_eq!(ConfidenceTier::from_score(0.7), ConfidenceTier::Good);
        assert_eq!(ConfidenceTier::from_score(0.5), ConfidenceTier::Moderate);
        assert_eq!(ConfidenceTier::from_score(0.25), ConfidenceTier::Poor);
        assert_eq!(ConfidenceTier::from_score(0.1), ConfidenceTier::Unknown);
        assert_eq!(ConfidenceTier::from_score(0.0), ConfidenceTier::Unknown);
    }

    #[test]
    fn test_word_verdict_wire_shape() {
        let verdict = WordVerdict {
            word: "luce".to_string(),
            status: WordStatus::Known,
            confidence: 1.0,
            tier: ConfidenceTier::Excellent,
            pronunciations: vec![Pronunciation::parse("l u tS e").unwrap()],
            guessed_pronunciation: None,
            guess_confidence: None,
            similar_words: vec![Suggestion {
                word: "luci".to_string(),
                score: 0.75,
            }],
            notes: Vec::new(),
            recommendation: String::new(),
            model_id: Some("it_IT-rhasspy".to_string()),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["status"], "known");
        assert_eq!(json["tier"], "excellent");
        assert_eq!(json["pronunciations"][0][2], "tS");
        assert!(json["guessed_pronunciation"].is_null());
        assert_eq!(json["similar_words"][0]["word"], "luci");
    }

    #[test]
    fn test_error_verdict() {
        let verdict = WordVerdict::error("", "no model selected", None);
        assert_eq!(verdict.status, WordStatus::Error);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.notes, vec!["no model selected"]);
        assert!(verdict.top_suggestion().is_none());
    }
}
