//! 相似词推荐
//!
//! 对未命中的词，在当前词典中按归一化编辑距离挑选最接近的候选。
//! 候选池为整个词表，线性扫描；只在未命中路径上执行。

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::lexicon::normalize_word;

/// 推荐结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub word: String,
    /// 相似度 (0.0, 1.0]
    pub score: f64,
}

/// 相似度：1 - 编辑距离 / 较长串长度（按字符计）
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f64 / max_len as f64)
}

/// 排序：分数降序 → 候选更短优先 → 字典序
fn rank(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.word.chars().count().cmp(&b.word.chars().count()))
        .then_with(|| a.word.cmp(&b.word))
}

/// 相似词推荐器
#[derive(Debug, Clone)]
pub struct SimilaritySuggester {
    /// 分数必须严格高于该下限才会返回
    floor: f64,
}

impl SimilaritySuggester {
    pub fn new(floor: f64) -> Self {
        Self {
            floor: floor.clamp(0.0, 1.0),
        }
    }

    /// 推荐最多 `max_results` 个候选
    ///
    /// 没有候选超过下限时返回空列表（表示 "没有合理替代"，不是错误）
    pub fn suggest<'a, I>(&self, word: &str, known_words: I, max_results: usize) -> Vec<Suggestion>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let target = normalize_word(word);
        if target.is_empty() || max_results == 0 {
            return Vec::new();
        }
        let target_len = target.chars().count();

        let mut results: Vec<Suggestion> = Vec::new();
        for candidate in known_words {
            if candidate == target {
                continue;
            }

            // 长度差决定相似度上界，上界不超过下限则跳过
            let candidate_len = candidate.chars().count();
            let max_len = target_len.max(candidate_len);
            let upper_bound = 1.0 - (target_len.abs_diff(candidate_len) as f64 / max_len as f64);
            if upper_bound <= self.floor {
                continue;
            }

            let score = similarity(&target, candidate);
            if score > self.floor {
                results.push(Suggestion {
                    word: candidate.to_string(),
                    score,
                });
            }
        }

        results.sort_by(rank);
        results.truncate(max_results);
        results
    }
}

impl Default for SimilaritySuggester {
    fn default() -> Self {
        Self::new(0.5)
    }
}
