//! 实体级聚合
//!
//! 单词之间互不影响：先逐词校验，再由这里汇总状态、占比、建议和替代名。

use super::types::{WordStatus, WordVerdict};
use crate::lexicon::LexiconKind;

/// 替代实体名上限
pub const MAX_ALTERNATIVES: usize = 3;

/// 汇总状态
///
/// 全部 known → known；全部 unknown/error → unknown；其余 → guessed；无单词 → error
pub fn aggregate_status(results: &[WordVerdict]) -> WordStatus {
    if results.is_empty() {
        return WordStatus::Error;
    }
    if results.iter().all(|r| r.status == WordStatus::Known) {
        WordStatus::Known
    } else if results
        .iter()
        .all(|r| matches!(r.status, WordStatus::Unknown | WordStatus::Error))
    {
        WordStatus::Unknown
    } else {
        WordStatus::Guessed
    }
}

/// 已识别单词占比
pub fn recognized_ratio(results: &[WordVerdict]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let known = results.iter().filter(|r| r.is_known()).count();
    known as f64 / results.len() as f64
}

/// 实体总分：各单词置信度的平均值
pub fn overall_score(results: &[WordVerdict]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64
}

/// 按总分分档的整体评价
fn score_band(score: f64) -> &'static str {
    if score >= 0.9 {
        "Excellent entity name for Speech-to-Phrase"
    } else if score >= 0.7 {
        "Good entity name, should be recognized reliably"
    } else if score >= 0.5 {
        "Mediocre entity name, recognition problems are possible"
    } else {
        "Problematic entity name, renaming is strongly advised"
    }
}

/// 生成实体建议
pub fn recommendations(
    entity_id: &str,
    results: &[WordVerdict],
    ratio: f64,
    score: f64,
    rename_ratio_threshold: f64,
    kind: LexiconKind,
) -> Vec<String> {
    if results.is_empty() {
        return vec!["Entity name contains no words to validate".to_string()];
    }

    let mut recs = Vec::new();
    let unknown: Vec<&WordVerdict> = results
        .iter()
        .filter(|r| r.status == WordStatus::Unknown)
        .collect();

    if !unknown.is_empty() {
        let names: Vec<&str> = unknown.iter().map(|r| r.word.as_str()).collect();
        recs.push(format!("Consider replacing: {}", names.join(", ")));
        for r in &unknown {
            match r.top_suggestion() {
                Some(best) => recs.push(format!(
                    "'{}' -> '{}' (similarity: {:.2})",
                    r.word, best.word, best.score
                )),
                None => recs.push(format!(
                    "Reword '{}': no similar word is known to the model",
                    r.word
                )),
            }
        }
    }

    if results.iter().any(|r| r.status == WordStatus::Guessed) {
        recs.push("Some words use estimated pronunciations - test voice accuracy".to_string());
    }

    if ratio < rename_ratio_threshold {
        let known = results.iter().filter(|r| r.is_known()).count();
        recs.push(format!(
            "Consider renaming the entity: only {} of {} words are recognized",
            known,
            results.len()
        ));
    }

    if kind == LexiconKind::Constrained && !results.iter().all(|r| r.is_known()) {
        recs.push(format!(
            "The model uses a constrained lexicon: add '{}' to the training templates",
            entity_id
        ));
    }

    recs.push(score_band(score).to_string());
    recs
}

/// 用最佳相似词替换未识别单词，生成候选实体名
///
/// 先逐个替换，再给出全部替换的组合；去重后截断到 `MAX_ALTERNATIVES`
pub fn alternatives(words: &[String], results: &[WordVerdict]) -> Vec<String> {
    let replacements: Vec<(usize, &str)> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status == WordStatus::Unknown)
        .filter_map(|(i, r)| r.top_suggestion().map(|s| (i, s.word.as_str())))
        .collect();

    let mut out: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    };

    for &(idx, replacement) in &replacements {
        let mut rewritten = words.to_vec();
        rewritten[idx] = replacement.to_string();
        push(rewritten.join("_"));
    }

    if replacements.len() > 1 {
        let mut rewritten = words.to_vec();
        for &(idx, replacement) in &replacements {
            rewritten[idx] = replacement.to_string();
        }
        push(rewritten.join("_"));
    }

    out.truncate(MAX_ALTERNATIVES);
    out
}
