//! 纯文本词典解析
//!
//! 每行 `word ph ph ...`（Kaldi / Speech-to-Phrase 格式），
//! 兼容 lexiconp 的概率列 `word 1.0 ph ph ...` 和 CMUdict 的变体标记 `word(2)`。
//! 空行与 `#` 注释静默跳过；畸形行计数后跳过，不中断加载。

use super::store::LexiconBuilder;
use super::types::Pronunciation;

/// 解析报告
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlatTextReport {
    /// 成功解析的行数
    pub parsed_lines: usize,
    /// 畸形行数（空词或无音素）
    pub skipped_lines: usize,
}

/// 解析单行
///
/// 返回 `None` 表示空行/注释；`Some(Err(()))` 表示畸形行
fn parse_line(line: &str) -> Option<Result<(&str, Option<f64>, Vec<String>), ()>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut parts = line.split_whitespace();
    let word = strip_variant_marker(parts.next()?);
    let rest: Vec<&str> = parts.collect();

    // 数字第二列且后面还有音素 → 权重列
    let (weight, phonemes) = match rest.split_first() {
        Some((first, tail)) if !tail.is_empty() => match first.parse::<f64>() {
            Ok(w) if w.is_finite() => (Some(w), tail),
            _ => (None, rest.as_slice()),
        },
        _ => (None, rest.as_slice()),
    };

    if word.is_empty() || phonemes.is_empty() {
        return Some(Err(()));
    }

    Some(Ok((
        word,
        weight,
        phonemes.iter().map(|p| p.to_string()).collect(),
    )))
}

/// 去掉 CMUdict 风格的变体标记："read(2)" → "read"
fn strip_variant_marker(word: &str) -> &str {
    if let Some(open) = word.rfind('(') {
        let marker = &word[open..];
        if open > 0
            && marker.len() > 2
            && marker.ends_with(')')
            && marker[1..marker.len() - 1].chars().all(|c| c.is_ascii_digit())
        {
            return &word[..open];
        }
    }
    word
}

/// 将文本内容解析进构建器
pub fn parse_into(content: &str, builder: &mut LexiconBuilder) -> FlatTextReport {
    let mut report = FlatTextReport::default();

    for (idx, line) in content.lines().enumerate() {
        match parse_line(line) {
            None => continue,
            Some(Ok((word, weight, phonemes))) => {
                let Some(pronunciation) = Pronunciation::new(phonemes) else {
                    report.skipped_lines += 1;
                    continue;
                };
                if builder.insert(word, pronunciation, weight) {
                    report.parsed_lines += 1;
                } else {
                    tracing::debug!("第 {} 行单词归一化后为空，跳过: {:?}", idx + 1, line);
                    report.skipped_lines += 1;
                }
            }
            Some(Err(())) => {
                tracing::debug!("第 {} 行格式错误，跳过: {:?}", idx + 1, line);
                report.skipped_lines += 1;
            }
        }
    }

    report
}
