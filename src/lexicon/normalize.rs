// 词条归一化
//
// 加载词典和查询单词共用同一套规则，
// 两边规则不一致会导致查询静默失败

use unicode_normalization::UnicodeNormalization;

/// 归一化单词
///
/// - NFC 归一化
/// - 去除首尾空白
/// - 转小写
/// - 去除首尾标点（词内的撇号等保留，如 "dell'acqua"）
pub fn normalize_word(word: &str) -> String {
    let nfc: String = word.nfc().collect();
    nfc.trim()
        .to_lowercase()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// 判断是否为实体名分隔符（下划线、连字符、空白）
pub fn is_separator(c: char) -> bool {
    c == '_' || c == '-' || c.is_whitespace()
}

/// 拆分实体名
///
/// 小写后按分隔符切分，丢弃空片段，每段再做单词归一化
pub fn split_entity_name(entity_name: &str) -> Vec<String> {
    entity_name
        .to_lowercase()
        .split(is_separator)
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}
