//! 结构化词典（SQLite）读取
//!
//! 兼容两种表结构，按顺序尝试：
//! 1. `word_phonemes(word, phonemes, pron_order)` — Speech-to-Phrase 训练产物
//! 2. `lexicon(word, pronunciation[, weight])` — 预下载的 lexicon.db

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::store::LexiconBuilder;
use super::types::Pronunciation;
use crate::errors::{ValidatorError, ValidatorResult};

/// SQLite 文件头
pub const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// 读取结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StructuredReport {
    /// 命中的表名
    pub table: String,
    pub rows: usize,
    /// 空词 / 空音素 / 类型不符的行
    pub skipped_rows: usize,
}

/// 文件头是否为 SQLite
pub fn is_sqlite(bytes: &[u8]) -> bool {
    bytes.starts_with(SQLITE_HEADER)
}

/// 表结构
struct TableLayout {
    table: &'static str,
    word_column: &'static str,
    phonemes_column: &'static str,
    weight_column: Option<&'static str>,
    order_by: &'static str,
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn detect_layout(conn: &Connection) -> rusqlite::Result<Option<TableLayout>> {
    let word_phonemes = table_columns(conn, "word_phonemes")?;
    if word_phonemes.iter().any(|c| c == "word") && word_phonemes.iter().any(|c| c == "phonemes") {
        let has_order = word_phonemes.iter().any(|c| c == "pron_order");
        return Ok(Some(TableLayout {
            table: "word_phonemes",
            word_column: "word",
            phonemes_column: "phonemes",
            weight_column: None,
            order_by: if has_order { "pron_order, rowid" } else { "rowid" },
        }));
    }

    let lexicon = table_columns(conn, "lexicon")?;
    if lexicon.iter().any(|c| c == "word") {
        let phonemes_column = if lexicon.iter().any(|c| c == "pronunciation") {
            "pronunciation"
        } else if lexicon.iter().any(|c| c == "phonemes") {
            "phonemes"
        } else {
            return Ok(None);
        };
        return Ok(Some(TableLayout {
            table: "lexicon",
            word_column: "word",
            phonemes_column,
            weight_column: lexicon.iter().any(|c| c == "weight").then_some("weight"),
            order_by: "rowid",
        }));
    }

    Ok(None)
}

/// 文本单元格；NULL → None，其他类型视为坏行
fn text_cell(value: ValueRef<'_>) -> Result<Option<String>, String> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Some(s.to_string()))
            .map_err(|_| "text is not valid UTF-8".to_string()),
        other => Err(format!("expected text, got {:?}", other.data_type())),
    }
}

/// 权重单元格；整数与浮点都接受
fn weight_cell(value: ValueRef<'_>) -> Result<Option<f64>, String> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i as f64)),
        ValueRef::Real(f) => Ok(Some(f)),
        other => Err(format!("expected number, got {:?}", other.data_type())),
    }
}

type RowCells = (Option<String>, Option<String>, Option<f64>);

fn read_cells(row: &rusqlite::Row<'_>) -> Result<RowCells, String> {
    let word = text_cell(row.get_ref(0).map_err(|e| e.to_string())?)?;
    let phonemes = text_cell(row.get_ref(1).map_err(|e| e.to_string())?)?;
    let weight = weight_cell(row.get_ref(2).map_err(|e| e.to_string())?)?;
    Ok((word, phonemes, weight))
}

fn read_rows(
    conn: &Connection,
    layout: &TableLayout,
    builder: &mut LexiconBuilder,
) -> rusqlite::Result<StructuredReport> {
    let weight_expr = layout.weight_column.unwrap_or("NULL");
    let sql = format!(
        "SELECT {}, {}, {} FROM {} ORDER BY {}",
        layout.word_column, layout.phonemes_column, weight_expr, layout.table, layout.order_by
    );

    let mut report = StructuredReport {
        table: layout.table.to_string(),
        ..Default::default()
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        report.rows += 1;

        let (word, phonemes, weight) = match read_cells(row) {
            Ok(cells) => cells,
            Err(reason) => {
                tracing::debug!("跳过 {} 表第 {} 行: {}", layout.table, report.rows, reason);
                report.skipped_rows += 1;
                continue;
            }
        };

        let (Some(word), Some(pronunciation)) =
            (word, phonemes.as_deref().and_then(Pronunciation::parse))
        else {
            report.skipped_rows += 1;
            continue;
        };

        if !builder.insert(&word, pronunciation, weight) {
            report.skipped_rows += 1;
        }
    }

    Ok(report)
}

/// 读取 SQLite 词典到构建器
pub fn load_into(path: &Path, builder: &mut LexiconBuilder) -> ValidatorResult<StructuredReport> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| ValidatorError::format(path, format!("cannot open SQLite database: {}", e)))?;

    let layout = detect_layout(&conn)
        .map_err(|e| ValidatorError::format(path, format!("cannot inspect schema: {}", e)))?
        .ok_or_else(|| {
            ValidatorError::format(path, "neither a word_phonemes nor a lexicon table found")
        })?;

    read_rows(&conn, &layout, builder)
        .map_err(|e| ValidatorError::format(path, format!("cannot read {}: {}", layout.table, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_db(path: &Path, sql: &str) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    #[test]
    fn test_word_phonemes_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.db");
        create_db(
            &path,
            "CREATE TABLE word_phonemes (word TEXT, phonemes TEXT, pron_order INTEGER);
             INSERT INTO word_phonemes VALUES ('luce', 'l u tS e', 0);
             INSERT INTO word_phonemes VALUES ('cucina', 'k u tS i n a', 0);
             INSERT INTO word_phonemes VALUES ('luce', 'l u ts e', 1);",
        );

        assert!(is_sqlite(&std::fs::read(&path).unwrap()));

        let mut builder = LexiconBuilder::new();
        let report = load_into(&path, &mut builder).unwrap();
        assert_eq!(report.table, "word_phonemes");
        assert_eq!(report.rows, 3);
        assert_eq!(report.skipped_rows, 0);

        let (entries, _) = builder.finish();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].word, "luce");
        assert_eq!(entries[0].pronunciations.len(), 2);
        assert_eq!(entries[0].primary().unwrap().to_string(), "l u tS e");
    }

    #[test]
    fn test_lexicon_table_with_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.db");
        create_db(
            &path,
            "CREATE TABLE lexicon (word TEXT, pronunciation TEXT, weight REAL);
             INSERT INTO lexicon VALUES ('Luce', 'l u tS e', 2.5);
             INSERT INTO lexicon VALUES ('', 'x', 1.0);
             INSERT INTO lexicon VALUES ('cucina', '', 1.0);
             INSERT INTO lexicon VALUES ('cucina', 'k u tS i n a', NULL);",
        );

        let mut builder = LexiconBuilder::new();
        let report = load_into(&path, &mut builder).unwrap();
        assert_eq!(report.table, "lexicon");
        assert_eq!(report.skipped_rows, 2);

        let (entries, index) = builder.finish();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[index["luce"]].weight, Some(2.5));
        assert_eq!(entries[index["cucina"]].weight, None);
    }

    #[test]
    fn test_mistyped_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.db");
        create_db(
            &path,
            "CREATE TABLE lexicon (word, pronunciation, weight);
             INSERT INTO lexicon VALUES ('luce', 'l u tS e', 'n/a');
             INSERT INTO lexicon VALUES (42, 'k u tS i n a', 1.0);
             INSERT INTO lexicon VALUES ('sala', X'7361', 1.0);
             INSERT INTO lexicon VALUES ('cucina', 'k u tS i n a', 3);",
        );

        let mut builder = LexiconBuilder::new();
        let report = load_into(&path, &mut builder).unwrap();
        assert_eq!(report.rows, 4);
        assert_eq!(report.skipped_rows, 3);

        let (entries, index) = builder.finish();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[index["cucina"]].weight, Some(3.0));
    }

    #[test]
    fn test_integer_word_in_word_phonemes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.db");
        create_db(
            &path,
            "CREATE TABLE word_phonemes (word, phonemes, pron_order INTEGER);
             INSERT INTO word_phonemes VALUES (42, 'k w a r a n t a d u e', 0);
             INSERT INTO word_phonemes VALUES ('luce', 'l u tS e', 0);",
        );

        let mut builder = LexiconBuilder::new();
        let report = load_into(&path, &mut builder).unwrap();
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_unknown_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        create_db(&path, "CREATE TABLE settings (key TEXT, value TEXT);");

        let mut builder = LexiconBuilder::new();
        let err = load_into(&path, &mut builder).unwrap_err();
        assert!(matches!(err, ValidatorError::LexiconFormat { .. }));
    }

    #[test]
    fn test_text_file_has_no_sqlite_header() {
        assert!(!is_sqlite(b"luce l u tS e\n"));
        assert!(!is_sqlite(b"SQL"));
        assert!(is_sqlite(b"SQLite format 3\0\x10\x00"));
    }
}
