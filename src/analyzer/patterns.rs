//! 繰り返し現れる要素（コピー&ペーストされたマークアップ）の検出

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::structure::Document;

/// これ以下の内側マークアップしか持たない要素は対象外（`<br>` や短い `<span>`）
const MIN_INNER_LEN: usize = 20;

const PREVIEW_LEN: usize = 100;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 同一マークアップのまとまり
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePattern {
    /// 空白を正規化したマークアップの先頭部分
    pub pattern_preview: String,
    pub occurrence_count: usize,
    /// 各出現の開始行（1始まり、文書順）
    pub locations: Vec<usize>,
}

fn normalize(markup: &str) -> String {
    WHITESPACE.replace_all(markup, " ").trim().to_string()
}

/// 空白の違いを無視して同じ外側マークアップを持つ要素を、2回以上現れるものだけまとめる
///
/// 大きいまとまりほど先に並ぶ（プレビュー長の降順、同じなら最初の出現順）。
pub fn duplicate_patterns(text: &str) -> Vec<DuplicatePattern> {
    let doc = Document::parse(text);

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (_, record) in doc.iter() {
        let inner_len = record
            .inner
            .map(|inner| inner.slice(text).chars().count())
            .unwrap_or(0);
        if inner_len <= MIN_INNER_LEN {
            continue;
        }

        let key = normalize(record.outer.slice(text));
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record.line);
    }

    let mut patterns: Vec<DuplicatePattern> = order
        .into_iter()
        .filter_map(|key| {
            let locations = groups.remove(&key)?;
            if locations.len() < 2 {
                return None;
            }
            let mut preview: String = key.chars().take(PREVIEW_LEN).collect();
            preview.push_str("...");
            Some(DuplicatePattern {
                pattern_preview: preview,
                occurrence_count: locations.len(),
                locations,
            })
        })
        .collect();

    patterns.sort_by_key(|p| std::cmp::Reverse(p.pattern_preview.chars().count()));
    patterns
}
