//! `@code { ... }` ブロックと `<style>` 領域の切り出し
//!
//! コード部分は構文解析せず、ブレースの対応だけを数える。
//! 対応が取れないブロックはエラーにせず読み飛ばす。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{BlockKind, ExtractedBlock, Span};

/// 主ディレクティブ
pub const CODE_DIRECTIVE: &str = "@code";

/// `@code` の別名
pub const FUNCTIONS_DIRECTIVE: &str = "@functions";

pub const CODE_DIRECTIVES: &[&str] = &[CODE_DIRECTIVE, FUNCTIONS_DIRECTIVE];

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").unwrap());

static RAZOR_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)@\*.*?\*@").unwrap());

/// 最初の `marker` ブロックの中身（前後の空白はトリム）
///
/// ブレースが見つからない、または閉じない場合は `None`。
pub fn extract_delimited(text: &str, marker: &str) -> Option<String> {
    let start = marker_positions(text, marker).next()?;
    let (open, close) = balanced_braces(text, start + marker.len())?;
    Some(text[open + 1..close].trim().to_string())
}

/// `marker` で始まるブロックをすべて列挙する
///
/// `source_span` はマーカーの先頭から閉じブレースの直後まで。
/// 閉じないブロックはスキップして次のマーカーを探す。
pub fn find_all_regions(text: &str, marker: &str) -> Vec<ExtractedBlock> {
    let mut regions = Vec::new();
    let mut resume = 0;

    for start in marker_positions(text, marker) {
        if start < resume {
            continue;
        }
        match balanced_braces(text, start + marker.len()) {
            Some((open, close)) => {
                regions.push(ExtractedBlock {
                    kind: BlockKind::EmbeddedCode,
                    raw_content: text[open + 1..close].trim().to_string(),
                    source_span: Span::new(start, close + 1),
                });
                resume = close + 1;
            }
            None => debug!("Skipping unbalanced {} block at offset {}", marker, start),
        }
    }

    regions
}

/// すべてのディレクティブ種別のコードブロック（文書順）
pub fn find_code_regions(text: &str) -> Vec<ExtractedBlock> {
    let mut regions: Vec<ExtractedBlock> = CODE_DIRECTIVES
        .iter()
        .flat_map(|marker| find_all_regions(text, marker))
        .collect();
    regions.sort_by_key(|r| r.source_span.start);
    regions
}

/// 最初の `<style>` 領域の中身（トリム済み）
pub fn extract_style_block(text: &str) -> Option<String> {
    STYLE_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// `<style>` 領域をすべて列挙する（入れ子は想定しない）
pub fn find_style_regions(text: &str) -> Vec<ExtractedBlock> {
    STYLE_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let content = caps.get(1)?;
            Some(ExtractedBlock {
                kind: BlockKind::Stylesheet,
                raw_content: content.as_str().trim().to_string(),
                source_span: Span::from(whole.range()),
            })
        })
        .collect()
}

/// コメント・コードブロック・スタイル領域をすべて取り除き、残りをトリムして返す
///
/// 削除で前後がつながって新しいブロックになることがあるため、変化がなくなるまで繰り返す。
/// 2回適用しても結果は変わらない。
pub fn remove_all_blocks(text: &str) -> String {
    let mut result = text.to_string();
    loop {
        let next = remove_blocks_once(&result);
        if next == result {
            break;
        }
        result = next;
    }
    result.trim().to_string()
}

fn remove_blocks_once(text: &str) -> String {
    let mut result = RAZOR_COMMENT.replace_all(text, "").into_owned();

    for marker in CODE_DIRECTIVES {
        let regions = find_all_regions(&result, marker);
        result = remove_spans(&result, regions.iter().map(|r| r.source_span));
    }

    let styles = find_style_regions(&result);
    remove_spans(&result, styles.iter().map(|r| r.source_span))
}

/// 重ならない範囲を後ろから削除する
fn remove_spans(text: &str, spans: impl Iterator<Item = Span>) -> String {
    let mut spans: Vec<Span> = spans.collect();
    if spans.is_empty() {
        return text.to_string();
    }
    spans.sort_by_key(|s| std::cmp::Reverse(s.start));

    let mut result = text.to_string();
    for span in spans {
        result.replace_range(span.range(), "");
    }
    result
}

/// 単語境界を満たすマーカーの出現位置
fn marker_positions<'a>(text: &'a str, marker: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(marker).filter_map(move |(at, _)| {
        let next = text[at + marker.len()..].chars().next();
        match next {
            Some(c) if c.is_alphanumeric() || c == '_' => None,
            _ => Some(at),
        }
    })
}

/// `from` 以降の最初の `{` と、それに対応する `}` の位置
fn balanced_braces(text: &str, from: usize) -> Option<(usize, usize)> {
    let open = from + text[from..].find('{')?;

    let mut depth = 1usize;
    for (offset, byte) in text.as_bytes()[open + 1..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, open + 1 + offset));
                }
            }
            _ => {}
        }
    }

    None
}
