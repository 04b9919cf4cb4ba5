//! テンプレートが参照するスタイルクラスの抽出
//!
//! 1. class属性（`class` / `CssClass`）の静的トークン
//! 2. `@` を含む属性値の中の文字列リテラル
//! 3. `@code` / `@functions` ブロック内の文字列リテラル（高確度のものだけ）

use std::collections::{BTreeMap, BTreeSet};

use phf::phf_set;

use super::blocks::find_code_regions;
use super::literals::string_literals;
use super::structure::Document;
use crate::model::{ClassToken, Confidence, Provenance};

/// クラスを保持する属性名（大文字小文字は無視）
pub const CLASS_ATTRIBUTES: &[&str] = &["class", "CssClass"];

/// 式マーカー
pub const EXPRESSION_MARKER: char = '@';

/// クラス名として扱わない予約語
static RESERVED_WORDS: phf::Set<&'static str> = phf_set! {
    "true", "false", "null", "string", "int", "bool", "var",
};

/// ハイフンなしでもクラス名として信頼する汎用ユーティリティ名
static UTILITY_CLASSES: phf::Set<&'static str> = phf_set! {
    // display / layout
    "block", "inline", "flex", "grid", "table", "contents", "hidden",
    "container", "row", "col", "grow", "shrink", "wrap",
    // position
    "static", "fixed", "absolute", "relative", "sticky",
    // visibility / state
    "visible", "invisible", "active", "disabled", "show", "fade", "collapse",
    "collapsed", "open", "selected", "valid", "invalid",
    // typography
    "italic", "underline", "uppercase", "lowercase", "capitalize", "truncate",
    "lead", "small",
    // decoration
    "border", "rounded", "shadow", "transition",
    // common components
    "btn", "card", "badge", "alert", "nav", "navbar",
};

/// 属性名がクラス保持属性か
pub fn is_class_attribute(name: &str) -> bool {
    CLASS_ATTRIBUTES.iter().any(|a| a.eq_ignore_ascii_case(name))
}

/// クラストークンとして妥当か（厳格フィルタ）
pub fn is_valid_class_token(token: &str) -> bool {
    let Some(first) = token.chars().next() else {
        return false;
    };

    if first == EXPRESSION_MARKER || first == '_' || first.is_ascii_digit() {
        return false;
    }
    if token.starts_with(['(', ')']) || token.ends_with(['(', ')']) {
        return false;
    }
    if token.contains([
        '?', '|', '=', '!', '(', ')', ',', '+', '*', ';', '<', '>', '\'', '"', '&', '{', '}',
    ]) {
        return false;
    }
    if token.parse::<i64>().is_ok() {
        return false;
    }
    if RESERVED_WORDS.contains(token.to_ascii_lowercase().as_str()) {
        return false;
    }
    if !token.chars().any(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    // `user.Name` のようなメンバーアクセスは除外。`w-1.5` のような数値は許す
    let chars: Vec<char> = token.chars().collect();
    !chars.windows(3).any(|w| w[0].is_alphabetic() && w[1] == '.' && w[2].is_alphabetic())
}

/// コード内リテラル由来のトークンとして信頼できるか（高確度フィルタ）
pub fn is_high_confidence_token(token: &str) -> bool {
    is_valid_class_token(token) && (token.contains('-') || UTILITY_CLASSES.contains(token))
}

/// リテラル全体がクラス列の形（英数字・`-`・`_`・空白のみ）か
fn is_class_literal(literal: &str) -> bool {
    !literal.is_empty()
        && literal
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
}

/// 出どころと確度つきのクラス候補（名前順、重複は最も確度の高いものを残す）
pub fn class_tokens(text: &str) -> Vec<ClassToken> {
    let mut found: BTreeMap<String, ClassToken> = BTreeMap::new();
    let mut accept = |token: ClassToken| {
        match found.get(&token.name) {
            Some(existing) if existing.confidence >= token.confidence => {}
            _ => {
                found.insert(token.name.clone(), token);
            }
        }
    };

    let doc = Document::parse(text);
    for (_, record) in doc.iter() {
        for attr in &record.attributes {
            let Some(value) = attr.value.as_deref() else {
                continue;
            };

            if !is_class_attribute(&attr.name) {
                continue;
            }

            for token in value.split_whitespace().filter(|t| is_valid_class_token(t)) {
                accept(ClassToken::new(token, Provenance::StaticAttribute, Confidence::High));
            }

            if value.contains(EXPRESSION_MARKER) {
                for literal in string_literals(value).into_iter().filter(|l| is_class_literal(l)) {
                    for token in literal.split_whitespace().filter(|t| is_valid_class_token(t)) {
                        accept(ClassToken::new(token, Provenance::DynamicLiteral, Confidence::Medium));
                    }
                }
            }
        }
    }

    for region in find_code_regions(text) {
        for literal in string_literals(&region.raw_content)
            .into_iter()
            .filter(|l| is_class_literal(l))
        {
            for token in literal.split_whitespace().filter(|t| is_high_confidence_token(t)) {
                let confidence = if token.contains('-') {
                    Confidence::Medium
                } else {
                    Confidence::Low
                };
                accept(ClassToken::new(token, Provenance::DynamicLiteral, confidence));
            }
        }
    }

    found.into_values().collect()
}

/// テンプレートが参照するクラス名の集合（アルファベット順）
pub fn used_classes(text: &str) -> BTreeSet<String> {
    class_tokens(text).into_iter().map(|t| t.name).collect()
}
