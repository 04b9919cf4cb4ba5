//! パス指定による構造編集
//!
//! ツリーを再シリアライズせず、解析で得たバイト範囲への差し込み（splice）として
//! 編集を表現する。対象外の部分（Razor構文や空白）は元テキストのまま残る。

pub mod merge;
pub mod rename;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::analyzer::structure::{Document, ElementRecord};
use crate::error::{MarkupError, Result};
use crate::model::{EditKind, EditOperation, Span};
use crate::util::{read_template, write_text};

pub use merge::{merge_file, merge_styles, MergeOptions, MergeOutcome};
pub use rename::{batch_rename_class, rename_class_usage, rename_class_usage_counted, RenameReport};

/// 元テキストの範囲を置き換える1件の編集
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Splice {
    pub span: Span,
    pub replacement: String,
}

impl Splice {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::point(at), text)
    }
}

/// 重ならない編集を後ろから適用する
///
/// 同じ位置への挿入と置換が並ぶ場合は、挿入が置換結果の前に来る。
pub(crate) fn apply_splices(text: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by(|a, b| {
        b.span
            .start
            .cmp(&a.span.start)
            .then_with(|| b.span.end.cmp(&a.span.end))
    });

    let mut result = text.to_string();
    for splice in splices {
        result.replace_range(splice.span.range(), &splice.replacement);
    }
    result
}

/// 引用符に合わせて属性値をエスケープ
pub(crate) fn escape_attribute(value: &str, quote: char) -> String {
    match quote {
        '\'' => value.replace('\'', "&#39;"),
        _ => value.replace('"', "&quot;"),
    }
}

/// 編集を1件適用した新しいテキストを返す
///
/// 対象パスは現在のテキストに対して解決し直す。見つからなければ `ElementNotFound`。
pub fn apply(text: &str, operation: &EditOperation) -> Result<String> {
    let doc = Document::parse(text);
    let target = doc
        .select_first(&operation.target_path)?
        .ok_or_else(|| MarkupError::ElementNotFound(operation.target_path.clone()))?;
    let record = doc.node(target);

    let splices = match operation.kind {
        EditKind::Update => update_splices(
            text,
            record,
            operation.payload.as_deref(),
            operation.attribute_changes.as_ref(),
        ),
        EditKind::Wrap => wrap_splices(record, operation)?,
        EditKind::Append => append_splices(text, record, operation)?,
    };

    debug!(
        "{} on {} ({}) -> {} splices",
        operation.kind,
        operation.target_path,
        record.path,
        splices.len()
    );
    Ok(apply_splices(text, splices))
}

/// 編集を順番に適用する。後の編集は前の編集の結果に対して解決される
pub fn apply_all(text: &str, operations: &[EditOperation]) -> Result<String> {
    operations
        .iter()
        .try_fold(text.to_string(), |current, op| apply(&current, op))
}

/// ファイルを読み、全編集を適用して一度だけ書き戻す
///
/// 途中の編集が失敗した場合は何も書かない。
pub fn edit_file(path: &Path, operations: &[EditOperation]) -> Result<()> {
    let original = read_template(path)?;
    let edited = apply_all(&original, operations)?;
    write_text(path, &edited)?;
    info!("Applied {} edits to {}", operations.len(), path.display());
    Ok(())
}

fn update_splices(
    text: &str,
    record: &ElementRecord,
    content: Option<&str>,
    attributes: Option<&BTreeMap<String, String>>,
) -> Vec<Splice> {
    let mut splices = attributes
        .map(|changes| attribute_splices(record, changes))
        .unwrap_or_default();

    if let Some(content) = content {
        splices.push(content_splice(text, record, content));
    }

    splices
}

/// 属性の追加・上書き
///
/// 既存の属性は元の名前と引用符を保って値だけ差し替え、新しい属性は
/// 最後の属性の後ろにまとめて挿入する。
fn attribute_splices(record: &ElementRecord, changes: &BTreeMap<String, String>) -> Vec<Splice> {
    let mut splices = Vec::new();
    let mut added = String::new();

    for (name, value) in changes {
        match record.attribute(name) {
            Some(attr) => match (attr.value_span, attr.quote) {
                (Some(span), Some(quote)) => {
                    splices.push(Splice::replace(span, escape_attribute(value, quote)));
                }
                _ => splices.push(Splice::replace(
                    attr.span,
                    format!("{}=\"{}\"", attr.name, escape_attribute(value, '"')),
                )),
            },
            None => {
                added.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value, '"')));
            }
        }
    }

    if !added.is_empty() {
        splices.push(Splice::insert(record.attribute_insert_point(), added));
    }
    splices
}

/// 内側の内容を置き換える。自己終了タグは開始・終了タグの組に展開する
fn content_splice(text: &str, record: &ElementRecord, content: &str) -> Splice {
    match record.inner {
        Some(inner) => Splice::replace(inner, content),
        None => {
            let closing = self_closing_marker(text, record);
            Splice::replace(closing, format!(">{}</{}>", content, record.tag))
        }
    }
}

/// 自己終了タグ末尾の `/>`（直前の空白を含む）
fn self_closing_marker(text: &str, record: &ElementRecord) -> Span {
    let end = record.start_tag.end;
    let slash = text[record.start_tag.start..end]
        .rfind("/>")
        .map(|p| record.start_tag.start + p)
        .unwrap_or(end);
    let start = text[..slash].trim_end().len().max(record.attribute_insert_point());
    Span::new(start, end)
}

fn wrap_splices(record: &ElementRecord, operation: &EditOperation) -> Result<Vec<Splice>> {
    let tag = operation.required_payload()?;
    if !is_valid_tag_name(tag) {
        return Err(MarkupError::InvalidArgument(format!(
            "'{}' is not a valid wrapper tag name",
            tag
        )));
    }

    let mut open = format!("<{}", tag);
    if let Some(changes) = &operation.attribute_changes {
        for (name, value) in changes {
            open.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value, '"')));
        }
    }
    open.push('>');

    Ok(vec![
        Splice::insert(record.outer.start, open),
        Splice::insert(record.outer.end, format!("</{}>", tag)),
    ])
}

fn append_splices(text: &str, record: &ElementRecord, operation: &EditOperation) -> Result<Vec<Splice>> {
    let markup = operation.required_payload()?;
    if Document::parse(markup).is_empty() {
        return Err(MarkupError::InvalidArgument(format!(
            "Append content is not markup: {}",
            markup
        )));
    }
    if operation.attribute_changes.is_some() {
        debug!("Append ignores attribute changes for {}", operation.target_path);
    }

    let splice = match record.inner {
        Some(inner) => Splice::insert(inner.end, markup),
        None => {
            let closing = self_closing_marker(text, record);
            Splice::replace(closing, format!(">{}</{}>", markup, record.tag))
        }
    };
    Ok(vec![splice])
}

fn is_valid_tag_name(tag: &str) -> bool {
    tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::structure::parse;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_wrap_with_attributes() {
        let html = "<button>Click</button>";
        let op = EditOperation::wrap("//button", "div").with_attribute("class", "wrapper");
        let result = apply(html, &op).unwrap();
        assert!(result.contains(r#"<div class="wrapper"><button>Click</button></div>"#));
    }

    #[test]
    fn test_update_content_and_attribute() {
        let html = "<div id='target'>Old Content</div>";
        let op = EditOperation::update("//div[@id='target']", Some("New Content"))
            .with_attribute("class", "updated");
        let result = apply(html, &op).unwrap();
        assert!(result.contains(r#"class="updated""#));
        assert!(result.contains("New Content"));
        assert!(!result.contains("Old Content"));
        assert_eq!(result, r#"<div id='target' class="updated">New Content</div>"#);
    }

    #[test]
    fn test_update_overwrites_existing_attribute_keeping_quote() {
        let html = "<a href='/old' title=x>t</a>";
        let op = EditOperation::update("//a", None)
            .with_attribute("href", "/it's")
            .with_attribute("title", "y");
        let result = apply(html, &op).unwrap();
        assert_eq!(result, r#"<a href='/it&#39;s' title="y">t</a>"#);
    }

    #[test]
    fn test_update_self_closing_with_content() {
        let html = r#"<Alert Level="info" />"#;
        let op = EditOperation::update("//Alert", Some("Saved"));
        assert_eq!(apply(html, &op).unwrap(), r#"<Alert Level="info">Saved</Alert>"#);
    }

    #[test]
    fn test_append_child() {
        let html = "<ul>\n  <li>One</li>\n</ul>";
        let op = EditOperation::append("/ul", "<li>Two</li>");
        let result = apply(html, &op).unwrap();
        assert_eq!(result, "<ul>\n  <li>One</li>\n<li>Two</li></ul>");

        let items = crate::analyzer::query(&result, "//li").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].inner_text, "Two");
    }

    #[test]
    fn test_append_non_markup_is_invalid() {
        let op = EditOperation::append("/ul", "just text");
        let err = apply("<ul></ul>", &op).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let op = EditOperation::wrap("//section", "div");
        let err = apply("<div></div>", &op).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Element not found at XPath: //section");
    }

    #[test]
    fn test_wrap_rejects_bad_tag() {
        let op = EditOperation::wrap("//p", "<div>");
        assert!(apply("<p></p>", &op).unwrap_err().is_invalid_argument());
        let op = EditOperation::wrap("//p", "  ");
        assert!(apply("<p></p>", &op).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_razor_code_survives_edits() {
        let razor = "@page \"/\"\n<h1>Title</h1>\n@if (show)\n{\n    <p>Shown</p>\n}\n@code {\n    bool show = true;\n}";
        let op = EditOperation::update("//h1", Some("Renamed"));
        let result = apply(razor, &op).unwrap();
        assert_eq!(result, razor.replace("<h1>Title</h1>", "<h1>Renamed</h1>"));
    }

    #[test]
    fn test_apply_all_sees_previous_edits() {
        let html = "<main><p>x</p></main>";
        let ops = vec![
            EditOperation::wrap("//p", "section"),
            EditOperation::update("/main/section", None).with_attribute("id", "s1"),
            EditOperation::append("//section[@id='s1']", "<p>y</p>"),
        ];
        let result = apply_all(html, &ops).unwrap();
        assert_eq!(result, r#"<main><section id="s1"><p>x</p><p>y</p></section></main>"#);
    }

    #[test]
    fn test_unmodified_round_trip_keeps_shape() {
        let html = r#"<div class="a"><span id="s">t</span><br/></div>"#;
        let op = EditOperation::update("//span", None);
        let result = apply(html, &op).unwrap();
        let before = parse(html);
        let after = parse(&result);
        assert!(before.iter().zip(&after).all(|(a, b)| a.same_shape(b)));
    }

    #[test]
    fn test_edit_file_writes_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Page.razor");
        fs::write(&path, "<p>old</p>").unwrap();

        edit_file(&path, &[EditOperation::update("//p", Some("new"))]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>new</p>");

        let err = edit_file(&path, &[EditOperation::update("//nope", Some("x"))]).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>new</p>", "失敗時は書き込まない");
    }
}
