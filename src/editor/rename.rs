//! クラス名の一括置換

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::{apply_splices, escape_attribute, Splice};
use crate::analyzer::class_usage::is_class_attribute;
use crate::analyzer::structure::Document;
use crate::error::{MarkupError, Result};
use crate::model::BatchItemError;
use crate::util::{backup_once, find_files, read_template, write_text};

/// class属性中の `old_class` と完全一致するトークンだけを置き換える
///
/// `btn` の置換は `btn-primary` に影響しない。区切りの空白はそのまま残す。
pub fn rename_class_usage(text: &str, old_class: &str, new_class: &str) -> String {
    rename_class_usage_counted(text, old_class, new_class).0
}

/// 置換結果と置換したトークン数
pub fn rename_class_usage_counted(text: &str, old_class: &str, new_class: &str) -> (String, usize) {
    let doc = Document::parse(text);
    let mut splices = Vec::new();
    let mut total = 0;

    for (_, record) in doc.iter() {
        for attr in record.attributes.iter().filter(|a| is_class_attribute(&a.name)) {
            let (Some(value), Some(span)) = (attr.value.as_deref(), attr.value_span) else {
                continue;
            };
            let replacement = escape_attribute(new_class, attr.quote.unwrap_or('"'));
            let (renamed, count) = replace_tokens(value, old_class, &replacement);
            if count > 0 {
                total += count;
                splices.push(Splice::replace(span, renamed));
            }
        }
    }

    if total == 0 {
        return (text.to_string(), 0);
    }
    (apply_splices(text, splices), total)
}

fn replace_tokens(value: &str, old: &str, new: &str) -> (String, usize) {
    let mut out = String::with_capacity(value.len());
    let mut count = 0;
    let mut token_start = None;

    let mut flush = |token: &str, out: &mut String| {
        if token == old {
            out.push_str(new);
            count += 1;
        } else {
            out.push_str(token);
        }
    };

    for (i, c) in value.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = token_start.take() {
                flush(&value[start..i], &mut out);
            }
            out.push(c);
        } else if token_start.is_none() {
            token_start = Some(i);
        }
    }
    if let Some(start) = token_start {
        flush(&value[start..], &mut out);
    }

    (out, count)
}

/// 一括置換の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub processed: usize,
    pub modified_files: Vec<PathBuf>,
    pub errors: Vec<BatchItemError>,
    pub total_replacements: usize,
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch Rename Complete. Processed: {}, Modified: {}, Replacements: {}, Errors: {}",
            self.processed,
            self.modified_files.len(),
            self.total_replacements,
            self.errors.len()
        )?;
        for file in &self.modified_files {
            writeln!(f, "[OK] {}", file.display())?;
        }
        for error in &self.errors {
            writeln!(f, "[ERROR] {}: {}", error.path.display(), error.reason)?;
        }
        Ok(())
    }
}

fn validate_class_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        return Err(MarkupError::InvalidArgument(format!(
            "{} class name must be a single non-empty token, got '{}'",
            kind, name
        )));
    }
    Ok(())
}

/// ディレクトリ内の全 `.razor` でクラス名を置換する
///
/// 変更したファイルは書き込む前に `.bak` を作る（既にあれば残す）。
/// 1ファイルの失敗は記録して次へ進む。
pub fn batch_rename_class(
    dir: &Path,
    old_class: &str,
    new_class: &str,
    recursive: bool,
) -> Result<RenameReport> {
    validate_class_name("old", old_class)?;
    validate_class_name("new", new_class)?;

    let mut report = RenameReport::default();
    for file in find_files(dir, &["razor"], recursive)? {
        report.processed += 1;
        match rename_in_file(&file, old_class, new_class) {
            Ok(0) => {}
            Ok(count) => {
                report.total_replacements += count;
                report.modified_files.push(file);
            }
            Err(e) => {
                warn!("Rename failed for {}: {}", file.display(), e);
                report.errors.push(BatchItemError::new(&file, e));
            }
        }
    }

    info!(
        "Renamed '{}' -> '{}' in {} files ({} replacements)",
        old_class,
        new_class,
        report.modified_files.len(),
        report.total_replacements
    );
    Ok(report)
}

fn rename_in_file(file: &Path, old_class: &str, new_class: &str) -> Result<usize> {
    let original = read_template(file)?;
    let (renamed, count) = rename_class_usage_counted(&original, old_class, new_class);
    if count > 0 {
        backup_once(file, &original)?;
        write_text(file, &renamed)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_whole_token_only() {
        let html = r#"<button class="btn btn-primary">x</button><a class="btn">y</a>"#;
        let (result, count) = rename_class_usage_counted(html, "btn", "button-base");
        assert_eq!(count, 2);
        assert_eq!(
            result,
            r#"<button class="button-base btn-primary">x</button><a class="button-base">y</a>"#
        );
    }

    #[test]
    fn test_separators_preserved() {
        let html = "<div class=\"  a\tbtn  b \"></div>";
        let result = rename_class_usage(html, "btn", "c");
        assert_eq!(result, "<div class=\"  a\tc  b \"></div>");
    }

    #[test]
    fn test_css_class_parameter_and_other_attributes() {
        let html = r#"<NavLink CssClass="btn" title="btn">x</NavLink>"#;
        let result = rename_class_usage(html, "btn", "link");
        assert_eq!(result, r#"<NavLink CssClass="link" title="btn">x</NavLink>"#);
    }

    #[test]
    fn test_no_match_returns_input() {
        let html = "<p class=\"x\">@code { }</p>";
        assert_eq!(rename_class_usage_counted(html, "y", "z"), (html.to_string(), 0));
    }

    #[test]
    fn test_batch_rename_with_backup() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("A.razor");
        let b = dir.path().join("B.razor");
        fs::write(&a, r#"<p class="old keep">a</p>"#).unwrap();
        fs::write(&b, r#"<p class="keep">b</p>"#).unwrap();

        let report = batch_rename_class(dir.path(), "old", "new", true).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.modified_files, vec![a.clone()]);
        assert_eq!(report.total_replacements, 1);
        assert!(report.errors.is_empty());

        assert_eq!(fs::read_to_string(&a).unwrap(), r#"<p class="new keep">a</p>"#);
        assert_eq!(
            fs::read_to_string(dir.path().join("A.razor.bak")).unwrap(),
            r#"<p class="old keep">a</p>"#
        );
        assert!(!dir.path().join("B.razor.bak").exists());

        // 2回目は最初のバックアップを上書きしない
        batch_rename_class(dir.path(), "new", "newer", true).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("A.razor.bak")).unwrap(),
            r#"<p class="old keep">a</p>"#
        );
    }

    #[test]
    fn test_batch_rename_invalid_names() {
        let dir = tempdir().unwrap();
        let err = batch_rename_class(dir.path(), "", "x", true).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = batch_rename_class(dir.path(), "a b", "x", true).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = batch_rename_class(dir.path(), "a", "x\"y", true).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = batch_rename_class(dir.path(), "a", "x'y", true).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_quote_in_new_name_is_escaped() {
        let html = r#"<p class="a b">x</p><p class='a'>y</p>"#;
        let result = rename_class_usage(html, "a", "x\"y'z");
        assert_eq!(result, r#"<p class="x&quot;y'z b">x</p><p class='x"y&#39;z'>y</p>"#);
        assert_eq!(crate::analyzer::parse(&result).len(), 2);
    }

    #[test]
    fn test_batch_rename_missing_dir() {
        let dir = tempdir().unwrap();
        let err = batch_rename_class(&dir.path().join("nope"), "a", "b", true).unwrap_err();
        assert!(err.is_not_found());
    }
}
