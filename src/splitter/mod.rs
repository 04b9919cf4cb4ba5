//! テンプレートをマークアップ・コードビハインド・スタイルシートへ分離する

pub mod namespace;
pub mod path_list;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::analyzer::blocks::{extract_style_block, find_code_regions, remove_all_blocks};
use crate::analyzer::orphan::companion_stylesheet;
use crate::analyzer::project::TEMPLATE_EXTENSION;
use crate::error::{MarkupError, Result};
use crate::model::{BatchItemStatus, BatchReport};
use crate::util::{append_suffix, file_stem, find_files, read_template, write_text};

pub use namespace::resolve_namespace;
pub use path_list::{load_path_list, parse_path_list};

/// コードビハインドの接尾辞（`Counter.razor` -> `Counter.razor.cs`）
pub const CODE_BEHIND_SUFFIX: &str = ".cs";

const CODE_INDENT: &str = "        ";

pub fn code_behind_path(template: &Path) -> PathBuf {
    append_suffix(template, CODE_BEHIND_SUFFIX)
}

/// partialクラスとしてのコードビハインドを組み立てる
pub fn render_code_behind(namespace: &str, class_name: &str, code: &str) -> String {
    let mut body = String::new();
    for line in dedent(code).lines() {
        if !line.trim().is_empty() {
            body.push_str(CODE_INDENT);
            body.push_str(line);
        }
        body.push('\n');
    }

    format!(
        "using System;
using System.Collections.Generic;
using System.Linq;
using Microsoft.AspNetCore.Components;

namespace {namespace}
{{
    public partial class {class_name}
    {{
{body}    }}
}}
"
    )
}

/// 切り出したコードは先頭行だけトリム済みなので、2行目以降の共通インデントを外す
fn dedent(code: &str) -> String {
    let mut lines = code.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = first.to_string();
    for line in rest {
        out.push('\n');
        out.push_str(line.get(indent..).unwrap_or_else(|| line.trim_start()));
    }
    out
}

/// 1ファイルを分離する
///
/// コードブロックがあれば `<path>.cs`、スタイルがあれば `<path>.css` を書き、
/// 元ファイルはブロックを除いたマークアップで上書きする。
/// 書き出し先が既に存在する場合は何も書かずに `AlreadyExists` を返す。
pub fn split_file(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(MarkupError::FileNotFound(path.to_path_buf()));
    }
    let content = read_template(path)?;
    let stem = file_stem(path);

    let code = find_code_regions(&content)
        .into_iter()
        .map(|region| region.raw_content)
        .filter(|code| !code.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let style = extract_style_block(&content).filter(|s| !s.trim().is_empty());

    let cs_path = code_behind_path(path);
    let css_path = companion_stylesheet(path);
    if !code.is_empty() && cs_path.exists() {
        return Err(MarkupError::AlreadyExists(cs_path));
    }
    if style.is_some() && css_path.exists() {
        return Err(MarkupError::AlreadyExists(css_path));
    }

    if !code.is_empty() {
        let namespace = resolve_namespace(&content, path);
        let class_name = namespace::sanitize_identifier(&stem);
        write_text(&cs_path, &render_code_behind(&namespace, &class_name, &code))?;
        info!("Wrote {} (namespace {})", cs_path.display(), namespace);
    }

    if let Some(style) = style {
        write_text(&css_path, &style)?;
        info!("Wrote {}", css_path.display());
    }

    write_text(path, &remove_all_blocks(&content))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.{}", stem, TEMPLATE_EXTENSION));
    Ok(format!("Successfully split {}", name))
}

/// 複数ファイルを順に分離する。存在しないファイルはスキップ、失敗は記録して続行
pub fn batch_split<I>(paths: I) -> BatchReport
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let mut report = BatchReport::default();
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            report.push(path, BatchItemStatus::Skipped("Not Found".to_string()));
            continue;
        }
        match split_file(path) {
            Ok(_) => report.push(path, BatchItemStatus::Ok),
            Err(e) => {
                warn!("Split failed for {}: {}", path.display(), e);
                report.push(path, BatchItemStatus::Error(e.to_string()));
            }
        }
    }
    report
}

/// パス一覧ファイル（JSON配列または1行1パス）に従って分離する
pub fn batch_split_from_list_file(list_path: &Path) -> Result<BatchReport> {
    let paths = load_path_list(list_path)?;
    Ok(batch_split(paths))
}

/// ファイルなら分離、ディレクトリなら配下の全テンプレートを分離する
pub fn split_path(path: &Path) -> Result<String> {
    if path.is_dir() {
        let files = find_files(path, &[TEMPLATE_EXTENSION], true)?;
        return Ok(batch_split(files).to_string());
    }
    split_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const COUNTER: &str = r#"@page "/counter"
@namespace Demo.Pages

<h1>Counter</h1>

@code {
    private int count = 0;
}

<style>
    h1 { color: red; }
</style>
"#;

    #[test]
    fn test_split_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Counter.razor");
        fs::write(&path, COUNTER).unwrap();

        let message = split_file(&path).unwrap();
        assert_eq!(message, "Successfully split Counter.razor");

        let residual = fs::read_to_string(&path).unwrap();
        assert!(!residual.contains("@code"));
        assert!(!residual.contains("<style>"));
        assert!(residual.contains("<h1>Counter</h1>"));

        let cs = fs::read_to_string(dir.path().join("Counter.razor.cs")).unwrap();
        assert!(cs.contains("namespace Demo.Pages"));
        assert!(cs.contains("public partial class Counter"));
        assert!(cs.contains("        private int count = 0;\n"));
        assert!(cs.starts_with("using System;\n"));

        let css = fs::read_to_string(dir.path().join("Counter.razor.css")).unwrap();
        assert_eq!(css, "h1 { color: red; }");
    }

    #[test]
    fn test_split_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Counter.razor");
        fs::write(&path, COUNTER).unwrap();
        fs::write(dir.path().join("Counter.razor.cs"), "// existing").unwrap();

        let err = split_file(&path).unwrap_err();
        assert!(matches!(err, MarkupError::AlreadyExists(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), COUNTER, "元ファイルは変更しない");
        assert!(!dir.path().join("Counter.razor.css").exists());
    }

    #[test]
    fn test_split_markup_only_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Plain.razor");
        fs::write(&path, "\n<p>only markup</p>\n").unwrap();

        split_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>only markup</p>");
        assert!(!dir.path().join("Plain.razor.cs").exists());
        assert!(!dir.path().join("Plain.razor.css").exists());
    }

    #[test]
    fn test_split_missing_file() {
        let dir = tempdir().unwrap();
        let err = split_file(&dir.path().join("Nope.razor")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_batch_split_report() {
        let dir = tempdir().unwrap();
        let ok = dir.path().join("A.razor");
        let taken = dir.path().join("B.razor");
        fs::write(&ok, "<p>a</p>@code { int a; }").unwrap();
        fs::write(&taken, "<p>b</p>@code { int b; }").unwrap();
        fs::write(dir.path().join("B.razor.cs"), "").unwrap();

        let report = batch_split([ok.clone(), dir.path().join("Missing.razor"), taken.clone()]);
        assert_eq!(report.processed(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);

        let text = report.to_string();
        assert!(text.contains("[OK] A.razor"));
        assert!(text.contains("[SKIP] Missing.razor (Not Found)"));
        assert!(text.contains("[ERROR] B.razor:"));
    }

    #[test]
    fn test_render_code_behind_dedents() {
        let code = "int a = 1;\n    void M()\n    {\n    }";
        let rendered = render_code_behind("N", "C", code);
        assert!(rendered.contains("        int a = 1;\n        void M()\n        {\n        }\n    }\n}\n"));
    }

    #[test]
    fn test_functions_block_kept_in_code_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Legacy.razor");
        fs::write(&path, "@namespace X\n<p></p>\n@functions { int legacy; }").unwrap();

        split_file(&path).unwrap();
        let cs = fs::read_to_string(dir.path().join("Legacy.razor.cs")).unwrap();
        assert!(cs.contains("int legacy;"));
    }
}
