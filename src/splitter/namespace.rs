//! 分離したコードビハインドの名前空間を決める

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// 手がかりが何もない場合の名前空間
pub const DEFAULT_NAMESPACE: &str = "MyApp.Components";

pub const PROJECT_FILE_EXTENSION: &str = "csproj";

static NAMESPACE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@namespace\s+([\w.]+)").unwrap());

/// テンプレート内の `@namespace A.B.C`
pub fn explicit_namespace(text: &str) -> Option<String> {
    NAMESPACE_DIRECTIVE
        .captures(text)
        .map(|caps| caps[1].trim_end_matches('.').to_string())
        .filter(|ns| !ns.is_empty())
}

/// `start` から親へ辿って最初に見つかった `*.csproj`（同じ階層に複数あれば名前順で先頭）
pub fn find_project_file(start: &Path) -> Option<PathBuf> {
    let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

    for dir in start.ancestors() {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        let mut projects: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|e| e.eq_ignore_ascii_case(PROJECT_FILE_EXTENSION))
            })
            .collect();
        projects.sort();
        if let Some(project) = projects.into_iter().next() {
            return Some(project);
        }
    }
    None
}

/// プロジェクト名と相対ディレクトリから名前空間を組み立てる
/// 例: `App.csproj` のある場所から `Pages/Admin` -> `App.Pages.Admin`
pub fn infer_namespace(template_dir: &Path) -> Option<String> {
    let project = find_project_file(template_dir)?;
    let project_name = project.file_stem()?.to_string_lossy().into_owned();
    let project_dir = project.parent()?;

    let dir = fs::canonicalize(template_dir).unwrap_or_else(|_| template_dir.to_path_buf());
    let mut segments = vec![sanitize_identifier(&project_name)];
    if let Ok(relative) = dir.strip_prefix(project_dir) {
        segments.extend(
            relative
                .components()
                .map(|c| sanitize_identifier(&c.as_os_str().to_string_lossy())),
        );
    }

    debug!("Inferred namespace from {}", project.display());
    Some(segments.join("."))
}

/// 明示指定 → プロジェクトからの推定 → 既定値 の順で決める
pub fn resolve_namespace(text: &str, template_path: &Path) -> String {
    if let Some(ns) = explicit_namespace(text) {
        return ns;
    }
    let dir = match template_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    infer_namespace(dir).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

/// C#識別子に使えない文字を `_` に置き換える
pub fn sanitize_identifier(segment: &str) -> String {
    let mut ident: String = segment
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
