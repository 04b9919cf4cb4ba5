//! ディレクトリ単位の解析

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::class_usage::used_classes;
use super::orphan::{companion_stylesheet, scan_orphans, OrphanOptions};
use super::structure::Document;
use crate::error::Result;
use crate::util::{find_files, read_template};

/// クラス使用の走査対象
pub const MARKUP_EXTENSIONS: &[&str] = &["razor", "cshtml", "html"];

pub const TEMPLATE_EXTENSION: &str = "razor";

/// ディレクトリ内の全マークアップファイルの使用クラス（昇順）
///
/// 読めないファイルは飛ばす。
pub fn used_classes_in_dir(dir: &Path, recursive: bool) -> Result<Vec<String>> {
    let mut all = BTreeSet::new();
    for file in find_files(dir, MARKUP_EXTENSIONS, recursive)? {
        match read_template(&file) {
            Ok(text) => all.extend(used_classes(&text)),
            Err(e) => debug!("Skipping unreadable file: {}", e),
        }
    }
    Ok(all.into_iter().collect())
}

/// ディレクトリ内の全テンプレートの孤立クラス（重複なし、昇順）
pub fn scan_orphans_in_dir(dir: &Path, recursive: bool, options: &OrphanOptions) -> Result<Vec<String>> {
    let mut all = BTreeSet::new();
    for file in find_files(dir, &[TEMPLATE_EXTENSION], recursive)? {
        match scan_orphans(&file, options) {
            Ok(orphans) => all.extend(orphans),
            Err(e) => debug!("Skipping {}: {}", file.display(), e),
        }
    }
    Ok(all.into_iter().collect())
}

/// 監査結果の1ファイル分（孤立クラスがあるか、失敗したファイルのみ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphans: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub files_scanned: usize,
    pub parse_errors: usize,
    pub files_with_orphans: usize,
    pub total_orphans: usize,
    pub entries: Vec<AuditEntry>,
}

/// 全テンプレートを解析し、スタイルシートを持つものは孤立クラスも調べる
pub fn audit(dir: &Path, options: &OrphanOptions) -> Result<AuditReport> {
    let files = find_files(dir, &[TEMPLATE_EXTENSION], true)?;
    info!("Auditing {} templates under {}", files.len(), dir.display());

    let mut report = AuditReport {
        files_scanned: files.len(),
        ..Default::default()
    };

    for file in files {
        let relative = file.strip_prefix(dir).unwrap_or(&file).to_path_buf();
        match audit_file(&file, options) {
            Ok(orphans) if orphans.is_empty() => {}
            Ok(orphans) => {
                report.files_with_orphans += 1;
                report.total_orphans += orphans.len();
                report.entries.push(AuditEntry {
                    file: relative,
                    orphans,
                    error: None,
                });
            }
            Err(e) => {
                report.parse_errors += 1;
                report.entries.push(AuditEntry {
                    file: relative,
                    orphans: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(report)
}

fn audit_file(file: &Path, options: &OrphanOptions) -> Result<Vec<String>> {
    let text = read_template(file)?;
    let doc = Document::parse(&text);
    debug!("{}: {} elements", file.display(), doc.len());

    if companion_stylesheet(file).exists() {
        scan_orphans(file, options)
    } else {
        Ok(Vec::new())
    }
}

/// 1ファイルにつき表示する孤立クラスの上限
const PREVIEW_LIMIT: usize = 5;

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "FILE: {}", entry.file.display())?;
            if let Some(error) = &entry.error {
                writeln!(f, "  [Critical] Parse Error: {}", error)?;
                continue;
            }
            writeln!(
                f,
                "  [Warning] Found {} potential orphan classes:",
                entry.orphans.len()
            )?;
            for orphan in entry.orphans.iter().take(PREVIEW_LIMIT) {
                writeln!(f, "    - {}", orphan)?;
            }
            if entry.orphans.len() > PREVIEW_LIMIT {
                writeln!(f, "    ... and {} more.", entry.orphans.len() - PREVIEW_LIMIT)?;
            }
        }
        writeln!(f, "Audit Complete.")?;
        writeln!(f, "Files Scanned: {}", self.files_scanned)?;
        writeln!(f, "Parse Errors: {}", self.parse_errors)?;
        if self.total_orphans > 0 {
            writeln!(
                f,
                "Orphan Warnings: {} classes in {} files.",
                self.total_orphans, self.files_with_orphans
            )?;
        }
        Ok(())
    }
}
