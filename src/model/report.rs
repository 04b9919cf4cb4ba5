use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// バッチ処理中の1ファイル分の失敗
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    pub path: PathBuf,
    pub reason: String,
}

impl BatchItemError {
    pub fn new(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum BatchItemStatus {
    Ok,
    Skipped(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: BatchItemStatus,
}

/// 複数ファイル処理の結果。1件の失敗で残りを止めない
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn push(&mut self, path: &Path, status: BatchItemStatus) {
        self.items.push(BatchItem {
            path: path.to_path_buf(),
            status,
        });
    }

    pub fn processed(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, BatchItemStatus::Ok))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, BatchItemStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, BatchItemStatus::Error(_)))
    }

    pub fn errors(&self) -> Vec<BatchItemError> {
        self.items
            .iter()
            .filter_map(|item| match &item.status {
                BatchItemStatus::Error(reason) => Some(BatchItemError::new(&item.path, reason)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&BatchItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch Complete. Processed: {}, Success: {}, Skipped: {}, Failed: {}",
            self.processed(),
            self.succeeded(),
            self.skipped(),
            self.failed()
        )?;
        for item in &self.items {
            let name = item
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| item.path.display().to_string());
            match &item.status {
                BatchItemStatus::Ok => writeln!(f, "[OK] {}", name)?,
                BatchItemStatus::Skipped(reason) => writeln!(f, "[SKIP] {} ({})", name, reason)?,
                BatchItemStatus::Error(reason) => writeln!(f, "[ERROR] {}: {}", name, reason)?,
            }
        }
        Ok(())
    }
}
