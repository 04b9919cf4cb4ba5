use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// テンプレート操作のエラー
///
/// 解析時の不正な断片（ParseRecoverable）やブレースの不一致（BlockUnbalanced）は
/// ここには現れない。どちらも呼び出し側に返さずテキスト扱い／スキップで吸収する。
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Element not found at XPath: {0}")]
    ElementNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid path query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Refusing to overwrite existing file: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl MarkupError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return MarkupError::FileNotFound(path.to_path_buf());
        }
        MarkupError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// 対象（ファイル・要素）が見つからない系のエラーか
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MarkupError::FileNotFound(_) | MarkupError::ElementNotFound(_)
        )
    }

    /// 呼び出し側の引数不備によるエラーか
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            MarkupError::InvalidArgument(_) | MarkupError::InvalidQuery { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MarkupError>;
