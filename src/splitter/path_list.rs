use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::util::read_template;

/// パス一覧を解析する
///
/// `[` で始まればJSONの文字列配列、それ以外（またはJSONとして壊れている場合）は1行1パス。
/// 空行は除く。
pub fn parse_path_list(content: &str) -> Vec<PathBuf> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(paths) => {
                return paths
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            Err(e) => warn!("Path list looks like JSON but failed to parse ({}); reading lines", e),
        }
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn load_path_list(path: &Path) -> Result<Vec<PathBuf>> {
    Ok(parse_path_list(&read_template(path)?))
}
