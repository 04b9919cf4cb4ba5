use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PathMatcher;
use crate::error::{MarkupError, Result};

pub const BACKUP_SUFFIX: &str = ".bak";

/// パスの末尾に接尾辞を付け足す（置換ではない）
/// 例: "Counter.razor" + ".css" -> "Counter.razor.css"
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// 最後の拡張子を除いたファイル名
/// 例: "Counter.razor" -> "Counter"
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MarkupError::io(path, e))
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| MarkupError::io(path, e))
}

/// `.bak` を作る。既に存在する場合は最初のバックアップを残す
pub fn backup_once(path: &Path, original: &str) -> Result<bool> {
    let backup = append_suffix(path, BACKUP_SUFFIX);
    if backup.exists() {
        return Ok(false);
    }
    write_text(&backup, original)?;
    Ok(true)
}

/// `.bak` を常に書き直す
pub fn backup_overwrite(path: &Path, original: &str) -> Result<()> {
    write_text(&append_suffix(path, BACKUP_SUFFIX), original)
}

/// ディレクトリが存在することを確認する
pub fn require_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(MarkupError::FileNotFound(dir.to_path_buf()))
    }
}

/// 拡張子が一致するファイルを再帰的に収集する
///
/// 読めないディレクトリは黙って飛ばす。matcherがない場合は
/// ドットディレクトリとビルド出力（bin/obj/node_modules）を除外する。
pub fn collect_files(
    dir: &Path,
    root: &Path,
    path_matcher: Option<&PathMatcher>,
    extensions: &[&str],
    recursive: bool,
    files: &mut Vec<PathBuf>,
) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let relative_path = path.strip_prefix(root).unwrap_or(&path);

            if path.is_dir() {
                if !recursive {
                    continue;
                }
                if let Some(matcher) = path_matcher {
                    if !matcher.should_traverse_dir(relative_path) {
                        continue;
                    }
                } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with('.')
                        || name == "bin"
                        || name == "obj"
                        || name == "node_modules"
                    {
                        continue;
                    }
                }
                collect_files(&path, root, path_matcher, extensions, recursive, files);
            } else {
                let ext_match = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
                    .unwrap_or(false);

                if ext_match {
                    if let Some(matcher) = path_matcher {
                        if !matcher.should_include(relative_path) {
                            continue;
                        }
                    }
                    files.push(path);
                }
            }
        }
    }
}

/// `dir` 以下の対象ファイルを名前順で返す
pub fn find_files(dir: &Path, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>> {
    require_dir(dir)?;
    let mut files = Vec::new();
    collect_files(dir, dir, None, extensions, recursive, &mut files);
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_suffix() {
        assert_eq!(
            append_suffix(Path::new("Pages/Counter.razor"), ".css"),
            PathBuf::from("Pages/Counter.razor.css")
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("Pages/Counter.razor")), "Counter");
        assert_eq!(file_stem(Path::new("Main.Layout.razor")), "Main.Layout");
    }

    #[test]
    fn test_find_files_skips_build_output() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Pages")).unwrap();
        fs::create_dir_all(root.join("obj/Debug")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("App.razor"), "").unwrap();
        fs::write(root.join("Pages/Index.RAZOR"), "").unwrap();
        fs::write(root.join("Pages/Index.razor.css"), "").unwrap();
        fs::write(root.join("obj/Debug/Gen.razor"), "").unwrap();
        fs::write(root.join(".git/x.razor"), "").unwrap();

        let files = find_files(root, &["razor"], true).unwrap();
        assert_eq!(files, vec![root.join("App.razor"), root.join("Pages/Index.RAZOR")]);

        let top_only = find_files(root, &["razor"], false).unwrap();
        assert_eq!(top_only, vec![root.join("App.razor")]);
    }

    #[test]
    fn test_find_files_missing_dir() {
        let dir = tempdir().unwrap();
        let err = find_files(&dir.path().join("nope"), &["razor"], true).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_backup_once_keeps_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("A.razor");

        assert!(backup_once(&path, "first").unwrap());
        assert!(!backup_once(&path, "second").unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("A.razor.bak")).unwrap(), "first");

        backup_overwrite(&path, "third").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("A.razor.bak")).unwrap(), "third");
    }

    #[test]
    fn test_read_missing_template_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_template(&dir.path().join("Missing.razor")).unwrap_err();
        assert!(err.is_not_found());
    }
}
