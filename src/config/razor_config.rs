use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::path_matcher::PathMatcher;
use crate::error::Result;
use crate::util::{collect_files, require_dir};

pub const CONFIG_FILE_NAME: &str = "razormarkup.json";

/// razormarkup.json の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorConfig {
    /// 対象のglobパターン（空の場合は全ファイル対象）
    #[serde(default)]
    pub include: Vec<String>,
    /// 除外対象のglobパターン
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// サブディレクトリも走査する（デフォルト: true）
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// プロジェクト共通のスタイルシート。ここで定義されたクラスは孤立扱いしない
    #[serde(default)]
    pub global_css: Option<PathBuf>,
    /// 無視パターン（1行1正規表現）のファイル
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,
    /// テンプレートの拡張子
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_ignore_file() -> PathBuf {
    PathBuf::from("tailwind-ignore.txt")
}

fn default_extensions() -> Vec<String> {
    vec!["razor".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/bin".to_string(),
        "**/bin/**".to_string(),
        "**/obj".to_string(),
        "**/obj/**".to_string(),
        "**/node_modules".to_string(),
        "**/node_modules/**".to_string(),
        "**/.*".to_string(),
        "**/.*/**".to_string(),
    ]
}

impl Default for RazorConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
            recursive: default_true(),
            global_css: None,
            ignore_file: default_ignore_file(),
            extensions: default_extensions(),
        }
    }
}

impl RazorConfig {
    /// 指定ディレクトリからrazormarkup.jsonを読み込む
    ///
    /// 相対パスの `globalCss` / `ignoreFile` はそのディレクトリ基準に解決する。
    pub fn load_from_dir(dir: &Path) -> Self {
        let mut config = Self::load_from_path(&dir.join(CONFIG_FILE_NAME));
        if let Some(global_css) = &config.global_css {
            if global_css.is_relative() {
                config.global_css = Some(dir.join(global_css));
            }
        }
        if config.ignore_file.is_relative() {
            config.ignore_file = dir.join(&config.ignore_file);
        }
        config
    }

    /// 指定パスから読み込む。無い・壊れている場合はデフォルト
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", CONFIG_FILE_NAME, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", CONFIG_FILE_NAME, e);
                Self::default()
            }
        }
    }

    pub fn create_path_matcher(&self) -> Result<PathMatcher> {
        PathMatcher::new(&self.include, &self.exclude)
    }

    pub fn extension_refs(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }

    /// include/exclude と拡張子に従って `dir` 以下のテンプレートを名前順で返す
    pub fn template_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        require_dir(dir)?;
        let matcher = self.create_path_matcher()?;
        let mut files = Vec::new();
        collect_files(dir, dir, Some(&matcher), &self.extension_refs(), self.recursive, &mut files);
        files.sort();
        Ok(files)
    }
}
