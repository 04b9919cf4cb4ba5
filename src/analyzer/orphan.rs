//! 孤立クラスの検出
//!
//! テンプレートが使っているのに、対になるスタイルシート（`Foo.razor.css`）で
//! 定義されていないクラスを報告する。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use super::class_usage::used_classes;
use super::stylesheet::defined_classes;
use crate::config::RazorConfig;
use crate::error::Result;
use crate::util::{append_suffix, read_template};

/// 対になるスタイルシートの接尾辞
pub const STYLESHEET_SUFFIX: &str = ".css";

/// 孤立判定から除外するクラスの設定
///
/// 呼び出し側が一度だけ組み立てて渡す。グローバルな状態は持たない。
#[derive(Debug, Clone, Default)]
pub struct OrphanOptions {
    /// 外部（共通CSSなど）で定義済みとみなすクラス
    pub whitelist: BTreeSet<String>,
    /// 一致したクラスを無視する正規表現
    pub ignore_patterns: Vec<Regex>,
}

impl OrphanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.ignore_patterns.extend(patterns);
        self
    }

    /// 設定の `globalCss` と `ignoreFile` から組み立てる
    ///
    /// どちらも無い・読めない場合は空のまま続行する。
    pub fn from_config(config: &RazorConfig) -> Self {
        let mut options = Self::new().with_ignore_patterns(load_ignore_patterns(&config.ignore_file));
        if let Some(global_css) = &config.global_css {
            match load_global_whitelist(global_css) {
                Ok(whitelist) => options.whitelist.extend(whitelist),
                Err(e) => warn!("Global stylesheet unavailable, whitelist is empty: {}", e),
            }
        }
        options
    }

    pub fn is_excluded(&self, class: &str) -> bool {
        self.whitelist.contains(class) || self.ignore_patterns.iter().any(|p| p.is_match(class))
    }
}

/// 無視パターンを解析する（1行1正規表現、空行と `#` 行は読み飛ばす）
pub fn parse_ignore_patterns(content: &str) -> Vec<Regex> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Regex::new(line) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Skipping invalid ignore pattern '{}': {}", line, e);
                None
            }
        })
        .collect()
}

/// 無視パターンファイルを読む。ファイルが無ければ空
pub fn load_ignore_patterns(path: &Path) -> Vec<Regex> {
    match fs::read_to_string(path) {
        Ok(content) => parse_ignore_patterns(&content),
        Err(e) => {
            debug!("No ignore patterns loaded from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// 共通スタイルシートで定義されたクラスを集める
pub fn load_global_whitelist(path: &Path) -> Result<BTreeSet<String>> {
    let css = read_template(path)?;
    Ok(defined_classes(&css))
}

/// `Foo.razor` に対する `Foo.razor.css`
pub fn companion_stylesheet(template: &Path) -> PathBuf {
    append_suffix(template, STYLESHEET_SUFFIX)
}

/// 使用クラスから定義済み・除外対象を引いた残り（昇順）
pub fn find_orphans(template: &str, stylesheet: Option<&str>, options: &OrphanOptions) -> Vec<String> {
    let defined = stylesheet.map(defined_classes).unwrap_or_default();
    used_classes(template)
        .into_iter()
        .filter(|class| !defined.contains(class) && !options.is_excluded(class))
        .collect()
}

/// テンプレートファイルの孤立クラスを検出する
///
/// スタイルシートが無い場合は使用クラスがすべて孤立として返る（エラーではない）。
pub fn scan_orphans(template_path: &Path, options: &OrphanOptions) -> Result<Vec<String>> {
    let template = read_template(template_path)?;

    let css_path = companion_stylesheet(template_path);
    let stylesheet = if css_path.exists() {
        Some(read_template(&css_path)?)
    } else {
        debug!("No companion stylesheet for {}", template_path.display());
        None
    };

    Ok(find_orphans(&template, stylesheet.as_deref(), options))
}
