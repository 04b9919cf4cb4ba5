use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{MarkupError, Result};

/// include/excludeのglobでテンプレートを選別する
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathMatcher {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_set("include", include)?)
        };

        Ok(Self {
            include,
            exclude: build_set("exclude", exclude)?,
        })
    }

    /// ファイルが対象かどうか（ルートからの相対パスで判定）
    pub fn should_include(&self, relative_path: &Path) -> bool {
        if self.exclude.is_match(relative_path) {
            return false;
        }
        match &self.include {
            Some(include_set) => include_set.is_match(relative_path),
            None => true,
        }
    }

    /// ディレクトリを走査すべきか（excludeのみチェック）
    pub fn should_traverse_dir(&self, relative_path: &Path) -> bool {
        !self.exclude.is_match(relative_path)
    }
}

fn build_set(kind: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            MarkupError::InvalidArgument(format!("Invalid {} pattern '{}': {}", kind, pattern, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| MarkupError::InvalidArgument(format!("Failed to build {} set: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_include_means_all() {
        let matcher = PathMatcher::new(&[], &[]).unwrap();
        assert!(matcher.should_include(Path::new("Pages/Counter.razor")));
        assert!(matcher.should_include(Path::new("Shared/NavMenu.razor")));
    }

    #[test]
    fn test_include_filter() {
        let matcher = PathMatcher::new(&["Pages/**/*.razor".to_string()], &[]).unwrap();
        assert!(matcher.should_include(Path::new("Pages/Admin/Users.razor")));
        assert!(!matcher.should_include(Path::new("Shared/NavMenu.razor")));
    }

    #[test]
    fn test_exclude_build_output() {
        let matcher =
            PathMatcher::new(&[], &["**/obj".to_string(), "**/obj/**".to_string()]).unwrap();
        assert!(matcher.should_include(Path::new("Pages/Index.razor")));
        assert!(!matcher.should_include(Path::new("obj/Debug/Generated.razor")));
        assert!(!matcher.should_traverse_dir(Path::new("obj")));
        assert!(matcher.should_traverse_dir(Path::new("Pages")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathMatcher::new(&["Pages/[".to_string()], &[]).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
