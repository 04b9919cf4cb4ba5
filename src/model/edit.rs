use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::MarkupError;

/// 構造編集の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// 内容と属性の更新
    Update,
    /// 新しい親要素で包む
    Wrap,
    /// 最後の子として追加
    Append,
}

impl FromStr for EditKind {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "update" => Ok(EditKind::Update),
            "wrap" => Ok(EditKind::Wrap),
            "append" => Ok(EditKind::Append),
            _ => Err(MarkupError::InvalidArgument(format!(
                "unknown edit operation type '{}' (expected Update, Wrap or Append)",
                s
            ))),
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Update => "Update",
            EditKind::Wrap => "Wrap",
            EditKind::Append => "Append",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for EditKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// パスで指定した要素への編集操作
///
/// JSON上は `{"type": "Wrap", "xpath": "//button", "content": "div", "attributes": {...}}`。
/// `content` は種類ごとに意味が変わる（Update: 新しい内側マークアップ、Wrap: 包むタグ名、
/// Append: 追加する子マークアップ）。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditOperation {
    #[serde(rename = "type")]
    pub kind: EditKind,
    #[serde(rename = "xpath")]
    pub target_path: String,
    #[serde(rename = "content", default)]
    pub payload: Option<String>,
    #[serde(rename = "attributes", default)]
    pub attribute_changes: Option<BTreeMap<String, String>>,
}

impl EditOperation {
    pub fn update(target_path: &str, content: Option<&str>) -> Self {
        Self {
            kind: EditKind::Update,
            target_path: target_path.to_string(),
            payload: content.map(str::to_string),
            attribute_changes: None,
        }
    }

    pub fn wrap(target_path: &str, wrapper_tag: &str) -> Self {
        Self {
            kind: EditKind::Wrap,
            target_path: target_path.to_string(),
            payload: Some(wrapper_tag.to_string()),
            attribute_changes: None,
        }
    }

    pub fn append(parent_path: &str, markup: &str) -> Self {
        Self {
            kind: EditKind::Append,
            target_path: parent_path.to_string(),
            payload: Some(markup.to_string()),
            attribute_changes: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attribute_changes
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    /// 必須の `content` を取り出す（Wrap/Append用）
    pub(crate) fn required_payload(&self) -> Result<&str, MarkupError> {
        match self.payload.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(MarkupError::InvalidArgument(format!(
                "{} operation on '{}' requires non-empty content",
                self.kind, self.target_path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("wrap".parse::<EditKind>().unwrap(), EditKind::Wrap);
        assert_eq!("UPDATE".parse::<EditKind>().unwrap(), EditKind::Update);
        let err = "Delete".parse::<EditKind>().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_deserialize_operation() {
        let json = r#"{"type":"Wrap","xpath":"//button","content":"div","attributes":{"class":"wrapper"}}"#;
        let op: EditOperation = serde_json::from_str(json).unwrap();
        assert_eq!(op, EditOperation::wrap("//button", "div").with_attribute("class", "wrapper"));
    }

    #[test]
    fn test_deserialize_unknown_kind_fails() {
        let json = r#"{"type":"Remove","xpath":"//button"}"#;
        assert!(serde_json::from_str::<EditOperation>(json).is_err());
    }

    #[test]
    fn test_required_payload() {
        let op = EditOperation::append("//ul", "   ");
        assert!(op.required_payload().unwrap_err().is_invalid_argument());
        let op = EditOperation::append("//ul", " <li>x</li> ");
        assert_eq!(op.required_payload().unwrap(), "<li>x</li>");
    }
}
