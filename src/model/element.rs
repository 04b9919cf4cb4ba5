use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// 属性の順序付きマップ（挿入順を保持、名前は一意）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 属性を追加する。同名の属性が既にある場合は最初の値を残す
    pub fn insert_first(&mut self, name: &str, value: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((name.to_string(), value.to_string()));
        true
    }

    /// 名前で値を取得（完全一致を優先し、なければASCII大文字小文字無視）
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// テンプレートの構造ツリーのノード
///
/// `path` は `/div[1]/span[2]` 形式の位置ロケーター。同じテキストを再パースすれば
/// 同じ位置の要素に同じ `path` が割り当てられ、そのままパスクエリとして使える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    /// 元の大文字小文字を保持したタグ名
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_attribute: Option<String>,
    #[serde(rename = "xpath")]
    pub path: String,
    pub attributes: Attributes,
    pub children: Vec<Element>,
    /// 子孫テキストを連結してトリムしたもの
    #[serde(rename = "text")]
    pub inner_text: String,
}

impl Element {
    /// この要素と全子孫を文書順に列挙
    pub fn descendants_and_self(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants_and_self());
        }
        out
    }

    /// タグ・属性・子の並びだけを比較する（パスやテキストは見ない）
    pub fn same_shape(&self, other: &Element) -> bool {
        self.tag == other.tag
            && self.attributes == other.attributes
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }
}
