use serde::Serialize;

/// クラス候補の出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// class属性のリテラル値
    StaticAttribute,
    /// 埋め込みコード内の文字列リテラル
    DynamicLiteral,
}

/// 分類ヒューリスティックによる確度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// 固定の汎用クラス名リストに一致しただけのコード内リテラル
    Low,
    /// 属性式内のリテラル、またはハイフンを含むコード内リテラル
    Medium,
    /// class属性に静的に書かれたトークン
    High,
}

/// テンプレートが参照するスタイルクラスの候補
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClassToken {
    pub name: String,
    pub provenance: Provenance,
    pub confidence: Confidence,
}

impl ClassToken {
    pub fn new(name: impl Into<String>, provenance: Provenance, confidence: Confidence) -> Self {
        Self {
            name: name.into(),
            provenance,
            confidence,
        }
    }
}
