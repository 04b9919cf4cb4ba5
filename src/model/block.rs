use serde::Serialize;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// `@code { ... }` などのディレクティブブロック
    EmbeddedCode,
    /// `<style> ... </style>`
    Stylesheet,
}

/// テンプレートから切り出した区間
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedBlock {
    pub kind: BlockKind,
    /// 区切り記号の内側（前後の空白はトリム済み）
    pub raw_content: String,
    /// 開始マーカーから閉じ区切りまでの元テキスト上の範囲（削除に使う）
    pub source_span: Span,
}
