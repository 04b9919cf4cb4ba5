//! コンポーネント・TagHelperの使用箇所

use phf::phf_set;
use serde::Serialize;

use super::structure::{Document, ElementRecord};

/// 標準HTML要素（コンポーネントとして扱わない）
static STANDARD_HTML_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "a", "abbr", "address", "area", "article", "aside", "audio",
    "b", "base", "bdi", "bdo", "blockquote", "body", "br", "button",
    "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html",
    "i", "iframe", "img", "input", "ins", "kbd", "label", "legend", "li", "link",
    "main", "map", "mark", "meta", "meter", "nav", "noscript",
    "object", "ol", "optgroup", "option", "output",
    "p", "param", "picture", "pre", "progress", "q", "rp", "rt", "ruby",
    "s", "samp", "script", "section", "select", "small", "source", "span", "strong",
    "style", "sub", "summary", "sup", "svg",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "time",
    "title", "tr", "track", "u", "ul", "var", "video", "wbr",
};

/// コンポーネント（または TagHelper 属性つき要素）の使用箇所
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentUsage {
    pub tag: String,
    pub attributes: Vec<String>,
    /// 1始まり
    pub line: usize,
}

/// 名前空間つき（`Foo.Bar`）か、標準HTML要素ではないタグ
pub fn is_potential_component(tag: &str) -> bool {
    tag.contains('.') || !STANDARD_HTML_ELEMENTS.contains(tag.to_ascii_lowercase().as_str())
}

fn has_tag_helper_attribute(record: &ElementRecord) -> bool {
    record
        .attributes
        .iter()
        .any(|a| a.name.starts_with("asp-") || a.name.contains('.'))
}

/// テンプレート中のコンポーネント使用箇所を文書順に返す
pub fn component_usages(text: &str) -> Vec<ComponentUsage> {
    let doc = Document::parse(text);
    doc.iter()
        .filter(|(_, record)| is_potential_component(&record.tag) || has_tag_helper_attribute(record))
        .map(|(_, record)| ComponentUsage {
            tag: record.tag.clone(),
            attributes: record.attributes.iter().map(|a| a.name.clone()).collect(),
            line: record.line,
        })
        .collect()
}
