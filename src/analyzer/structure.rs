//! テンプレートの構造モデル
//!
//! tree-sitter-html の具象構文木から、要素だけを取り出した寛容なツリーを組み立てる。
//! ERRORノードや地のテキストに埋もれた要素も拾い、各要素に
//! `/div[1]/span[2]` 形式のパスと元テキスト上のバイト範囲を持たせる。

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, warn};
use tree_sitter::Node;

use super::html_parser::{find_child_by_kind, node_text, HtmlParser};
use super::xpath::PathQuery;
use crate::error::Result;
use crate::model::{Attributes, Element, Span};

/// 子要素を持ちうるノード種別
const ELEMENT_KINDS: &[&str] = &["element", "script_element", "style_element"];

/// 要素のタグ部分（これ自体は子要素を含まない）
const TAG_KINDS: &[&str] = &["start_tag", "self_closing_tag", "end_tag"];

/// テキストとして連結するリーフ
const TEXT_KINDS: &[&str] = &["text", "entity", "raw_text"];

/// 属性1つ分の値と位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    pub name: String,
    /// 値なし属性（`disabled` など）は `None`
    pub value: Option<String>,
    /// 属性全体の範囲
    pub span: Span,
    pub name_span: Span,
    /// 引用符の内側の範囲
    pub value_span: Option<Span>,
    pub quote: Option<char>,
}

/// 構造ツリーの1要素（位置情報つき）
#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub tag: String,
    pub path: String,
    /// 1始まりの行番号
    pub line: usize,
    pub attributes: Vec<AttributeRecord>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// このノードの部分木の終端インデックス（排他的）
    subtree_end: usize,
    /// 要素全体の範囲
    pub outer: Span,
    /// 開始タグ（自己終了タグ）の範囲
    pub start_tag: Span,
    pub tag_name: Span,
    /// 開始タグと終了タグの間。自己終了タグは `None`
    pub inner: Option<Span>,
    pub self_closing: bool,
    pub inner_text: String,
}

impl ElementRecord {
    /// 名前で属性を取得（完全一致を優先し、なければASCII大文字小文字無視）
    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.attributes.iter().find(|a| a.name.eq_ignore_ascii_case(name)))
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// 新しい属性を挿入する位置（最後の属性またはタグ名の直後）
    pub fn attribute_insert_point(&self) -> usize {
        self.attributes
            .last()
            .map(|a| a.span.end)
            .unwrap_or(self.tag_name.end)
    }
}

/// 1ファイル分の構造ツリー
///
/// 要素は文書順（先行順）のインデックスで管理する。インデックスの昇順がそのまま文書順。
pub struct Document<'s> {
    source: &'s str,
    nodes: Vec<ElementRecord>,
    roots: Vec<usize>,
}

impl<'s> Document<'s> {
    /// テキストを解析する。どんな入力でも失敗しない
    pub fn parse(source: &'s str) -> Self {
        let mut doc = Self {
            source,
            nodes: Vec::new(),
            roots: Vec::new(),
        };

        let mut parser = HtmlParser::new();
        match parser.parse(source) {
            Some(tree) => {
                let root = tree.root_node();
                if root.has_error() {
                    debug!("Markup contains unparsable fragments; kept as text");
                }
                let top = element_nodes_under(root);
                doc.roots = doc.build_children(&top, None, "");
            }
            None => warn!("HTML parser returned no tree; treating document as plain text"),
        }

        doc
    }

    fn build_children(
        &mut self,
        nodes: &[Node],
        parent: Option<usize>,
        parent_path: &str,
    ) -> Vec<usize> {
        let mut ordinals: HashMap<String, usize> = HashMap::new();
        let mut ids = Vec::with_capacity(nodes.len());

        for &node in nodes {
            let Some(tag_node) = tag_node_of(node) else {
                continue;
            };
            let Some(tag_name) = find_child_by_kind(tag_node, "tag_name") else {
                continue;
            };

            let tag = node_text(tag_name, self.source).to_string();
            let ordinal = ordinals.entry(tag.clone()).or_insert(0);
            *ordinal += 1;
            let path = format!("{}/{}[{}]", parent_path, tag, ordinal);

            let self_closing = tag_node.kind() == "self_closing_tag";
            let inner = if self_closing {
                None
            } else if node.id() == tag_node.id() {
                Some(Span::point(tag_node.end_byte()))
            } else {
                let end = find_child_by_kind(node, "end_tag")
                    .map(|t| t.start_byte())
                    .unwrap_or_else(|| node.end_byte());
                Some(Span::new(tag_node.end_byte(), end.max(tag_node.end_byte())))
            };

            let index = self.nodes.len();
            self.nodes.push(ElementRecord {
                tag,
                path: path.clone(),
                line: node.start_position().row + 1,
                attributes: collect_attributes(tag_node, self.source),
                parent,
                children: Vec::new(),
                subtree_end: index + 1,
                outer: Span::from(node.byte_range()),
                start_tag: Span::from(tag_node.byte_range()),
                tag_name: Span::from(tag_name.byte_range()),
                inner,
                self_closing,
                inner_text: collect_inner_text(node, self.source),
            });

            let child_nodes = if node.id() == tag_node.id() {
                Vec::new()
            } else {
                element_nodes_under(node)
            };
            let children = self.build_children(&child_nodes, Some(index), &path);
            let end = self.nodes.len();
            let record = &mut self.nodes[index];
            record.children = children;
            record.subtree_end = end;

            ids.push(index);
        }

        ids
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &ElementRecord {
        &self.nodes[index]
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// 全要素を文書順に列挙
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ElementRecord)> {
        self.nodes.iter().enumerate()
    }

    /// 親の子要素（`None` は文書ルート）
    pub fn children_of(&self, parent: Option<usize>) -> &[usize] {
        match parent {
            Some(index) => &self.nodes[index].children,
            None => &self.roots,
        }
    }

    /// 子孫要素のインデックス範囲（自身を含まない）
    pub fn descendants(&self, context: Option<usize>) -> Range<usize> {
        match context {
            Some(index) => index + 1..self.nodes[index].subtree_end,
            None => 0..self.nodes.len(),
        }
    }

    /// 公開モデルへ変換
    pub fn to_element(&self, index: usize) -> Element {
        let record = &self.nodes[index];

        let mut attributes = Attributes::new();
        for attr in &record.attributes {
            attributes.insert_first(&attr.name, attr.value.as_deref().unwrap_or(""));
        }

        Element {
            tag: record.tag.clone(),
            id: record.attribute_value("id").map(str::to_string),
            class_attribute: record.attribute_value("class").map(str::to_string),
            path: record.path.clone(),
            attributes,
            children: record.children.iter().map(|&c| self.to_element(c)).collect(),
            inner_text: record.inner_text.clone(),
        }
    }

    /// ルート直下の要素列
    pub fn elements(&self) -> Vec<Element> {
        self.roots.iter().map(|&i| self.to_element(i)).collect()
    }

    /// パスクエリで要素を選択する
    ///
    /// 完全一致で見つからなければ、タグ名を小文字化したクエリで大文字小文字を無視して
    /// もう一度だけ探す。それでも無ければ空を返す。
    pub fn select(&self, query: &PathQuery) -> Vec<usize> {
        let found = query.evaluate(self, false);
        if !found.is_empty() {
            return found;
        }

        let lowered = query.with_lowercase_names();
        let found = lowered.evaluate(self, true);
        if !found.is_empty() {
            debug!("Query '{}' matched only after lowercase fallback", query);
        }
        found
    }

    pub fn select_str(&self, query: &str) -> Result<Vec<usize>> {
        let query = PathQuery::parse(query)?;
        Ok(self.select(&query))
    }

    /// 最初に一致した要素
    pub fn select_first(&self, query: &str) -> Result<Option<usize>> {
        Ok(self.select_str(query)?.into_iter().next())
    }
}

/// テンプレートを構造ツリーに変換し、ルート直下の要素列を返す
pub fn parse(text: &str) -> Vec<Element> {
    Document::parse(text).elements()
}

/// パスクエリに一致する要素を返す。見つからない場合は空（エラーにしない）
pub fn query(text: &str, query: &str) -> Result<Vec<Element>> {
    let doc = Document::parse(text);
    let found = doc.select_str(query)?;
    Ok(found.into_iter().map(|i| doc.to_element(i)).collect())
}

fn is_element_kind(kind: &str) -> bool {
    ELEMENT_KINDS.contains(&kind)
}

/// 要素ノードならそのタグノードを返す
///
/// ERRORノード内に単独で残った開始タグも、子を持たない要素として扱う。
fn tag_node_of(node: Node) -> Option<Node> {
    let kind = node.kind();
    if is_element_kind(kind) {
        return find_child_by_kind(node, "start_tag")
            .or_else(|| find_child_by_kind(node, "self_closing_tag"));
    }
    if (kind == "start_tag" || kind == "self_closing_tag") && !parent_is_element(node) {
        return Some(node);
    }
    None
}

fn parent_is_element(node: Node) -> bool {
    node.parent().is_some_and(|p| is_element_kind(p.kind()))
}

/// 直下（非要素ノードは透過）にある要素ノードを文書順に集める
fn element_nodes_under(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_element_nodes(child, &mut out);
    }
    out
}

fn collect_element_nodes<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if tag_node_of(node).is_some_and(|t| find_child_by_kind(t, "tag_name").is_some()) {
        out.push(node);
        return;
    }
    if TAG_KINDS.contains(&node.kind()) && parent_is_element(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_element_nodes(child, out);
    }
}

fn collect_attributes(tag_node: Node, source: &str) -> Vec<AttributeRecord> {
    let mut attributes = Vec::new();
    let mut cursor = tag_node.walk();

    for attr in tag_node.children(&mut cursor) {
        if attr.kind() != "attribute" {
            continue;
        }
        let Some(name_node) = find_child_by_kind(attr, "attribute_name") else {
            continue;
        };

        let (value, value_span, quote) =
            if let Some(quoted) = find_child_by_kind(attr, "quoted_attribute_value") {
                let quote = node_text(quoted, source).chars().next();
                match find_child_by_kind(quoted, "attribute_value") {
                    Some(v) => (
                        Some(node_text(v, source).to_string()),
                        Some(Span::from(v.byte_range())),
                        quote,
                    ),
                    None => {
                        let at = (quoted.start_byte() + 1).min(quoted.end_byte());
                        (Some(String::new()), Some(Span::point(at)), quote)
                    }
                }
            } else if let Some(v) = find_child_by_kind(attr, "attribute_value") {
                (
                    Some(node_text(v, source).to_string()),
                    Some(Span::from(v.byte_range())),
                    None,
                )
            } else {
                (None, None, None)
            };

        attributes.push(AttributeRecord {
            name: node_text(name_node, source).to_string(),
            value,
            span: Span::from(attr.byte_range()),
            name_span: Span::from(name_node.byte_range()),
            value_span,
            quote,
        });
    }

    attributes
}

/// 子孫のテキストを連結する
///
/// 元テキストで空白を挟んでいた断片の間には空白を1つ入れ、
/// タグだけで隔てられていた断片はそのまま繋げる。
fn collect_inner_text(node: Node, source: &str) -> String {
    let mut pieces = Vec::new();
    collect_text_spans(node, &mut pieces);

    let mut text = String::new();
    let mut previous: Option<Span> = None;
    for span in pieces {
        if let Some(prev) = previous {
            if span.start > prev.end && source[prev.end..span.start].chars().any(char::is_whitespace) {
                text.push(' ');
            }
        }
        text.push_str(span.slice(source));
        previous = Some(span);
    }

    text.trim().to_string()
}

fn collect_text_spans(node: Node, out: &mut Vec<Span>) {
    if TEXT_KINDS.contains(&node.kind()) {
        out.push(Span::from(node.byte_range()));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_text_spans(child, out);
    }
}
