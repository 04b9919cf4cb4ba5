use tree_sitter::{Node, Parser, Tree};

/// tree-sitter-html によるマークアップパーサー
///
/// Razorの制御構文（`@if`、`@code { ... }` など）はHTMLとしては不正だが、
/// tree-sitterはエラーノードを作って解析を続けるので、常にツリーが返る。
pub struct HtmlParser {
    parser: Parser,
}

impl HtmlParser {
    pub fn new() -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_html::LANGUAGE.into())
            .expect("Failed to load HTML grammar");

        Self { parser }
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// ノードのテキストを取得
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// 指定した種類の子ノードを検索
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_kind(node: Node, kind: &str) -> usize {
        let mut total = usize::from(node.kind() == kind);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            total += count_kind(child, kind);
        }
        total
    }

    #[test]
    fn test_parse_razor_component() {
        let mut parser = HtmlParser::new();

        let source = r#"@page "/counter"
@inject NavigationManager Nav

<h1 class="title">Counter</h1>

@if (currentCount > 3)
{
    <p role="status">Current count: @currentCount</p>
}

<button class="btn btn-primary" @onclick="IncrementCount">Click me</button>

@code {
    private int currentCount = 0;
}"#;

        let tree = parser.parse(source);
        assert!(tree.is_some(), "Razor構文が混在していてもツリーは返るべき");

        let tree = tree.unwrap();
        let root = tree.root_node();
        assert_eq!(root.kind(), "document");
        assert!(count_kind(root, "start_tag") >= 2);
    }

    #[test]
    fn test_find_child_and_text() {
        let mut parser = HtmlParser::new();
        let source = r#"<footer class="site">&copy; 2024</footer>"#;
        let tree = parser.parse(source).unwrap();

        let root = tree.root_node();
        let element = find_child_by_kind(root, "element").unwrap();
        let start_tag = find_child_by_kind(element, "start_tag").unwrap();
        let tag_name = find_child_by_kind(start_tag, "tag_name").unwrap();
        assert_eq!(node_text(tag_name, source), "footer");
        assert!(find_child_by_kind(element, "end_tag").is_some());
    }
}
