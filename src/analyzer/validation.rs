//! マークアップの構造チェック

use tree_sitter::Node;

use super::html_parser::{find_child_by_kind, node_text, HtmlParser};

const SNIPPET_LIMIT: usize = 30;

/// 構文木の異常箇所を `Line N: reason` 形式で返す。空なら構造的に問題なし
pub fn validate(text: &str) -> Vec<String> {
    let mut parser = HtmlParser::new();
    let Some(tree) = parser.parse(text) else {
        return vec!["Line 1: Markup could not be parsed".to_string()];
    };

    let mut diagnostics = Vec::new();
    collect_diagnostics(tree.root_node(), text, &mut diagnostics);
    diagnostics
}

fn collect_diagnostics(node: Node, source: &str, out: &mut Vec<String>) {
    let line = node.start_position().row + 1;

    if node.is_missing() {
        out.push(format!("Line {}: Missing {}", line, describe_kind(node.kind())));
        return;
    }

    match node.kind() {
        "ERROR" => {
            out.push(format!("Line {}: Unexpected content '{}'", line, snippet(node, source)));
            return;
        }
        "erroneous_end_tag" => {
            let name = find_child_by_kind(node, "erroneous_end_tag_name")
                .map(|n| node_text(n, source))
                .unwrap_or("?");
            out.push(format!("Line {}: End tag </{}> has no matching start tag", line, name));
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_diagnostics(child, source, out);
    }
}

fn describe_kind(kind: &str) -> String {
    match kind {
        "end_tag" => "end tag".to_string(),
        "\"" | "'" | ">" | "/>" => format!("'{}'", kind),
        other => other.replace('_', " "),
    }
}

fn snippet(node: Node, source: &str) -> String {
    let text = node_text(node, source).trim();
    let first_line = text.lines().next().unwrap_or("");
    let mut snippet: String = first_line.chars().take(SNIPPET_LIMIT).collect();
    if first_line.chars().count() > SNIPPET_LIMIT {
        snippet.push_str("...");
    }
    snippet
}
