//! スタイルシートで定義されているクラスの収集

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static CSS_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static CLASS_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.((?:[a-zA-Z0-9_-]|\\.)+)").unwrap());

/// セレクタ中の `.identifier` をすべて集める
///
/// `@media` などのat-ruleの前置部分は対象外。エスケープは解除する（`.w-1\.5` は `w-1.5`）。
pub fn defined_classes(css: &str) -> BTreeSet<String> {
    let css = CSS_COMMENT.replace_all(css, "");
    let mut classes = BTreeSet::new();

    let mut prelude_start = 0;
    for (at, ch) in css.char_indices() {
        match ch {
            '{' => {
                let prelude = css[prelude_start..at].trim();
                if !prelude.starts_with('@') {
                    for caps in CLASS_SELECTOR.captures_iter(prelude) {
                        let name = unescape(&caps[1]);
                        if name.chars().next().is_some_and(|c| !c.is_ascii_digit()) {
                            classes.insert(name);
                        }
                    }
                }
                prelude_start = at + 1;
            }
            '}' | ';' => prelude_start = at + 1,
            _ => {}
        }
    }

    classes
}

fn unescape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
