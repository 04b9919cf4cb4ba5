//! 埋め込みコードの文字列リテラル走査
//!
//! C#を構文解析はせず、リテラルの境界がずれない程度にだけ字句を読む。
//! 通常文字列 `"..."`、逐語的文字列 `@"..."`、補間文字列 `$"..."` を拾い、
//! 文字リテラル `'x'` とコメントは読み飛ばす。

/// コード中の文字列リテラルの中身を出現順に返す
///
/// 閉じていないリテラルは返さない。
pub fn string_literals(code: &str) -> Vec<&str> {
    let bytes = code.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = find_byte(bytes, i + 2, b'\n').unwrap_or(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = code[i + 2..]
                    .find("*/")
                    .map(|p| i + 2 + p + 2)
                    .unwrap_or(bytes.len());
            }
            b'\'' => i = skip_char_literal(bytes, i),
            b'"' if code[i..].starts_with("\"\"\"") => {
                // 生文字列リテラルは中身を見ない
                i = code[i + 3..]
                    .find("\"\"\"")
                    .map(|p| i + 3 + p + 3)
                    .unwrap_or(bytes.len());
            }
            b'"' => match regular_string(bytes, i + 1) {
                Some(end) => {
                    literals.push(&code[i + 1..end]);
                    i = end + 1;
                }
                None => i += 1,
            },
            b'@' | b'$' => {
                let (verbatim, interpolated, quote) = match (bytes.get(i + 1), bytes.get(i + 2)) {
                    (Some(b'"'), _) => (bytes[i] == b'@', bytes[i] == b'$', i + 1),
                    (Some(b'@' | b'$'), Some(b'"')) if bytes[i + 1] != bytes[i] => (true, true, i + 2),
                    _ => {
                        i += 1;
                        continue;
                    }
                };
                let end = if interpolated {
                    interpolated_string(bytes, quote + 1, verbatim)
                } else {
                    verbatim_string(bytes, quote + 1)
                };
                match end {
                    Some(end) => {
                        literals.push(&code[quote + 1..end]);
                        i = end + 1;
                    }
                    None => i = quote + 1,
                }
            }
            _ => i += 1,
        }
    }

    literals
}

fn find_byte(bytes: &[u8], from: usize, target: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == target).map(|p| from + p)
}

/// `'a'` や `'\n'` を読み飛ばす。文字リテラルに見えなければ1文字だけ進む
fn skip_char_literal(bytes: &[u8], at: usize) -> usize {
    if bytes.get(at + 1) == Some(&b'\\') {
        let limit = (at + 10).min(bytes.len());
        return find_byte(&bytes[..limit], at + 3, b'\'')
            .map(|p| p + 1)
            .unwrap_or(at + 1);
    }
    if bytes.get(at + 2) == Some(&b'\'') {
        return at + 3;
    }
    at + 1
}

/// 閉じ引用符の位置。改行までに閉じなければ `None`
fn regular_string(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

/// `""` をエスケープとして扱う
fn verbatim_string(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// 補間の穴 `{...}` の中にある入れ子の文字列は終端と見なさない
fn interpolated_string(bytes: &[u8], from: usize, verbatim: bool) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'{' if depth == 0 && bytes.get(i + 1) == Some(&b'{') => i += 2,
            b'}' if depth == 0 && bytes.get(i + 1) == Some(&b'}') => i += 2,
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                i += 1;
            }
            b'"' if depth > 0 => {
                i = regular_string(bytes, i + 1).map(|e| e + 1)?;
            }
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return Some(i),
            b'\\' if !verbatim => i += 2,
            b'\n' if !verbatim && depth == 0 => return None,
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"var a = "btn-primary";"#, vec!["btn-primary"])]
    #[case(r#"x = "a" + "b c";"#, vec!["a", "b c"])]
    #[case(r#"path = @"C:\temp\""" + "z";"#, vec![r#"C:\temp\"""#, "z"])]
    #[case(r#"s = $"item-{(ok ? "on" : "off")}";"#, vec![r#"item-{(ok ? "on" : "off")}"#])]
    #[case(r#"c = '"'; d = "real";"#, vec!["real"])]
    #[case(r#"e = '\''; f = "ok";"#, vec!["ok"])]
    #[case("// \"commented\"\ng = \"live\";", vec!["live"])]
    #[case("/* \"block\" */ h = \"after\";", vec!["after"])]
    #[case(r#"esc = "say \"hi\"";"#, vec![r#"say \"hi\""#])]
    #[case("broken = \"no end\nnext = \"fine\";", vec!["fine"])]
    #[case(r#"Don't = "x";"#, vec!["x"])]
    fn test_string_literals(#[case] code: &str, #[case] expected: Vec<&str>) {
        assert_eq!(string_literals(code), expected, "code: {}", code);
    }

    #[test]
    fn test_unterminated_at_end() {
        assert!(string_literals("var x = \"open").is_empty());
    }
}
