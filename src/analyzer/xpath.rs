//! 要素パスの問い合わせ（XPathのサブセット）
//!
//! 対応する構文:
//! - `/a/b`（子）、`//a`（子孫）、`*`
//! - `[n]`, `[last()]`
//! - `[@attr]`, `[@attr='v']`, `[@attr!='v']`
//! - `[contains(@attr,'v')]`, `[starts-with(@attr,'v')]`
//! - `[text()='v']`, `[contains(text(),'v')]`
//! - 条件の `and` 結合
//!
//! 先頭に `/` のないクエリはルートからの子ステップとして扱う。

use std::fmt;
use std::str::FromStr;

use super::structure::{Document, ElementRecord};
use crate::error::{MarkupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Any,
    Name(String),
}

impl NodeTest {
    fn matches(&self, tag: &str, ignore_case: bool) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Name(name) if ignore_case => name.eq_ignore_ascii_case(tag),
            NodeTest::Name(name) => name == tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    HasAttribute(String),
    AttributeEquals(String, String),
    AttributeNotEquals(String, String),
    AttributeContains(String, String),
    AttributeStartsWith(String, String),
    TextEquals(String),
    TextContains(String),
}

impl Condition {
    fn holds(&self, record: &ElementRecord) -> bool {
        match self {
            Condition::HasAttribute(name) => record.attribute(name).is_some(),
            Condition::AttributeEquals(name, value) => {
                record.attribute_value(name).is_some_and(|v| v == value)
            }
            Condition::AttributeNotEquals(name, value) => {
                record.attribute_value(name).is_some_and(|v| v != value)
            }
            Condition::AttributeContains(name, value) => {
                record.attribute_value(name).is_some_and(|v| v.contains(value.as_str()))
            }
            Condition::AttributeStartsWith(name, value) => {
                record.attribute_value(name).is_some_and(|v| v.starts_with(value.as_str()))
            }
            Condition::TextEquals(value) => record.inner_text == *value,
            Condition::TextContains(value) => record.inner_text.contains(value.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// 1始まりの位置
    Position(usize),
    Last,
    All(Vec<Condition>),
}

impl Predicate {
    fn apply(&self, doc: &Document, candidates: Vec<usize>) -> Vec<usize> {
        match self {
            Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
            Predicate::Last => candidates.last().copied().into_iter().collect(),
            Predicate::All(conditions) => candidates
                .into_iter()
                .filter(|&i| conditions.iter().all(|c| c.holds(doc.node(i))))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// 解析済みのパスクエリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    text: String,
    steps: Vec<Step>,
}

impl PathQuery {
    pub fn parse(query: &str) -> Result<Self> {
        QueryParser::new(query).parse()
    }

    /// タグ名を小文字化したクエリ
    pub fn with_lowercase_names(&self) -> Self {
        let steps = self
            .steps
            .iter()
            .map(|step| Step {
                test: match &step.test {
                    NodeTest::Name(name) => NodeTest::Name(name.to_lowercase()),
                    NodeTest::Any => NodeTest::Any,
                },
                ..step.clone()
            })
            .collect();
        Self {
            text: self.text.clone(),
            steps,
        }
    }

    /// 一致した要素のインデックスを文書順で返す
    ///
    /// 位置述語は親ごとの候補集合に対して適用する（`//li[1]` は各リストの先頭）。
    pub(crate) fn evaluate(&self, doc: &Document, ignore_case: bool) -> Vec<usize> {
        let mut contexts: Vec<Option<usize>> = vec![None];

        for step in &self.steps {
            let mut scopes = match step.axis {
                Axis::Child => contexts,
                Axis::DescendantOrSelf => {
                    let mut expanded = Vec::new();
                    for context in contexts {
                        expanded.push(context);
                        expanded.extend(doc.descendants(context).map(Some));
                    }
                    expanded
                }
            };
            scopes.sort_unstable();
            scopes.dedup();

            let mut next = Vec::new();
            for scope in scopes {
                let mut candidates: Vec<usize> = doc
                    .children_of(scope)
                    .iter()
                    .copied()
                    .filter(|&i| step.test.matches(&doc.node(i).tag, ignore_case))
                    .collect();
                for predicate in &step.predicates {
                    candidates = predicate.apply(doc, candidates);
                }
                next.extend(candidates);
            }
            next.sort_unstable();
            next.dedup();

            if next.is_empty() {
                return Vec::new();
            }
            contexts = next.into_iter().map(Some).collect();
        }

        contexts.into_iter().flatten().collect()
    }
}

impl FromStr for PathQuery {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

struct QueryParser<'q> {
    text: &'q str,
    pos: usize,
}

impl<'q> QueryParser<'q> {
    fn new(text: &'q str) -> Self {
        Self {
            text: text.trim(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> MarkupError {
        MarkupError::InvalidQuery {
            query: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'q str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &str) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at offset {}", expected, self.pos)))
        }
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'q str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse(mut self) -> Result<PathQuery> {
        if self.text.is_empty() {
            return Err(self.error("query is empty"));
        }

        let mut steps = Vec::new();
        while !self.at_end() {
            let axis = if self.eat("//") {
                Axis::DescendantOrSelf
            } else if self.eat("/") || steps.is_empty() {
                Axis::Child
            } else {
                return Err(self.error(format!("expected '/' at offset {}", self.pos)));
            };

            let test = if self.eat("*") {
                NodeTest::Any
            } else {
                let name = self.take_while(is_tag_char);
                if name.is_empty() {
                    return Err(self.error(format!("expected element name at offset {}", self.pos)));
                }
                NodeTest::Name(name.to_string())
            };

            let mut predicates = Vec::new();
            while self.eat("[") {
                self.skip_ws();
                predicates.push(self.parse_predicate()?);
                self.skip_ws();
                self.expect("]")?;
            }

            steps.push(Step {
                axis,
                test,
                predicates,
            });
        }

        Ok(PathQuery {
            text: self.text.to_string(),
            steps,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let digits = self.take_while(|c| c.is_ascii_digit());
            let n: usize = digits
                .parse()
                .map_err(|_| self.error(format!("invalid position '{}'", digits)))?;
            if n == 0 {
                return Err(self.error("positions start at 1"));
            }
            return Ok(Predicate::Position(n));
        }

        if self.eat("last()") {
            return Ok(Predicate::Last);
        }

        let mut conditions = vec![self.parse_condition()?];
        loop {
            self.skip_ws();
            if !self.eat("and") {
                break;
            }
            self.skip_ws();
            conditions.push(self.parse_condition()?);
        }
        Ok(Predicate::All(conditions))
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        if self.eat("@") {
            let name = self.parse_attribute_name()?;
            self.skip_ws();
            if self.eat("!=") {
                self.skip_ws();
                return Ok(Condition::AttributeNotEquals(name, self.parse_literal()?));
            }
            if self.eat("=") {
                self.skip_ws();
                return Ok(Condition::AttributeEquals(name, self.parse_literal()?));
            }
            return Ok(Condition::HasAttribute(name));
        }

        if self.eat("text()") {
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            return Ok(Condition::TextEquals(self.parse_literal()?));
        }

        let function = if self.eat("contains(") {
            "contains"
        } else if self.eat("starts-with(") {
            "starts-with"
        } else {
            return Err(self.error(format!("unsupported predicate at offset {}", self.pos)));
        };

        self.skip_ws();
        let subject = if self.eat("text()") {
            None
        } else {
            self.expect("@")?;
            Some(self.parse_attribute_name()?)
        };
        self.skip_ws();
        self.expect(",")?;
        self.skip_ws();
        let value = self.parse_literal()?;
        self.skip_ws();
        self.expect(")")?;

        match (function, subject) {
            ("contains", Some(name)) => Ok(Condition::AttributeContains(name, value)),
            ("contains", None) => Ok(Condition::TextContains(value)),
            (_, Some(name)) => Ok(Condition::AttributeStartsWith(name, value)),
            (_, None) => Err(self.error("starts-with() on text() is not supported")),
        }
    }

    /// Razorの `@onclick` や `@bind-Value` も属性名として許す
    fn parse_attribute_name(&mut self) -> Result<String> {
        let name = self.take_while(|c| {
            !c.is_whitespace() && !matches!(c, '=' | '!' | '[' | ']' | '(' | ')' | ',' | '\'' | '"' | '/')
        });
        if name.is_empty() {
            return Err(self.error(format!("expected attribute name at offset {}", self.pos)));
        }
        Ok(name.to_string())
    }

    fn parse_literal(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error(format!("expected quoted string at offset {}", self.pos))),
        };
        self.pos += 1;
        let rest = self.rest();
        let Some(len) = rest.find(quote) else {
            return Err(self.error("unterminated string literal"));
        };
        let value = rest[..len].to_string();
        self.pos += len + 1;
        Ok(value)
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}
