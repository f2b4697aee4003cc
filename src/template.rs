//! Replacement templates
//!
//! Templates use the `{{.name}}` action syntax: text outside `{{ }}` is copied
//! verbatim and each action looks up a name in the value mapping. Supported
//! action bodies:
//!
//! - `.name`            value lookup (missing names render as "")
//! - `"text"`           string literal
//! - `/* comment */`    renders nothing
//!
//! `{{- ` and ` -}}` trim the whitespace on that side of the action.

use crate::resolver::ValueMapping;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed action starting at byte {offset}")]
    UnclosedAction { offset: usize },

    #[error("unclosed comment starting at byte {offset}")]
    UnclosedComment { offset: usize },

    #[error("unterminated quoted string at byte {offset}")]
    UnterminatedString { offset: usize },

    #[error("missing value for command at byte {offset}")]
    EmptyAction { offset: usize },

    #[error("unexpected {token:?} in {context} at byte {offset}")]
    UnexpectedToken {
        token: String,
        context: &'static str,
        offset: usize,
    },

    #[error("can't evaluate field {field} in type string")]
    NotAnObject { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    /// `.a.b.c` stored as ["a", "b", "c"]
    Field(Vec<String>),
    Literal(String),
}

/// A parsed template, ready to be rendered any number of times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

/// Parse and render in one step
pub fn render(source: &str, values: &ValueMapping) -> Result<String, TemplateError> {
    Template::parse(source)?.render(values)
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Parser::new(source).parse()
    }

    pub fn render(&self, values: &ValueMapping) -> Result<String, TemplateError> {
        let mut out = String::new();

        for node in &self.nodes {
            match node {
                Node::Text(text) | Node::Literal(text) => out.push_str(text),
                Node::Field(chain) => {
                    if let Some(field) = chain.get(1) {
                        return Err(TemplateError::NotAnObject {
                            field: field.clone(),
                        });
                    }
                    if let Some(value) = values.get(&chain[0]) {
                        out.push_str(value);
                    }
                }
            }
        }

        Ok(out)
    }

    /// Names referenced by `.name` actions, in order of appearance
    pub fn field_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Field(chain) => Some(chain[0].as_str()),
                _ => None,
            })
            .collect()
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            nodes: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Template, TemplateError> {
        let src = self.src;

        while self.pos < self.bytes.len() {
            let rest = &src[self.pos..];
            let Some(rel) = rest.find("{{") else {
                self.push_text(rest);
                break;
            };

            let open = self.pos + rel;
            let mut text = &src[self.pos..open];
            self.pos = open + 2;

            // "{{- " trims trailing whitespace of the preceding text
            let trim_left = self.peek() == Some(b'-') && self.peek_at(1).is_some_and(is_space);
            if trim_left {
                text = text.trim_end_matches([' ', '\t', '\r', '\n']);
                self.pos += 1;
            }
            self.push_text(text);

            let trim_right = self.parse_action(open, trim_left)?;
            if trim_right {
                self.skip_space();
            }
        }

        Ok(Template { nodes: self.nodes })
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.nodes.push(Node::Text(text.to_string()));
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    fn token_at(&self, pos: usize) -> String {
        self.src[pos..]
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    }

    /// Returns true when the action ends with " -}}"
    fn close_action(&mut self) -> Option<bool> {
        if self.src[self.pos..].starts_with("}}") {
            self.pos += 2;
            return Some(false);
        }
        let preceded_by_space = self.pos > 0 && is_space(self.bytes[self.pos - 1]);
        if preceded_by_space && self.src[self.pos..].starts_with("-}}") {
            self.pos += 3;
            return Some(true);
        }
        None
    }

    /// Parse one action body after "{{"; `open` is the offset of "{{"
    ///
    /// A comment must start right after "{{" or "{{- " and end right before
    /// "}}" or " -}}".
    fn parse_action(&mut self, open: usize, trim_left: bool) -> Result<bool, TemplateError> {
        let comment_start = if trim_left { self.pos + 1 } else { self.pos };

        if self.src[comment_start..].starts_with("/*") {
            let start = comment_start;
            let Some(end) = self.src[start + 2..].find("*/") else {
                return Err(TemplateError::UnclosedComment { offset: start });
            };
            self.pos = start + 2 + end + 2;
            if self.peek().is_some_and(is_space) && self.src[self.pos + 1..].starts_with("-}}") {
                self.pos += 1;
            }
            return match self.close_action() {
                Some(trim) => Ok(trim),
                None if self.pos >= self.bytes.len() => {
                    Err(TemplateError::UnclosedAction { offset: open })
                }
                None => Err(TemplateError::UnexpectedToken {
                    token: self.token_at(self.pos),
                    context: "comment",
                    offset: self.pos,
                }),
            };
        }

        let mut operand: Option<Node> = None;

        loop {
            self.skip_space();
            if let Some(trim) = self.close_action() {
                let Some(node) = operand else {
                    return Err(TemplateError::EmptyAction { offset: open });
                };
                self.nodes.push(node);
                return Ok(trim);
            }

            let start = self.pos;
            let Some(b) = self.peek() else {
                return Err(TemplateError::UnclosedAction { offset: open });
            };

            if b == b'}' || operand.is_some() {
                let context = if b == b'}' { "operand" } else { "command" };
                return Err(TemplateError::UnexpectedToken {
                    token: self.token_at(start),
                    context,
                    offset: start,
                });
            }

            operand = Some(match b {
                b'.' => self.parse_field()?,
                b'"' => self.parse_string()?,
                _ => {
                    return Err(TemplateError::UnexpectedToken {
                        token: self.token_at(start),
                        context: "operand",
                        offset: start,
                    });
                }
            });
        }
    }

    fn parse_field(&mut self) -> Result<Node, TemplateError> {
        let mut chain = Vec::new();

        while self.peek() == Some(b'.') {
            let dot = self.pos;
            self.pos += 1;
            if !self.peek().is_some_and(is_ident_start) {
                return Err(TemplateError::UnexpectedToken {
                    token: self.token_at(dot),
                    context: "operand",
                    offset: dot,
                });
            }
            let start = self.pos;
            while self.peek().is_some_and(is_ident) {
                self.pos += 1;
            }
            chain.push(self.src[start..self.pos].to_string());
        }

        Ok(Node::Field(chain))
    }

    fn parse_string(&mut self) -> Result<Node, TemplateError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let src = self.src;
        let mut chars = src[self.pos..].char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(Node::Literal(value));
                }
                '\n' => break,
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((j, other)) => {
                        return Err(TemplateError::UnexpectedToken {
                            token: format!("\\{}", other),
                            context: "quoted string",
                            offset: self.pos + j - 1,
                        });
                    }
                    None => break,
                },
                _ => value.push(c),
            }
        }

        Err(TemplateError::UnterminatedString { offset: start })
    }
}
