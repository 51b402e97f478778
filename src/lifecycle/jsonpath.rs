// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Relaxed JSONPath, the subset kubectl users write in `--for=jsonpath=`.
//!
//! The surrounding braces and the leading `$` or `.` are optional, so
//! `{.status.phase}`, `.status.phase` and `status.phase` are the same path.

use crate::error::{ProviderError, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Field(String),
    Index(i64),
    Wildcard,
    Filter(Filter),
}

#[derive(Clone, Debug, PartialEq)]
struct Filter {
    path: Vec<String>,
    comparison: Option<(Op, Value)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self> {
        let segments = Parser::new(expression)
            .parse()
            .map_err(|reason| ProviderError::InvalidJsonPath {
                expression: expression.to_string(),
                reason,
            })?;
        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// All values the path selects, in document order
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            current = current
                .into_iter()
                .flat_map(|value| select(segment, value))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

impl FromStr for JsonPath {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn select<'a>(segment: &Segment, value: &'a Value) -> Vec<&'a Value> {
    match (segment, value) {
        (Segment::Field(name), Value::Object(map)) => map.get(name).into_iter().collect(),
        (Segment::Index(i), Value::Array(items)) => {
            let len = items.len() as i64;
            let idx = if *i < 0 { len + i } else { *i };
            if (0..len).contains(&idx) {
                vec![&items[idx as usize]]
            } else {
                Vec::new()
            }
        }
        (Segment::Wildcard, Value::Array(items)) => items.iter().collect(),
        (Segment::Wildcard, Value::Object(map)) => map.values().collect(),
        (Segment::Filter(filter), Value::Array(items)) => {
            items.iter().filter(|item| filter.matches(item)).collect()
        }
        _ => Vec::new(),
    }
}

impl Filter {
    fn matches(&self, item: &Value) -> bool {
        let mut target = Some(item);
        for field in &self.path {
            target = target.and_then(|v| v.get(field));
        }

        match (&self.comparison, target) {
            (None, target) => target.is_some_and(|v| !v.is_null()),
            (Some((Op::Eq, literal)), Some(v)) => literal_eq(v, literal),
            (Some((Op::Eq, _)), None) => false,
            (Some((Op::Ne, literal)), Some(v)) => !literal_eq(v, literal),
            (Some((Op::Ne, _)), None) => true,
        }
    }
}

fn literal_eq(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => value == literal,
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        let mut input = expression.trim();
        if let Some(inner) = input.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            input = inner.trim();
        }
        if let Some(rest) = input.strip_prefix('$') {
            input = rest;
        }
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}' at offset {}, found '{}'", expected, self.pos - 1, c)),
            None => Err(format!("expected '{}' at end of expression", expected)),
        }
    }

    fn parse(mut self) -> std::result::Result<Vec<Segment>, String> {
        if self.input.is_empty() {
            return Err("expression is empty".to_string());
        }
        if self.input.contains("..") {
            return Err("recursive descent is not supported".to_string());
        }
        if self.input.starts_with('{') || self.input.ends_with('}') {
            return Err("unbalanced braces".to_string());
        }

        let mut segments = Vec::new();
        if !matches!(self.peek(), Some('.') | Some('[')) {
            segments.push(self.field()?);
        }

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    if self.peek() == Some('*') {
                        self.bump();
                        segments.push(Segment::Wildcard);
                    } else {
                        segments.push(self.field()?);
                    }
                }
                '[' => {
                    self.bump();
                    segments.push(self.bracket()?);
                }
                other => return Err(format!("unexpected '{}' at offset {}", other, self.pos)),
            }
        }
        Ok(segments)
    }

    fn field(&mut self) -> std::result::Result<Segment, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            if matches!(c, ']' | '(' | ')' | '\'' | '"' | ' ') {
                return Err(format!("unexpected '{}' at offset {}", c, self.pos));
            }
            self.bump();
        }
        if start == self.pos {
            return Err(format!("missing field name at offset {}", start));
        }
        Ok(Segment::Field(self.input[start..self.pos].to_string()))
    }

    fn bracket(&mut self) -> std::result::Result<Segment, String> {
        let segment = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                Segment::Field(self.quoted(quote)?)
            }
            Some('*') => {
                self.bump();
                Segment::Wildcard
            }
            Some('?') => {
                self.bump();
                self.expect('(')?;
                Segment::Filter(self.filter()?)
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ']') {
                    self.bump();
                }
                let raw = self.input[start..self.pos].trim();
                let index = raw
                    .parse::<i64>()
                    .map_err(|_| format!("invalid array index {:?}", raw))?;
                Segment::Index(index)
            }
        };
        self.expect(']')?;
        Ok(segment)
    }

    fn quoted(&mut self, quote: char) -> std::result::Result<String, String> {
        let start = self.pos;
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(self.input[start..self.pos - 1].to_string()),
                Some(_) => {}
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn filter(&mut self) -> std::result::Result<Filter, String> {
        self.skip_spaces();
        self.expect('@')?;

        let mut path = Vec::new();
        while self.peek() == Some('.') {
            self.bump();
            let start = self.pos;
            while self
                .peek()
                .is_some_and(|c| !c.is_whitespace() && !matches!(c, '.' | '=' | '!' | ')'))
            {
                self.bump();
            }
            if start == self.pos {
                return Err(format!("missing field name at offset {}", start));
            }
            path.push(self.input[start..self.pos].to_string());
        }
        if path.is_empty() {
            return Err("filter must test a field of '@'".to_string());
        }

        self.skip_spaces();
        let comparison = if self.peek() == Some(')') {
            None
        } else {
            let op = match (self.bump(), self.bump()) {
                (Some('='), Some('=')) => Op::Eq,
                (Some('!'), Some('=')) => Op::Ne,
                _ => return Err("filters support only '==' and '!='".to_string()),
            };
            self.skip_spaces();
            Some((op, self.literal()?))
        };

        self.skip_spaces();
        self.expect(')')?;
        Ok(Filter { path, comparison })
    }

    fn literal(&mut self) -> std::result::Result<Value, String> {
        if let Some(quote @ ('\'' | '"')) = self.peek() {
            self.bump();
            return self.quoted(quote).map(Value::String);
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| !c.is_whitespace() && c != ')') {
            self.bump();
        }
        let raw = &self.input[start..self.pos];
        match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => serde_json::from_str::<serde_json::Number>(raw)
                .map(Value::Number)
                .map_err(|_| format!("invalid literal {:?}", raw)),
        }
    }
}
