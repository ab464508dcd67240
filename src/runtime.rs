//! Runtime combinators. A `Parser` is a validator expression: one variant per
//! model variant, composed the same way the model is. References go through
//! the `ParserArena` by slot so recursive types stay finite at runtime.
//!
//! Data errors are values: a failed parse is a `ParseFailure` carrying a tree
//! of path-qualified `ParseError`s, never a Rust error type.
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::ir::{LiteralValue, PrimitiveKind};
use crate::value::Value;

mod choice;
mod object;
mod scalar;
mod sequence;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Position of a named validator inside the arena.
pub type SlotId = usize;

#[derive(Debug, Clone)]
pub enum Parser {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Any,
    Date,
    BigInt,
    Literal(LiteralValue),
    Enum(Vec<LiteralValue>),
    Object(ObjectParser),
    Array(Box<Parser>),
    Tuple(Vec<TupleSlot>),
    Union(Vec<Parser>),                  // tried in order
    Intersection(Vec<Parser>),           // merged in order
    Reference(SlotId),
    TemplateLiteral(TemplateParser),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectParser {
    pub fields: Vec<FieldParser>,
    pub indexes: Vec<IndexParser>,
}

#[derive(Debug, Clone)]
pub struct FieldParser {
    pub name: String,
    pub optional: bool,
    pub parser: Parser,
}

#[derive(Debug, Clone)]
pub struct IndexParser {
    pub key: KeyParser,
    pub optional: bool,
    pub parser: Parser,
}

/// Decides whether a dynamic property name belongs to an index member.
#[derive(Debug, Clone)]
pub enum KeyParser {
    String,
    Number,
    Pattern(TemplateParser),
}

#[derive(Debug, Clone)]
pub struct TupleSlot {
    pub parser: Parser,
    pub rest: bool,
}

/// An anchored pattern plus the template text it came from, for messages.
#[derive(Debug, Clone)]
pub struct TemplateParser {
    pub pattern: Regex,
    pub display: String,
}

/// Named validators, addressed by slot. Slot `i` is the `i`-th entry.
#[derive(Debug, Clone, Default)]
pub struct ParserArena {
    slots: IndexMap<String, Parser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathSegment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

pub type ParseResult = Result<Value, ParseFailure>;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Parser {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::String => Parser::String,
            PrimitiveKind::Number => Parser::Number,
            PrimitiveKind::Boolean => Parser::Boolean,
            PrimitiveKind::Null => Parser::Null,
            PrimitiveKind::Undefined => Parser::Undefined,
            PrimitiveKind::Any => Parser::Any,
            PrimitiveKind::Date => Parser::Date,
            PrimitiveKind::Bigint => Parser::BigInt,
        }
    }

    pub fn parse(&self, input: &Value, arena: &ParserArena) -> ParseResult {
        match self {
            Parser::String => scalar::string(input),
            Parser::Number => scalar::number(input),
            Parser::Boolean => scalar::boolean(input),
            Parser::Null => scalar::null(input),
            Parser::Undefined => scalar::undefined(input),
            Parser::Any => Ok(input.clone()),
            Parser::Date => scalar::date(input),
            Parser::BigInt => scalar::bigint(input),
            Parser::Literal(literal) => scalar::literal(literal, input),
            Parser::Enum(values) => scalar::one_of(values, input),
            Parser::TemplateLiteral(template) => scalar::template(template, input),
            Parser::Object(object) => object::parse(object, input, arena),
            Parser::Array(element) => sequence::array(element, input, arena),
            Parser::Tuple(slots) => sequence::tuple(slots, input, arena),
            Parser::Union(alternatives) => choice::union(alternatives, input, arena),
            Parser::Intersection(parts) => choice::intersection(parts, input, arena),
            Parser::Reference(slot) => match arena.get(*slot) {
                Some(parser) => parser.parse(input, arena),
                None => Err(ParseFailure::single(format!("no validator is bound to slot {slot}"))),
            },
        }
    }
}

impl KeyParser {
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            KeyParser::String => true,
            KeyParser::Number => key.trim().parse::<f64>().is_ok_and(f64::is_finite),
            KeyParser::Pattern(template) => template.pattern.is_match(key),
        }
    }
}

impl ParserArena {
    pub fn new(slots: IndexMap<String, Parser>) -> Self {
        Self { slots }
    }

    pub fn get(&self, slot: SlotId) -> Option<&Parser> {
        self.slots.get_index(slot).map(|(_, p)| p)
    }

    pub fn by_name(&self, name: &str) -> Option<&Parser> {
        self.slots.get(name)
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError { message: message.into(), path: None, errors: Vec::new() }
    }

    /// Attach a failure found under `path`. A lone path-less error is lifted
    /// to carry the path itself instead of nesting one level deeper.
    pub fn nested(path: PathSegment, failure: ParseFailure) -> Self {
        let mut errors = failure.errors;
        if errors.len() == 1 && errors[0].path.is_none() {
            let mut lone = errors.remove(0);
            lone.path = Some(path);
            return lone;
        }
        ParseError { message: "invalid value".into(), path: Some(path), errors }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match &self.path {
            Some(path) => writeln!(f, "{path}: {}", self.message)?,
            None => writeln!(f, "{}", self.message)?,
        }
        for child in &self.errors {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl ParseFailure {
    pub fn single(message: impl Into<String>) -> Self {
        ParseFailure { errors: vec![ParseError::new(message)] }
    }

    /// `expected string, got number`
    pub fn expected(what: impl fmt::Display, got: &Value) -> Self {
        Self::single(format!("expected {what}, got {}", got.kind()))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl fmt::Display for KeyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyParser::String => f.write_str("string"),
            KeyParser::Number => f.write_str("number"),
            KeyParser::Pattern(template) => f.write_str(&template.display),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            error.write_tree(f, 0)?;
        }
        Ok(())
    }
}

/// `{ "ok": true, "result": … }` or `{ "ok": false, "errors": […] }`.
pub fn envelope(result: &ParseResult) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    match result {
        Ok(value) => {
            out.insert("ok".into(), true.into());
            out.insert("result".into(), value.to_json());
        }
        Err(failure) => {
            out.insert("ok".into(), false.into());
            out.insert("errors".into(), serde_json::to_value(&failure.errors).unwrap_or_default());
        }
    }
    serde_json::Value::Object(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
