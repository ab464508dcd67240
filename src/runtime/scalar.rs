//! Leaf combinators: primitives, literals, enums, dates, big integers and
//! template literals.
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ParseFailure, ParseResult, TemplateParser};
use crate::ir::LiteralValue;
use crate::value::Value;

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").expect("static date pattern")
});

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("static integer pattern"));

pub(super) fn string(input: &Value) -> ParseResult {
    match input {
        Value::String(_) => Ok(input.clone()),
        _ => Err(ParseFailure::expected("string", input)),
    }
}

pub(super) fn number(input: &Value) -> ParseResult {
    match input {
        Value::Number(_) => Ok(input.clone()),
        _ => Err(ParseFailure::expected("number", input)),
    }
}

pub(super) fn boolean(input: &Value) -> ParseResult {
    match input {
        Value::Bool(_) => Ok(input.clone()),
        _ => Err(ParseFailure::expected("boolean", input)),
    }
}

pub(super) fn null(input: &Value) -> ParseResult {
    match input {
        Value::Null => Ok(Value::Null),
        _ => Err(ParseFailure::expected("null", input)),
    }
}

pub(super) fn undefined(input: &Value) -> ParseResult {
    match input {
        Value::Undefined => Ok(Value::Undefined),
        _ => Err(ParseFailure::expected("undefined", input)),
    }
}

/// A native date, or an ISO-8601 string with milliseconds in UTC.
pub(super) fn date(input: &Value) -> ParseResult {
    match input {
        Value::Date(_) => Ok(input.clone()),
        Value::String(s) if ISO_DATE.is_match(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(parsed) => Ok(Value::Date(parsed.with_timezone(&Utc))),
            Err(err) => Err(ParseFailure::single(format!("invalid date `{s}`: {err}"))),
        },
        Value::String(s) => Err(ParseFailure::single(format!("`{s}` is not an ISO-8601 date"))),
        _ => Err(ParseFailure::expected("date", input)),
    }
}

/// A string of decimal digits, converted to a big integer.
pub(super) fn bigint(input: &Value) -> ParseResult {
    match input {
        Value::BigInt(_) => Ok(input.clone()),
        Value::String(s) => parse_bigint(s).map(Value::BigInt),
        _ => Err(ParseFailure::expected("bigint string", input)),
    }
}

fn parse_bigint(s: &str) -> Result<BigInt, ParseFailure> {
    if !INTEGER.is_match(s) {
        return Err(ParseFailure::single(format!("`{s}` is not an integer")));
    }
    s.parse::<BigInt>()
        .map_err(|err| ParseFailure::single(format!("`{s}` is not an integer: {err}")))
}

pub(super) fn literal(literal: &LiteralValue, input: &Value) -> ParseResult {
    match matches_literal(literal, input) {
        Some(value) => Ok(value),
        None => Err(ParseFailure::expected(literal, input)),
    }
}

pub(super) fn one_of(values: &[LiteralValue], input: &Value) -> ParseResult {
    if let Some(value) = values.iter().find_map(|v| matches_literal(v, input)) {
        return Ok(value);
    }
    let choices = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(" | ");
    Err(ParseFailure::expected(format_args!("one of {choices}"), input))
}

/// Strict equality. Big integer literals also match their decimal string.
fn matches_literal(literal: &LiteralValue, input: &Value) -> Option<Value> {
    match (literal, input) {
        (LiteralValue::String(a), Value::String(b)) if a == b => Some(input.clone()),
        (LiteralValue::Number(a), Value::Number(b)) if a == b => Some(input.clone()),
        (LiteralValue::Boolean(a), Value::Bool(b)) if a == b => Some(input.clone()),
        (LiteralValue::BigInt(digits), Value::BigInt(n)) if n.to_string() == *digits => {
            Some(input.clone())
        }
        (LiteralValue::BigInt(digits), Value::String(s)) if s == digits => {
            parse_bigint(s).ok().map(Value::BigInt)
        }
        _ => None,
    }
}

/// One anchored match; a mismatch is a single error with no breakdown.
pub(super) fn template(template: &TemplateParser, input: &Value) -> ParseResult {
    match input {
        Value::String(s) if template.pattern.is_match(s) => Ok(input.clone()),
        _ => Err(ParseFailure::single(format!("expected a string matching {}", template.display))),
    }
}
