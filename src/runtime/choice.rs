use indexmap::IndexMap;

use super::{ParseError, ParseFailure, ParseResult, Parser, ParserArena, PathSegment};
use crate::value::Value;

/// First alternative that accepts wins. Otherwise one error whose children
/// are the alternatives' failures, by position.
pub(super) fn union(alternatives: &[Parser], input: &Value, arena: &ParserArena) -> ParseResult {
    let mut failures = Vec::with_capacity(alternatives.len());
    for (i, alternative) in alternatives.iter().enumerate() {
        match alternative.parse(input, arena) {
            Ok(parsed) => return Ok(parsed),
            Err(failure) => failures.push(ParseError::nested(PathSegment::Index(i), failure)),
        }
    }
    Err(ParseFailure {
        errors: vec![ParseError {
            message: "no union alternative matched".into(),
            path: None,
            errors: failures,
        }],
    })
}

/// Every part sees the same input. Object results are shallow-merged in
/// order, later keys overwriting earlier ones; any other result replaces the
/// accumulator outright.
pub(super) fn intersection(parts: &[Parser], input: &Value, arena: &ParserArena) -> ParseResult {
    let mut acc: Option<Value> = None;
    for (i, part) in parts.iter().enumerate() {
        let parsed = part
            .parse(input, arena)
            .map_err(|failure| ParseFailure {
                errors: vec![ParseError::nested(PathSegment::Index(i), failure)],
            })?;
        acc = Some(match (acc, parsed) {
            (Some(Value::Object(mut merged)), Value::Object(next)) => {
                merged.extend(next);
                Value::Object(merged)
            }
            (_, next) => next,
        });
    }
    Ok(acc.unwrap_or_else(|| Value::Object(IndexMap::new())))
}

#[cfg(test)]
mod tests {
    use crate::ir::LiteralValue;
    use crate::runtime::{FieldParser, ObjectParser, Parser, ParserArena, PathSegment};
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(parser: &Parser, input: serde_json::Value) -> crate::runtime::ParseResult {
        parser.parse(&Value::from(input), &ParserArena::default())
    }

    fn object(name: &str, parser: Parser) -> Parser {
        Parser::Object(ObjectParser {
            fields: vec![FieldParser { name: name.into(), optional: false, parser }],
            indexes: vec![],
        })
    }

    #[test]
    fn union_tries_alternatives_in_order() {
        let parser =
            Parser::Union(vec![Parser::String, Parser::Literal(LiteralValue::Number(1.0))]);
        assert_eq!(run(&parser, json!("1")).unwrap(), Value::from("1"));
        assert_eq!(run(&parser, json!(1)).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn union_failure_lists_every_alternative() {
        let parser = Parser::Union(vec![Parser::String, Parser::Number]);
        let err = run(&parser, json!(true)).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        let children: Vec<_> = err.errors[0].errors.iter().map(|e| e.path.clone()).collect();
        assert_eq!(children, vec![Some(PathSegment::Index(0)), Some(PathSegment::Index(1))]);
    }

    #[test]
    fn intersection_later_parts_win_on_collision() {
        let parser =
            Parser::Intersection(vec![object("a", Parser::Any), object("a", Parser::Number)]);
        let v = run(&parser, json!({"a": 2})).unwrap();
        assert_eq!(v.get("a"), &Value::Number(2.0));
    }

    #[test]
    fn intersection_merges_members_of_every_part() {
        let parser =
            Parser::Intersection(vec![object("a", Parser::Number), object("b", Parser::String)]);
        let v = run(&parser, json!({"a": 1, "b": "x", "c": null})).unwrap();
        assert_eq!(v.to_json(), json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn intersection_stops_at_the_first_failure() {
        let parser =
            Parser::Intersection(vec![object("a", Parser::Number), object("b", Parser::String)]);
        let err = run(&parser, json!({"a": "no", "b": 1})).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, Some(PathSegment::Index(0)));
    }
}
