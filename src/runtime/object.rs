use indexmap::IndexMap;

use super::{
    IndexParser, ObjectParser, ParseError, ParseFailure, ParseResult, ParserArena, PathSegment,
};
use crate::value::Value;

/// Dynamic keys first (those not claimed by a named member), then named
/// members in declaration order. Without index members, unclaimed keys are
/// dropped; with them, a key no index member accepts is an error.
pub(super) fn parse(object: &ObjectParser, input: &Value, arena: &ParserArena) -> ParseResult {
    let Value::Object(map) = input else {
        return Err(ParseFailure::expected("object", input));
    };
    let mut out = IndexMap::with_capacity(map.len());
    let mut errors = Vec::new();

    // 1) index members
    if !object.indexes.is_empty() {
        for (key, value) in map {
            if object.fields.iter().any(|f| f.name == *key) {
                continue;
            }
            let Some(index) = object.indexes.iter().find(|ix| ix.key.accepts(key)) else {
                let failure = ParseFailure::single(format!(
                    "key does not match the index signature ({})",
                    index_keys(&object.indexes)
                ));
                errors.push(ParseError::nested(PathSegment::Key(key.clone()), failure));
                continue;
            };
            if index.optional && value.is_undefined() {
                out.insert(key.clone(), Value::Undefined);
                continue;
            }
            match index.parser.parse(value, arena) {
                Ok(parsed) => {
                    out.insert(key.clone(), parsed);
                }
                Err(failure) => {
                    errors.push(ParseError::nested(PathSegment::Key(key.clone()), failure));
                }
            }
        }
    }

    // 2) named members
    for field in &object.fields {
        let value = input.get(&field.name);
        if field.optional && value.is_undefined() {
            continue;
        }
        match field.parser.parse(value, arena) {
            Ok(parsed) => {
                out.insert(field.name.clone(), parsed);
            }
            Err(failure) => {
                errors.push(ParseError::nested(PathSegment::Key(field.name.clone()), failure));
            }
        }
    }

    if errors.is_empty() { Ok(Value::Object(out)) } else { Err(ParseFailure { errors }) }
}

/// `number | id-${number}`
fn index_keys(indexes: &[IndexParser]) -> String {
    indexes.iter().map(|ix| ix.key.to_string()).collect::<Vec<_>>().join(" | ")
}

#[cfg(test)]
mod tests {
    use crate::runtime::{
        FieldParser, IndexParser, KeyParser, ObjectParser, Parser, ParserArena, PathSegment,
    };
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(name: &str, optional: bool, parser: Parser) -> FieldParser {
        FieldParser { name: name.into(), optional, parser }
    }

    fn number_index(parser: Parser) -> IndexParser {
        IndexParser { key: KeyParser::Number, optional: false, parser }
    }

    fn run(object: ObjectParser, input: serde_json::Value) -> crate::runtime::ParseResult {
        Parser::Object(object).parse(&Value::from(input), &ParserArena::default())
    }

    #[test]
    fn optional_member_is_skipped_when_absent() {
        let object =
            ObjectParser { fields: vec![field("a", true, Parser::Number)], indexes: vec![] };
        assert_eq!(run(object.clone(), json!({})).unwrap().to_json(), json!({}));

        let err = run(object, json!({"a": "x"})).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, Some(PathSegment::Key("a".into())));
    }

    #[test]
    fn null_is_not_an_object() {
        let object =
            ObjectParser { fields: vec![field("a", false, Parser::Number)], indexes: vec![] };
        let err = run(object, json!(null)).unwrap_err();
        assert_eq!(err.errors[0].message, "expected object, got null");
        assert_eq!(err.errors[0].path, None);
    }

    #[test]
    fn unclaimed_keys_are_dropped() {
        let object =
            ObjectParser { fields: vec![field("a", false, Parser::Number)], indexes: vec![] };
        assert_eq!(run(object, json!({"a": 1, "b": 2})).unwrap().to_json(), json!({"a": 1}));
    }

    #[test]
    fn index_members_validate_dynamic_keys() {
        let object = ObjectParser {
            fields: vec![field("name", false, Parser::String)],
            indexes: vec![number_index(Parser::Boolean)],
        };
        let ok = run(object.clone(), json!({"name": "n", "1": true})).unwrap();
        assert_eq!(ok.to_json(), json!({"1": true, "name": "n"}));

        let err = run(object, json!({"name": "n", "2": "no"})).unwrap_err();
        assert_eq!(err.errors[0].path, Some(PathSegment::Key("2".into())));
    }

    #[test]
    fn keys_rejected_by_every_index_member_are_errors() {
        let object = ObjectParser {
            fields: vec![],
            indexes: vec![number_index(Parser::Boolean)],
        };
        let err = run(object, json!({"x": true, "1": false})).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, Some(PathSegment::Key("x".into())));
        assert_eq!(err.errors[0].message, "key does not match the index signature (number)");
    }

    #[test]
    fn named_members_are_not_checked_against_index_keys() {
        let object = ObjectParser {
            fields: vec![field("name", false, Parser::String)],
            indexes: vec![number_index(Parser::Boolean)],
        };
        assert_eq!(run(object, json!({"name": "n"})).unwrap().to_json(), json!({"name": "n"}));
    }

    #[test]
    fn every_failing_member_is_reported_in_order() {
        let object = ObjectParser {
            fields: vec![field("a", false, Parser::Number), field("b", false, Parser::String)],
            indexes: vec![],
        };
        let err = run(object, json!({})).unwrap_err();
        let paths: Vec<_> = err.errors.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![Some(PathSegment::Key("a".into())), Some(PathSegment::Key("b".into()))]
        );
    }
}
