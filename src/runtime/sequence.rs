use super::{ParseError, ParseFailure, ParseResult, Parser, ParserArena, PathSegment, TupleSlot};
use crate::value::{UNDEFINED, Value};

pub(super) fn array(element: &Parser, input: &Value, arena: &ParserArena) -> ParseResult {
    let Value::Array(items) = input else {
        return Err(ParseFailure::expected("array", input));
    };
    let plan = vec![element; items.len()];
    run_plan(&plan, items, arena)
}

/// Bind every input index to a slot, then parse positionally.
///
/// Leading fixed slots bind forward from index 0. Fixed slots declared after
/// a rest slot bind backward from the end of the input, and the rest slot
/// takes whatever lies between the two. When the input is too short for the
/// fixed slots, the trailing ones land past the end and see `Undefined`.
pub(super) fn tuple(slots: &[TupleSlot], input: &Value, arena: &ParserArena) -> ParseResult {
    let Value::Array(items) = input else {
        return Err(ParseFailure::expected("tuple", input));
    };
    let Some(rest_at) = slots.iter().position(|s| s.rest) else {
        if items.len() > slots.len() {
            return Err(ParseFailure::single(format!(
                "expected at most {} elements, got {}",
                slots.len(),
                items.len()
            )));
        }
        let plan: Vec<&Parser> = slots.iter().map(|s| &s.parser).collect();
        return run_plan(&plan, items, arena);
    };

    let leading = &slots[..rest_at];
    let rest = &slots[rest_at].parser;
    let trailing = &slots[rest_at + 1..];

    // first input index owned by the trailing slots
    let tail_start = items.len().saturating_sub(trailing.len()).max(leading.len());
    let mut plan: Vec<&Parser> = vec![rest; tail_start + trailing.len()];

    for (i, slot) in leading.iter().enumerate() {
        plan[i] = &slot.parser;
    }
    let mut cursor = plan.len();
    for slot in trailing.iter().rev() {
        cursor -= 1;
        plan[cursor] = &slot.parser;
    }
    run_plan(&plan, items, arena)
}

/// Parse `items[i]` with `plan[i]`. Positions past the input are checked
/// against `Undefined` but not emitted.
fn run_plan(plan: &[&Parser], items: &[Value], arena: &ParserArena) -> ParseResult {
    let mut out = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (i, parser) in plan.iter().enumerate() {
        let item = items.get(i).unwrap_or(&UNDEFINED);
        match parser.parse(item, arena) {
            Ok(parsed) if i < items.len() => out.push(parsed),
            Ok(_) => {}
            Err(failure) => errors.push(ParseError::nested(PathSegment::Index(i), failure)),
        }
    }
    if errors.is_empty() { Ok(Value::Array(out)) } else { Err(ParseFailure { errors }) }
}
