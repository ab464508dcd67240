//! Parser generator. Each model variant lowers to exactly one combinator;
//! references lower to an arena slot so recursive types stay recursive
//! instead of being inlined.
pub mod template;

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::builder::BuiltModel;
use crate::error::GenerationError;
use crate::ir::{LiteralValue, Model, ModelDocument, ObjectEntry, PrimitiveKind};
use crate::runtime::{
    FieldParser, IndexParser, KeyParser, ObjectParser, ParseResult, Parser, ParserArena, SlotId,
    TupleSlot,
};
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Canonical name → arena slot.
pub type SymbolTable = IndexMap<String, SlotId>;

/// Every named validator plus the lowered roots.
#[derive(Debug, Clone, Default)]
pub struct Validators {
    arena: ParserArena,
    roots: IndexMap<String, Parser>,
}

/// The `(unknown) → ParseResult` surface for one type.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'v> {
    parser: &'v Parser,
    arena: &'v ParserArena,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Validators for a freshly built model. The root is registered under its
/// display name, which for a named type is its canonical name.
pub fn generate(built: &BuiltModel) -> Result<Validators, GenerationError> {
    Validators::from_built(built)
}

/// Assign every dependency name a slot, in dependency-map order.
pub fn symbols(dependencies: &IndexMap<String, Model>) -> SymbolTable {
    dependencies.keys().enumerate().map(|(slot, name)| (name.clone(), slot)).collect()
}

pub fn lower(
    model: &Model,
    symbols: &SymbolTable,
    dependencies: &IndexMap<String, Model>,
) -> Result<Parser, GenerationError> {
    let recur = |m: &Model| lower(m, symbols, dependencies);
    Ok(match model {
        Model::Primitive { kind } => Parser::primitive(*kind),
        Model::Literal { value } => Parser::Literal(value.clone()),
        Model::Object { members } => {
            let mut object = ObjectParser::default();
            for entry in members {
                match entry {
                    ObjectEntry::Member(m) => object.fields.push(FieldParser {
                        name: m.name.clone(),
                        optional: m.optional,
                        parser: recur(&m.model)?,
                    }),
                    ObjectEntry::Index(ix) => object.indexes.push(IndexParser {
                        key: key_parser(&ix.key, dependencies)?,
                        optional: ix.optional,
                        parser: recur(&ix.model)?,
                    }),
                }
            }
            Parser::Object(object)
        }
        Model::Array { element } => Parser::Array(Box::new(recur(element)?)),
        Model::Tuple { elements } => Parser::Tuple(
            elements
                .iter()
                .map(|el| -> Result<TupleSlot, GenerationError> {
                    Ok(TupleSlot { parser: recur(&el.model)?, rest: el.rest })
                })
                .collect::<Result<_, _>>()?,
        ),
        Model::Union { members } => Parser::Union(lower_union(members, symbols, dependencies)?),
        Model::Intersection { members } => {
            Parser::Intersection(members.iter().map(recur).collect::<Result<_, _>>()?)
        }
        Model::Enum { members, .. } => {
            Parser::Enum(members.iter().map(|m| m.value.clone()).collect())
        }
        Model::Reference { name, .. } => match symbols.get(name) {
            Some(slot) => Parser::Reference(*slot),
            None => return Err(GenerationError::MissingDependency { name: name.clone() }),
        },
        Model::TemplateLiteral { parts } => {
            Parser::TemplateLiteral(template::compile(parts, dependencies)?)
        }
    })
}

/// When both `true` and `false` literals appear they become one `boolean`
/// alternative, placed where the first of the two was.
fn lower_union(
    members: &[Model],
    symbols: &SymbolTable,
    dependencies: &IndexMap<String, Model>,
) -> Result<Vec<Parser>, GenerationError> {
    let is_bool = |m: &Model, b: bool| {
        matches!(m, Model::Literal { value: LiteralValue::Boolean(v) } if *v == b)
    };
    let collapse =
        members.iter().any(|m| is_bool(m, true)) && members.iter().any(|m| is_bool(m, false));
    let mut out = Vec::with_capacity(members.len());
    let mut placed = false;
    for member in members {
        if collapse && matches!(member, Model::Literal { value: LiteralValue::Boolean(_) }) {
            if !placed {
                out.push(Parser::Boolean);
                placed = true;
            }
            continue;
        }
        out.push(lower(member, symbols, dependencies)?);
    }
    Ok(out)
}

fn key_parser(
    key: &Model,
    dependencies: &IndexMap<String, Model>,
) -> Result<KeyParser, GenerationError> {
    let mut key = key;
    // follow aliases like `type Id = string`, bounded by the map size
    for _ in 0..=dependencies.len() {
        match key {
            Model::Primitive { kind: PrimitiveKind::String } => return Ok(KeyParser::String),
            Model::Primitive { kind: PrimitiveKind::Number } => return Ok(KeyParser::Number),
            Model::TemplateLiteral { parts } => {
                return Ok(KeyParser::Pattern(template::compile(parts, dependencies)?));
            }
            Model::Reference { name, .. } => match dependencies.get(name) {
                Some(target) => key = target,
                None => return Err(GenerationError::MissingDependency { name: name.clone() }),
            },
            _ => break,
        }
    }
    Err(GenerationError::UnsupportedIndexKey { key: key.display_name() })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

/// Every named type must reach an object, array, tuple or scalar before it
/// reaches itself again; otherwise its validator never returns.
fn check_productive(dependencies: &IndexMap<String, Model>) -> Result<(), GenerationError> {
    let mut marks = HashMap::with_capacity(dependencies.len());
    let mut path = Vec::new();
    for name in dependencies.keys() {
        visit(name, dependencies, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit<'m>(
    name: &'m str,
    dependencies: &'m IndexMap<String, Model>,
    marks: &mut HashMap<&'m str, Visit>,
    path: &mut Vec<&'m str>,
) -> Result<(), GenerationError> {
    match marks.get(name) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::Active) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Err(GenerationError::UnproductiveCycle { cycle: cycle.join(" -> ") });
        }
        None => {}
    }
    // missing entries are reported by `lower`
    let Some(model) = dependencies.get(name) else {
        return Ok(());
    };
    marks.insert(name, Visit::Active);
    path.push(name);
    let mut heads = Vec::new();
    head_references(model, &mut heads);
    for next in heads {
        visit(next, dependencies, marks, path)?;
    }
    path.pop();
    marks.insert(name, Visit::Done);
    Ok(())
}

/// References validated against the same input as `model` itself.
fn head_references<'m>(model: &'m Model, out: &mut Vec<&'m str>) {
    match model {
        Model::Reference { name, .. } => out.push(name),
        Model::Union { members } | Model::Intersection { members } => {
            for member in members {
                head_references(member, out);
            }
        }
        _ => {}
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATORS
// ————————————————————————————————————————————————————————————————————————————

impl Validators {
    pub fn from_built(built: &BuiltModel) -> Result<Self, GenerationError> {
        let mut doc =
            ModelDocument { roots: IndexMap::new(), dependencies: built.dependencies.clone() };
        doc.roots.insert(built.root.display_name(), built.root.clone());
        Self::from_document(&doc)
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(roots = doc.roots.len(), dependencies = doc.dependencies.len())
    )]
    pub fn from_document(doc: &ModelDocument) -> Result<Self, GenerationError> {
        // 1) slots, once no named type can loop on its own input
        check_productive(&doc.dependencies)?;
        let symbols = symbols(&doc.dependencies);
        // 2) named validators, in slot order
        let mut slots = IndexMap::with_capacity(doc.dependencies.len());
        for (name, model) in &doc.dependencies {
            slots.insert(name.clone(), lower(model, &symbols, &doc.dependencies)?);
        }
        // 3) roots
        let mut roots = IndexMap::with_capacity(doc.roots.len());
        for (name, model) in &doc.roots {
            roots.insert(name.clone(), lower(model, &symbols, &doc.dependencies)?);
        }
        debug!(slots = slots.len(), roots = roots.len(), "generated validators");
        Ok(Validators { arena: ParserArena::new(slots), roots })
    }

    /// A root by name, falling back to any named dependency.
    pub fn validator(&self, name: &str) -> Option<Validator<'_>> {
        let parser = self.roots.get(name).or_else(|| self.arena.by_name(name))?;
        Some(Validator { parser, arena: &self.arena })
    }

    pub fn parse(&self, name: &str, input: &Value) -> Result<ParseResult, GenerationError> {
        match self.validator(name) {
            Some(validator) => Ok(validator.parse(input)),
            None => Err(GenerationError::UnknownRoot { name: name.to_string() }),
        }
    }

    pub fn parse_json(
        &self,
        name: &str,
        input: &serde_json::Value,
    ) -> Result<ParseResult, GenerationError> {
        self.parse(name, &Value::from(input))
    }
}

impl Validator<'_> {
    pub fn parse(&self, input: &Value) -> ParseResult {
        self.parser.parse(input, self.arena)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
