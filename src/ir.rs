//! Structural model of a type's shape. Pure data: the builder produces it, the
//! generator lowers it, and it is what client and server exchange.
use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Model {
    Primitive { kind: PrimitiveKind },
    Literal { value: LiteralValue },
    Object { members: Vec<ObjectEntry> },       // named members first, then index members
    Array { element: Box<Model> },
    Tuple { elements: Vec<TupleElement> },
    Union { members: Vec<Model> },              // order is the try-order
    Intersection { members: Vec<Model> },       // order is the merge-order
    Enum { name: String, members: Vec<EnumMember> },
    Reference {
        name: String,                           // canonical, e.g. `Box<number>`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<Model>>,
    },
    TemplateLiteral { parts: Vec<Model> },      // string literals are text, the rest interpolations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Any,
    Date,
    Bigint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    BigInt(String),                             // decimal digits, optional leading `-`
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ObjectEntry {
    Member(Member),
    Index(IndexMember),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub optional: bool,
    pub model: Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMember {
    pub key: Model,                             // string, number or template literal
    pub optional: bool,
    pub model: Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleElement {
    pub position: usize,
    pub model: Model,                           // for rest elements: the element type
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: LiteralValue,
}

/// Interchange form: every named type appears once in `dependencies` and is
/// referenced by canonical name everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub roots: IndexMap<String, Model>,
    pub dependencies: IndexMap<String, Model>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Model {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Model::Primitive { kind }
    }
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }
    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number)
    }
    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }
    pub fn undefined() -> Self {
        Self::primitive(PrimitiveKind::Undefined)
    }
    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    pub fn literal(value: LiteralValue) -> Self {
        Model::Literal { value }
    }
    pub fn string_literal(s: impl Into<String>) -> Self {
        Self::literal(LiteralValue::String(s.into()))
    }
    pub fn number_literal(n: f64) -> Self {
        Self::literal(LiteralValue::Number(n))
    }
    pub fn boolean_literal(b: bool) -> Self {
        Self::literal(LiteralValue::Boolean(b))
    }

    pub fn array(element: Model) -> Self {
        Model::Array { element: Box::new(element) }
    }
    pub fn union(members: Vec<Model>) -> Self {
        Model::Union { members }
    }
    pub fn intersection(members: Vec<Model>) -> Self {
        Model::Intersection { members }
    }
    pub fn object(members: Vec<ObjectEntry>) -> Self {
        Model::Object { members }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Model::Reference { name: name.into(), arguments: None }
    }

    pub fn member(name: impl Into<String>, optional: bool, model: Model) -> ObjectEntry {
        ObjectEntry::Member(Member { name: name.into(), optional, model })
    }

    pub fn index(key: Model, optional: bool, model: Model) -> ObjectEntry {
        ObjectEntry::Index(IndexMember { key, optional, model })
    }

    /// TypeScript-flavoured text for this model. Used to spell type arguments
    /// inside canonical names, so it must be deterministic.
    pub fn display_name(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_display(&mut out);
        out
    }

    fn write_display(&self, out: &mut String) -> fmt::Result {
        match self {
            Model::Primitive { kind } => out.write_str(kind.keyword()),
            Model::Literal { value } => write!(out, "{value}"),
            Model::Object { members } => {
                if members.is_empty() {
                    return out.write_str("{}");
                }
                out.write_str("{ ")?;
                for (i, entry) in members.iter().enumerate() {
                    if i > 0 {
                        out.write_str("; ")?;
                    }
                    match entry {
                        ObjectEntry::Member(m) => {
                            write!(out, "{}{}: ", m.name, if m.optional { "?" } else { "" })?;
                            m.model.write_display(out)?;
                        }
                        ObjectEntry::Index(ix) => {
                            out.write_str("[key: ")?;
                            ix.key.write_display(out)?;
                            write!(out, "]{}: ", if ix.optional { "?" } else { "" })?;
                            ix.model.write_display(out)?;
                        }
                    }
                }
                out.write_str(" }")
            }
            Model::Array { element } => {
                element.write_operand(out)?;
                out.write_str("[]")
            }
            Model::Tuple { elements } => {
                out.write_char('[')?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    if el.rest {
                        out.write_str("...")?;
                        el.model.write_operand(out)?;
                        out.write_str("[]")?;
                    } else {
                        el.model.write_display(out)?;
                    }
                }
                out.write_char(']')
            }
            Model::Union { members } => write_joined(out, members, " | "),
            Model::Intersection { members } => write_joined(out, members, " & "),
            Model::Enum { name, .. } => out.write_str(name),
            Model::Reference { name, .. } => out.write_str(name),
            Model::TemplateLiteral { parts } => {
                out.write_char('`')?;
                for part in parts {
                    match part {
                        Model::Literal { value: LiteralValue::String(text) } => {
                            out.write_str(text)?
                        }
                        other => {
                            out.write_str("${")?;
                            other.write_display(out)?;
                            out.write_char('}')?;
                        }
                    }
                }
                out.write_char('`')
            }
        }
    }

    // Operands of `[]` need parentheses around unions and intersections.
    fn write_operand(&self, out: &mut String) -> fmt::Result {
        match self {
            Model::Union { .. } | Model::Intersection { .. } => {
                out.write_char('(')?;
                self.write_display(out)?;
                out.write_char(')')
            }
            _ => self.write_display(out),
        }
    }

    /// Every canonical name this model points at, in traversal order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Model::Primitive { .. } | Model::Literal { .. } | Model::Enum { .. } => {}
            Model::Object { members } => {
                for entry in members {
                    match entry {
                        ObjectEntry::Member(m) => m.model.collect_references(out),
                        ObjectEntry::Index(ix) => {
                            ix.key.collect_references(out);
                            ix.model.collect_references(out);
                        }
                    }
                }
            }
            Model::Array { element } => element.collect_references(out),
            Model::Tuple { elements } => {
                for el in elements {
                    el.model.collect_references(out);
                }
            }
            Model::Union { members }
            | Model::Intersection { members }
            | Model::TemplateLiteral { parts: members } => {
                for m in members {
                    m.collect_references(out);
                }
            }
            Model::Reference { name, arguments } => {
                out.push(name);
                for arg in arguments.iter().flatten() {
                    arg.collect_references(out);
                }
            }
        }
    }
}

fn write_joined(out: &mut String, members: &[Model], sep: &str) -> fmt::Result {
    for (i, m) in members.iter().enumerate() {
        if i > 0 {
            out.write_str(sep)?;
        }
        m.write_display(out)?;
    }
    Ok(())
}

impl PrimitiveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
            PrimitiveKind::Any => "any",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::Bigint => "bigint",
        }
    }
}

impl LiteralValue {
    /// The literal as it would appear inside a template string.
    pub fn text(&self) -> String {
        match self {
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Number(n) => format_number(*n),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::BigInt(digits) => digits.clone(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Number(n) => f.write_str(&format_number(*n)),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::BigInt(digits) => write!(f, "{digits}n"),
        }
    }
}

/// Integers print without a fractional part, like a JS number would.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl ModelDocument {
    /// Fold another document in. Canonical names are stable across builds, so
    /// a name present in both maps denotes the same model and the first wins.
    pub fn merge(&mut self, other: ModelDocument) {
        for (name, model) in other.roots {
            self.roots.entry(name).or_insert(model);
        }
        for (name, model) in other.dependencies {
            self.dependencies.entry(name).or_insert(model);
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_names_read_like_type_syntax() {
        let m = Model::object(vec![
            Model::member(
                "a",
                false,
                Model::array(Model::union(vec![Model::string(), Model::number()])),
            ),
            Model::member("b", true, Model::number_literal(1.0)),
            Model::index(Model::string(), false, Model::reference("Box<number>")),
        ]);
        assert_eq!(
            m.display_name(),
            "{ a: (string | number)[]; b?: 1; [key: string]: Box<number> }"
        );
    }

    #[test]
    fn template_display_keeps_text_and_interpolations() {
        let m = Model::TemplateLiteral {
            parts: vec![Model::string_literal("id-"), Model::number()],
        };
        assert_eq!(m.display_name(), "`id-${number}`");
    }

    #[test]
    fn serde_shape_is_tagged() {
        let m = Model::reference("Tree<number>");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!({"type": "reference", "name": "Tree<number>"}));
        let lit = serde_json::to_value(Model::string_literal("x")).unwrap();
        assert_eq!(
            lit,
            serde_json::json!({"type": "literal", "value": {"kind": "string", "value": "x"}})
        );
    }

    #[test]
    fn references_are_collected_in_order() {
        let m = Model::union(vec![
            Model::reference("A"),
            Model::array(Model::reference("B")),
            Model::Reference { name: "C<D>".into(), arguments: Some(vec![Model::reference("D")]) },
        ]);
        assert_eq!(m.references(), vec!["A", "B", "C<D>", "D"]);
    }

    #[test]
    fn merge_keeps_first_definition() {
        let mut a = ModelDocument::default();
        a.dependencies.insert("X".into(), Model::string());
        let mut b = ModelDocument::default();
        b.dependencies.insert("X".into(), Model::number());
        b.dependencies.insert("Y".into(), Model::number());
        a.merge(b);
        assert_eq!(a.dependencies.len(), 2);
        assert_eq!(a.dependencies["X"], Model::string());
    }
}
