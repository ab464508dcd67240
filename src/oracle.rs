//! Boundary with the host type checker.
//!
//! The builder never inspects source text. It walks the syntax handed to it
//! (`TypeNode`) and asks a `TypeOracle` whenever syntax alone is not enough:
//! what a name refers to, what an interface's members are, and what a mapped,
//! conditional, `keyof` or indexed-access type evaluates to.
pub mod module;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ir::{LiteralValue, PrimitiveKind};

pub use module::{ModuleOracle, TypeModule};

// ————————————————————————————————————————————————————————————————————————————
// LOCATIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self { file: file.into(), line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = if self.file.is_empty() { "<unknown>" } else { &self.file };
        write!(f, "{file}:{}:{}", self.line, self.column)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SYNTAX
// ————————————————————————————————————————————————————————————————————————————

/// Type syntax as written in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeNode {
    Keyword { keyword: Keyword },
    Literal { value: LiteralValue },
    Array { element: Box<TypeNode> },
    Tuple { elements: Vec<TupleMemberNode> },
    Union { members: Vec<TypeNode> },
    Intersection { members: Vec<TypeNode> },
    Parenthesized { inner: Box<TypeNode> },
    TypeLiteral { members: Vec<MemberSignature> },
    Reference(TypeReference),
    TemplateLiteral { head: String, spans: Vec<TemplateSpan> },
    Mapped(MappedNode),
    Conditional(ConditionalNode),
    IndexedAccess { object: Box<TypeNode>, index: Box<TypeNode> },
    TypeOperator { operator: TypeOperator, operand: Box<TypeNode> },
    Function {
        #[serde(default)]
        location: Location,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    String,
    Number,
    Boolean,
    Bigint,
    Null,
    Undefined,
    Void,
    Any,
    Unknown,
    Never,
    Object,
    Symbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeOperator {
    Keyof,
    Readonly,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<TypeNode>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleMemberNode {
    #[serde(rename = "type")]
    pub node: TypeNode,
    #[serde(default)]
    pub rest: bool,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpan {
    #[serde(rename = "type")]
    pub node: TypeNode,
    #[serde(default)]
    pub text: String,                       // literal text following the interpolation
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedNode {
    pub parameter: String,
    pub constraint: Box<TypeNode>,
    #[serde(default)]
    pub template: Option<Box<TypeNode>>,
    #[serde(default)]
    pub optional: Option<bool>,
    /// Evaluation attached by the host checker.
    #[serde(default)]
    pub resolved: Option<ResolvedType>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalNode {
    pub check: Box<TypeNode>,
    pub extends: Box<TypeNode>,
    pub true_type: Box<TypeNode>,
    pub false_type: Box<TypeNode>,
    /// Evaluation attached by the host checker.
    #[serde(default)]
    pub resolved: Option<ResolvedType>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MemberSignature {
    Property {
        name: PropertyName,
        #[serde(default)]
        optional: bool,
        #[serde(default, rename = "type")]
        node: Option<TypeNode>,
        #[serde(default)]
        location: Location,
    },
    Index {
        key: TypeNode,
        #[serde(rename = "type")]
        node: TypeNode,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        location: Location,
    },
    Method {
        name: PropertyName,
        #[serde(default)]
        location: Location,
    },
    Call {
        #[serde(default)]
        location: Location,
    },
    Construct {
        #[serde(default)]
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropertyName {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(String),
    Private(String),
    BindingPattern(String),
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Declaration {
    Interface(InterfaceDecl),
    Alias(AliasDecl),
    Enum(EnumDecl),
    EnumMember {
        enum_name: String,
        member: EnumMemberDecl,
        #[serde(default)]
        location: Location,
    },
    TypeParameter {
        name: String,
        #[serde(default)]
        location: Location,
    },
    Class {
        name: String,
        #[serde(default)]
        location: Location,
    },
    Import {
        name: String,
        target: String,
        #[serde(default)]
        location: Location,
    },
    /// Library declaration the checker knows natively (`Date`, `Array`, ...).
    Builtin { name: String },
    /// A symbol with neither value nor type information.
    Opaque {
        name: String,
        #[serde(default)]
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    #[serde(default)]
    pub extends: Vec<TypeReference>,
    #[serde(default)]
    pub members: Vec<MemberSignature>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDecl {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    #[serde(rename = "type")]
    pub body: TypeNode,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMemberDecl>,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMemberDecl {
    pub name: String,
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParamDecl {
    pub name: String,
    #[serde(default)]
    pub default: Option<TypeNode>,
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Interface(d) => &d.name,
            Declaration::Alias(d) => &d.name,
            Declaration::Enum(d) => &d.name,
            Declaration::EnumMember { member, .. } => &member.name,
            Declaration::TypeParameter { name, .. }
            | Declaration::Class { name, .. }
            | Declaration::Import { name, .. }
            | Declaration::Builtin { name }
            | Declaration::Opaque { name, .. } => name,
        }
    }

    pub fn type_params(&self) -> &[TypeParamDecl] {
        match self {
            Declaration::Interface(d) => &d.type_params,
            Declaration::Alias(d) => &d.type_params,
            _ => &[],
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVED TYPES
// ————————————————————————————————————————————————————————————————————————————

/// The checker's evaluated view of a type, used where syntax cannot be walked
/// without evaluating it first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResolvedType {
    Primitive { primitive: PrimitiveKind },
    Literal { value: LiteralValue },
    Object {
        #[serde(default)]
        properties: Vec<ResolvedProperty>,
        #[serde(default)]
        string_index: Option<Box<ResolvedType>>,
        #[serde(default)]
        number_index: Option<Box<ResolvedType>>,
    },
    Array { element: Box<ResolvedType> },
    Tuple { elements: Vec<ResolvedTupleElement> },
    Union { members: Vec<ResolvedType> },
    Intersection { members: Vec<ResolvedType> },
    Named(TypeReference),
    TypeParameter { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProperty {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(rename = "type")]
    pub resolved: ResolvedType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTupleElement {
    #[serde(rename = "type")]
    pub resolved: ResolvedType,
    #[serde(default)]
    pub rest: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// ORACLE
// ————————————————————————————————————————————————————————————————————————————

/// What the builder needs from a type checker.
///
/// `owner` names the declaration whose body contains the syntax being asked
/// about; it is how an oracle tells a type parameter apart from a global name.
pub trait TypeOracle {
    fn resolve_declaration(
        &self,
        reference: &TypeReference,
        owner: Option<&str>,
    ) -> Option<Declaration>;

    /// Own members of an interface or of an alias to a type literal.
    fn members_of(&self, declaration: &Declaration) -> Vec<MemberSignature> {
        match declaration {
            Declaration::Interface(d) => d.members.clone(),
            Declaration::Alias(AliasDecl { body: TypeNode::TypeLiteral { members }, .. }) => {
                members.clone()
            }
            _ => Vec::new(),
        }
    }

    fn type_arguments_of(&self, reference: &TypeReference) -> Vec<TypeNode> {
        reference.arguments.clone()
    }

    /// Evaluated form of mapped, conditional, `keyof` and indexed-access types.
    fn resolved_type(&self, node: &TypeNode, owner: Option<&str>) -> Option<ResolvedType>;

    fn is_well_known(&self, declaration: &Declaration, name: &str) -> bool;
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl TypeNode {
    pub fn keyword(keyword: Keyword) -> Self {
        TypeNode::Keyword { keyword }
    }
    pub fn string() -> Self {
        Self::keyword(Keyword::String)
    }
    pub fn number() -> Self {
        Self::keyword(Keyword::Number)
    }
    pub fn boolean() -> Self {
        Self::keyword(Keyword::Boolean)
    }
    pub fn literal(value: LiteralValue) -> Self {
        TypeNode::Literal { value }
    }
    pub fn array(element: TypeNode) -> Self {
        TypeNode::Array { element: Box::new(element) }
    }
    pub fn union(members: Vec<TypeNode>) -> Self {
        TypeNode::Union { members }
    }
    pub fn intersection(members: Vec<TypeNode>) -> Self {
        TypeNode::Intersection { members }
    }
    pub fn type_literal(members: Vec<MemberSignature>) -> Self {
        TypeNode::TypeLiteral { members }
    }

    pub fn reference(name: impl Into<String>, arguments: Vec<TypeNode>) -> Self {
        TypeNode::Reference(TypeReference {
            name: name.into(),
            arguments,
            location: Location::default(),
        })
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::reference(name, Vec::new())
    }
}

impl MemberSignature {
    pub fn property(name: impl Into<String>, optional: bool, node: TypeNode) -> Self {
        MemberSignature::Property {
            name: PropertyName::Identifier(name.into()),
            optional,
            node: Some(node),
            location: Location::default(),
        }
    }

    pub fn index(key: TypeNode, node: TypeNode) -> Self {
        MemberSignature::Index { key, node, optional: false, location: Location::default() }
    }
}

impl TupleMemberNode {
    pub fn required(node: TypeNode) -> Self {
        Self { node, rest: false, optional: false }
    }
    pub fn rest(node: TypeNode) -> Self {
        Self { node, rest: true, optional: false }
    }
}
