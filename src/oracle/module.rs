//! In-memory oracle over a declaration document exported by a host checker.
//!
//! The document lists declarations by name plus an import alias table. This
//! oracle answers name resolution itself, evaluates `keyof` and indexed
//! access over non-generic object declarations, and hands back whatever
//! evaluation the host attached to mapped and conditional nodes.
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    Declaration, Keyword, MemberSignature, PropertyName, ResolvedProperty, ResolvedTupleElement,
    ResolvedType, TypeNode, TypeOperator, TypeOracle, TypeReference,
};
use crate::ir::{LiteralValue, PrimitiveKind};
use crate::path_de::{from_str_with_path, DocumentError};

/// Library declarations every module can see.
pub const WELL_KNOWN: &[&str] = &["Date", "Array", "ReadonlyArray", "Record"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeModule {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    /// local alias → imported declaration name
    #[serde(default)]
    pub imports: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ModuleOracle {
    module: TypeModule,
    by_name: HashMap<String, usize>,
}

impl ModuleOracle {
    pub fn new(module: TypeModule) -> Self {
        let by_name = module
            .declarations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        Self { module, by_name }
    }

    pub fn from_json_str(src: &str) -> Result<Self, DocumentError> {
        from_str_with_path::<TypeModule>(src).map(Self::new)
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.by_name.get(name).map(|&i| &self.module.declarations[i])
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.module.declarations.iter()
    }

    pub fn file(&self) -> &str {
        &self.module.file
    }

    fn lookup(&self, name: &str) -> Option<Declaration> {
        if let Some(target) = self.module.imports.get(name) {
            return Some(Declaration::Import {
                name: name.to_string(),
                target: target.clone(),
                location: Default::default(),
            });
        }
        if let Some(decl) = self.declaration(name) {
            return Some(decl.clone());
        }
        // `Enum.Member`
        if let Some((enum_name, member_name)) = name.split_once('.') {
            if let Some(Declaration::Enum(e)) = self.declaration(enum_name) {
                let member = e.members.iter().find(|m| m.name == member_name)?;
                return Some(Declaration::EnumMember {
                    enum_name: e.name.clone(),
                    member: member.clone(),
                    location: e.location.clone(),
                });
            }
        }
        if WELL_KNOWN.contains(&name) {
            return Some(Declaration::Builtin { name: name.to_string() });
        }
        None
    }

    // ------------------------------ keyof / T[K] ------------------------------ //

    /// Members of a non-generic object type, following `extends` and imports.
    fn object_members(
        &self,
        node: &TypeNode,
        seen: &mut HashSet<String>,
    ) -> Option<Vec<MemberSignature>> {
        match node {
            TypeNode::Parenthesized { inner } => self.object_members(inner, seen),
            TypeNode::TypeLiteral { members } => Some(members.clone()),
            TypeNode::Reference(r) if r.arguments.is_empty() => {
                if !seen.insert(r.name.clone()) {
                    return Some(Vec::new());
                }
                match self.lookup(&r.name)? {
                    Declaration::Import { target, .. } => {
                        self.object_members(&TypeNode::named(target), seen)
                    }
                    Declaration::Interface(i) if i.type_params.is_empty() => {
                        let mut out = Vec::new();
                        for base in &i.extends {
                            let base = TypeNode::Reference(base.clone());
                            out.extend(self.object_members(&base, seen)?);
                        }
                        out.extend(i.members.iter().cloned());
                        Some(out)
                    }
                    Declaration::Alias(a) if a.type_params.is_empty() => {
                        self.object_members(&a.body, seen)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn keyof(&self, operand: &TypeNode) -> Option<ResolvedType> {
        let members = self.object_members(operand, &mut HashSet::new())?;
        let mut keys = Vec::new();
        for m in &members {
            if let MemberSignature::Property { name, .. } | MemberSignature::Method { name, .. } = m
            {
                let key = property_key(name)?;
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        let mut keys: Vec<ResolvedType> = keys
            .into_iter()
            .map(|k| ResolvedType::Literal { value: LiteralValue::String(k) })
            .collect();
        match keys.len() {
            0 => None,                      // keyof {} is never
            1 => keys.pop(),
            _ => Some(ResolvedType::Union { members: keys }),
        }
    }

    fn indexed_access(&self, object: &TypeNode, index: &TypeNode) -> Option<ResolvedType> {
        let members = self.object_members(object, &mut HashSet::new())?;
        let mut out = Vec::new();
        for key in literal_keys(index)? {
            let node = members.iter().find_map(|m| match m {
                MemberSignature::Property { name, node, optional, .. }
                    if property_key(name).as_deref() == Some(key.as_str()) =>
                {
                    Some((node.clone(), *optional))
                }
                _ => None,
            })?;
            let (node, optional) = node;
            let resolved = match node {
                Some(n) => resolve_syntax(&n)?,
                None => ResolvedType::Primitive { primitive: PrimitiveKind::Any },
            };
            out.push(resolved);
            if optional {
                out.push(ResolvedType::Primitive { primitive: PrimitiveKind::Undefined });
            }
        }
        match out.len() {
            0 => None,
            1 => out.pop(),
            _ => Some(ResolvedType::Union { members: out }),
        }
    }
}

impl TypeOracle for ModuleOracle {
    fn resolve_declaration(
        &self,
        reference: &TypeReference,
        owner: Option<&str>,
    ) -> Option<Declaration> {
        let owner_decl = owner.and_then(|o| self.declaration(o));
        if let Some(decl) = owner_decl {
            if decl.type_params().iter().any(|p| p.name == reference.name) {
                return Some(Declaration::TypeParameter {
                    name: reference.name.clone(),
                    location: reference.location.clone(),
                });
            }
        }
        self.lookup(&reference.name)
    }

    fn resolved_type(&self, node: &TypeNode, owner: Option<&str>) -> Option<ResolvedType> {
        match node {
            TypeNode::Mapped(m) => m.resolved.clone(),
            TypeNode::Conditional(c) => c.resolved.clone(),
            TypeNode::TypeOperator { operator: TypeOperator::Keyof, operand } => {
                self.keyof(operand)
            }
            TypeNode::IndexedAccess { object, index } => self.indexed_access(object, index),
            TypeNode::Parenthesized { inner } => self.resolved_type(inner, owner),
            _ => None,
        }
    }

    fn is_well_known(&self, declaration: &Declaration, name: &str) -> bool {
        matches!(declaration, Declaration::Builtin { name: n } if n == name)
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn property_key(name: &PropertyName) -> Option<String> {
    match name {
        PropertyName::Identifier(s) | PropertyName::String(s) => Some(s.clone()),
        PropertyName::Number(n) => Some(crate::ir::format_number(*n)),
        PropertyName::Computed(_)
        | PropertyName::Private(_)
        | PropertyName::BindingPattern(_) => None,
    }
}

fn literal_keys(index: &TypeNode) -> Option<Vec<String>> {
    match index {
        TypeNode::Literal { value: LiteralValue::String(s) } => Some(vec![s.clone()]),
        TypeNode::Literal { value: LiteralValue::Number(n) } => {
            Some(vec![crate::ir::format_number(*n)])
        }
        TypeNode::Parenthesized { inner } => literal_keys(inner),
        TypeNode::Union { members } => {
            let mut out = Vec::new();
            for m in members {
                out.extend(literal_keys(m)?);
            }
            Some(out)
        }
        _ => None,
    }
}

/// Evaluate plain syntax that needs no checker knowledge. Anything that does
/// (nested mapped types, `keyof`, functions) is out of reach here.
fn resolve_syntax(node: &TypeNode) -> Option<ResolvedType> {
    Some(match node {
        TypeNode::Keyword { keyword } => ResolvedType::Primitive {
            primitive: match keyword {
                Keyword::String => PrimitiveKind::String,
                Keyword::Number => PrimitiveKind::Number,
                Keyword::Boolean => PrimitiveKind::Boolean,
                Keyword::Bigint => PrimitiveKind::Bigint,
                Keyword::Null => PrimitiveKind::Null,
                Keyword::Undefined | Keyword::Void => PrimitiveKind::Undefined,
                Keyword::Any | Keyword::Unknown => PrimitiveKind::Any,
                Keyword::Never | Keyword::Object | Keyword::Symbol => return None,
            },
        },
        TypeNode::Literal { value } => ResolvedType::Literal { value: value.clone() },
        TypeNode::Array { element } => {
            ResolvedType::Array { element: Box::new(resolve_syntax(element)?) }
        }
        TypeNode::Tuple { elements } => ResolvedType::Tuple {
            elements: elements
                .iter()
                .map(|e| {
                    let resolved = match (&e.node, e.rest) {
                        (TypeNode::Array { element }, true) => resolve_syntax(element)?,
                        (_, true) => return None,
                        (n, false) => resolve_syntax(n)?,
                    };
                    Some(ResolvedTupleElement { resolved, rest: e.rest })
                })
                .collect::<Option<_>>()?,
        },
        TypeNode::Union { members } => ResolvedType::Union {
            members: members.iter().map(resolve_syntax).collect::<Option<_>>()?,
        },
        TypeNode::Intersection { members } => ResolvedType::Intersection {
            members: members.iter().map(resolve_syntax).collect::<Option<_>>()?,
        },
        TypeNode::Parenthesized { inner } => resolve_syntax(inner)?,
        TypeNode::Reference(r) => ResolvedType::Named(r.clone()),
        TypeNode::TypeLiteral { members } => {
            let mut properties = Vec::new();
            let mut string_index = None;
            let mut number_index = None;
            for m in members {
                match m {
                    MemberSignature::Property { name, optional, node, .. } => {
                        properties.push(ResolvedProperty {
                            name: property_key(name)?,
                            optional: *optional,
                            resolved: match node {
                                Some(n) => resolve_syntax(n)?,
                                None => ResolvedType::Primitive { primitive: PrimitiveKind::Any },
                            },
                        });
                    }
                    MemberSignature::Index {
                        key: TypeNode::Keyword { keyword: Keyword::String },
                        node,
                        ..
                    } => {
                        string_index = Some(Box::new(resolve_syntax(node)?));
                    }
                    MemberSignature::Index {
                        key: TypeNode::Keyword { keyword: Keyword::Number },
                        node,
                        ..
                    } => {
                        number_index = Some(Box::new(resolve_syntax(node)?));
                    }
                    _ => return None,
                }
            }
            ResolvedType::Object { properties, string_index, number_index }
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{
        AliasDecl, EnumDecl, EnumMemberDecl, InterfaceDecl, Location, TypeParamDecl,
    };
    use pretty_assertions::assert_eq;

    fn user_module() -> ModuleOracle {
        ModuleOracle::new(TypeModule {
            file: "user.ts".into(),
            declarations: vec![
                Declaration::Interface(InterfaceDecl {
                    name: "User".into(),
                    type_params: vec![],
                    extends: vec![],
                    members: vec![
                        MemberSignature::property("id", false, TypeNode::number()),
                        MemberSignature::property("nick", true, TypeNode::string()),
                    ],
                    location: Location::new("user.ts", 1, 1),
                }),
                Declaration::Alias(AliasDecl {
                    name: "Box".into(),
                    type_params: vec![TypeParamDecl { name: "T".into(), default: None }],
                    body: TypeNode::named("T"),
                    location: Location::new("user.ts", 5, 1),
                }),
                Declaration::Enum(EnumDecl {
                    name: "Color".into(),
                    members: vec![EnumMemberDecl {
                        name: "Red".into(),
                        value: LiteralValue::String("red".into()),
                    }],
                    location: Location::default(),
                }),
            ],
            imports: IndexMap::from([("Person".to_string(), "User".to_string())]),
        })
    }

    fn reference(name: &str) -> TypeReference {
        TypeReference { name: name.into(), arguments: vec![], location: Location::default() }
    }

    #[test]
    fn owner_type_params_shadow_globals() {
        let oracle = user_module();
        let decl = oracle.resolve_declaration(&reference("T"), Some("Box")).unwrap();
        assert!(matches!(decl, Declaration::TypeParameter { .. }));
        assert!(oracle.resolve_declaration(&reference("T"), None).is_none());
    }

    #[test]
    fn imports_enum_members_and_builtins_resolve() {
        let oracle = user_module();
        assert!(matches!(
            oracle.resolve_declaration(&reference("Person"), None),
            Some(Declaration::Import { target, .. }) if target == "User"
        ));
        assert!(matches!(
            oracle.resolve_declaration(&reference("Color.Red"), None),
            Some(Declaration::EnumMember { enum_name, .. }) if enum_name == "Color"
        ));
        let date = oracle.resolve_declaration(&reference("Date"), None).unwrap();
        assert!(oracle.is_well_known(&date, "Date"));
        assert!(!oracle.is_well_known(&date, "Array"));
    }

    #[test]
    fn keyof_lists_property_names() {
        let oracle = user_module();
        let node = TypeNode::TypeOperator {
            operator: TypeOperator::Keyof,
            operand: Box::new(TypeNode::named("User")),
        };
        assert_eq!(
            oracle.resolved_type(&node, None),
            Some(ResolvedType::Union {
                members: vec![
                    ResolvedType::Literal { value: LiteralValue::String("id".into()) },
                    ResolvedType::Literal { value: LiteralValue::String("nick".into()) },
                ]
            })
        );
    }

    #[test]
    fn indexed_access_adds_undefined_for_optional_members() {
        let oracle = user_module();
        let node = TypeNode::IndexedAccess {
            object: Box::new(TypeNode::named("User")),
            index: Box::new(TypeNode::literal(LiteralValue::String("nick".into()))),
        };
        assert_eq!(
            oracle.resolved_type(&node, None),
            Some(ResolvedType::Union {
                members: vec![
                    ResolvedType::Primitive { primitive: PrimitiveKind::String },
                    ResolvedType::Primitive { primitive: PrimitiveKind::Undefined },
                ]
            })
        );
    }

    #[test]
    fn loads_from_json_document() {
        let src = r#"{
            "file": "shapes.ts",
            "declarations": [
                {"kind": "alias", "name": "Id", "type": {"kind": "keyword", "keyword": "string"}}
            ]
        }"#;
        let oracle = ModuleOracle::from_json_str(src).unwrap();
        assert_eq!(oracle.file(), "shapes.ts");
        assert!(matches!(oracle.declaration("Id"), Some(Declaration::Alias(_))));
    }
}
