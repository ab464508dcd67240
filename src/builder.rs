//! Model builder: walks type syntax with the help of a `TypeOracle` and
//! produces a `Model` plus the dependency map of every named type it reached.
//!
//! Dispatch happens on syntax first. Bare references go through the oracle,
//! because the same spelling can denote a library type (`Date`), a user
//! declaration, an enum or a type parameter, and only the checker knows which.
//!
//! Every call takes the dependency map by value and hands it back, threaded
//! through siblings left to right, so a dependency shared by two siblings is
//! built once. Named types reserve their canonical name before their body is
//! built; a reference that finds the name already present returns at once,
//! which is what terminates recursive and mutually recursive types.
pub mod deps;
mod object;
mod resolved;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ModelGenerationError;
use crate::ir::{EnumMember, Model, ModelDocument, PrimitiveKind, TupleElement};
use crate::oracle::{
    Declaration, Keyword, Location, TupleMemberNode, TypeNode, TypeOperator, TypeOracle,
    TypeReference,
};

pub use deps::{DependencyMap, TypeParamBinding, TypeParamMap};

type Built<T = Model> = Result<(T, DependencyMap), ModelGenerationError>;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Library types with a fixed structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WellKnown {
    Date,
    Array,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Nesting limit for syntax that is not broken up by named types.
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// A root model together with everything it references by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltModel {
    pub root: Model,
    pub dependencies: IndexMap<String, Model>,
}

impl BuiltModel {
    pub fn into_document(self, root_name: impl Into<String>) -> ModelDocument {
        let mut doc = ModelDocument { roots: IndexMap::new(), dependencies: self.dependencies };
        doc.roots.insert(root_name.into(), self.root);
        doc
    }
}

pub struct ModelBuilder<'o, O: ?Sized> {
    oracle: &'o O,
    options: BuildOptions,
}

/// Where a piece of syntax sits: the declaration that owns it, the type
/// parameters bound for the current instantiation, and the nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub owner: Option<&'a str>,
    pub params: &'a TypeParamMap,
    depth: usize,
}

impl<'a> Scope<'a> {
    pub fn root(params: &'a TypeParamMap) -> Self {
        Self { owner: None, params, depth: 0 }
    }

    fn declaration(owner: &'a str, params: &'a TypeParamMap, depth: usize) -> Self {
        Self { owner: Some(owner), params, depth }
    }

    fn deeper(self, limit: usize, location: &Location) -> Result<Self, ModelGenerationError> {
        if self.depth >= limit {
            return Err(ModelGenerationError::DepthLimitExceeded {
                limit,
                location: location.clone(),
            });
        }
        Ok(Self { depth: self.depth + 1, ..self })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Build one root with fresh maps.
pub fn build_model<O: TypeOracle + ?Sized>(
    oracle: &O,
    node: &TypeNode,
    location: &Location,
) -> Result<BuiltModel, ModelGenerationError> {
    ModelBuilder::new(oracle).build_root(node, location)
}

/// Build the model of a declaration by name.
pub fn build_declaration<O: TypeOracle + ?Sized>(
    oracle: &O,
    name: &str,
) -> Result<BuiltModel, ModelGenerationError> {
    build_model(oracle, &TypeNode::named(name), &Location::default())
}

/// Build independent roots in parallel and merge them into one document.
/// Each root gets its own map lineage; nothing is shared between workers.
#[tracing::instrument(level = "debug", skip_all, fields(roots = roots.len()))]
pub fn build_models<O: TypeOracle + Sync + ?Sized>(
    oracle: &O,
    roots: &[String],
    options: BuildOptions,
) -> Result<ModelDocument, ModelGenerationError> {
    let built = roots
        .par_iter()
        .map(|name| {
            let builder = ModelBuilder::new(oracle).with_options(options);
            builder
                .build_root(&TypeNode::named(name.as_str()), &Location::default())
                .map(|model| model.into_document(name.clone()))
        })
        .collect::<Vec<_>>();

    let mut doc = ModelDocument::default();
    for result in built {
        doc.merge(result?);
    }
    debug!(dependencies = doc.dependencies.len(), "merged root documents");
    Ok(doc)
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'o, O: TypeOracle + ?Sized> ModelBuilder<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self { oracle, options: BuildOptions::default() }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(location = %location))]
    pub fn build_root(
        &self,
        node: &TypeNode,
        location: &Location,
    ) -> Result<BuiltModel, ModelGenerationError> {
        let params = TypeParamMap::new();
        let (root, deps) = self.build(node, location, Scope::root(&params), DependencyMap::new())?;
        let dependencies = deps.finish()?;
        debug!(dependencies = dependencies.len(), "model built");
        Ok(BuiltModel { root, dependencies })
    }

    /// `build(typeRef, locationHint, scope, deps) -> (model, deps')`
    pub fn build(
        &self,
        node: &TypeNode,
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        let scope = scope.deeper(self.options.max_depth, location)?;
        match node {
            TypeNode::Keyword { keyword } => Ok((keyword_model(*keyword, location)?, deps)),
            TypeNode::Literal { value } => Ok((Model::literal(value.clone()), deps)),
            TypeNode::Array { element } => {
                let (element, deps) = self.build(element, location, scope, deps)?;
                Ok((Model::array(element), deps))
            }
            TypeNode::Tuple { elements } => self.build_tuple(elements, location, scope, deps),
            TypeNode::Union { members } => {
                let (members, deps) = self.build_all(members, location, scope, deps)?;
                Ok((Model::union(members), deps))
            }
            TypeNode::Intersection { members } => {
                let (members, deps) = self.build_all(members, location, scope, deps)?;
                Ok((Model::intersection(members), deps))
            }
            TypeNode::Parenthesized { inner } => self.build(inner, location, scope, deps),
            TypeNode::TypeLiteral { members } => self.build_members(members, location, scope, deps),
            TypeNode::Reference(reference) => {
                self.build_reference(reference, location, scope, deps)
            }
            TypeNode::TemplateLiteral { head, spans } => {
                let mut parts = Vec::with_capacity(spans.len() * 2 + 1);
                if !head.is_empty() {
                    parts.push(Model::string_literal(head.as_str()));
                }
                let mut deps = deps;
                for span in spans {
                    let (part, next) = self.build(&span.node, location, scope, deps)?;
                    deps = next;
                    parts.push(part);
                    if !span.text.is_empty() {
                        parts.push(Model::string_literal(span.text.as_str()));
                    }
                }
                Ok((Model::TemplateLiteral { parts }, deps))
            }
            TypeNode::Mapped(mapped) => {
                let here = pick(&mapped.location, location);
                self.build_from_checker(node, "mapped type", here, scope, deps)
            }
            TypeNode::Conditional(conditional) => {
                let here = pick(&conditional.location, location);
                self.build_from_checker(node, "conditional type", here, scope, deps)
            }
            TypeNode::IndexedAccess { .. } => {
                self.build_from_checker(node, "indexed access type", location, scope, deps)
            }
            TypeNode::TypeOperator { operator, operand } => match operator {
                TypeOperator::Keyof => {
                    self.build_from_checker(node, "keyof type", location, scope, deps)
                }
                TypeOperator::Readonly => self.build(operand, location, scope, deps),
                TypeOperator::Unique => {
                    Err(ModelGenerationError::unsupported("unique symbol types", location))
                }
            },
            TypeNode::Function { location: own } => {
                Err(ModelGenerationError::unsupported("function types", pick(own, location)))
            }
        }
    }

    /// Build siblings left to right, threading the map through.
    fn build_all(
        &self,
        nodes: &[TypeNode],
        location: &Location,
        scope: Scope<'_>,
        mut deps: DependencyMap,
    ) -> Built<Vec<Model>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let (model, next) = self.build(node, location, scope, deps)?;
            deps = next;
            out.push(model);
        }
        Ok((out, deps))
    }

    fn build_tuple(
        &self,
        elements: &[TupleMemberNode],
        location: &Location,
        scope: Scope<'_>,
        mut deps: DependencyMap,
    ) -> Built {
        let mut out = Vec::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            let (model, next) = self.build(&element.node, location, scope, deps)?;
            deps = next;
            let model = if element.rest {
                match model {
                    Model::Array { element } => *element,
                    other => {
                        return Err(ModelGenerationError::unsupported(
                            format!("rest element of type `{}`", other.display_name()),
                            location,
                        ));
                    }
                }
            } else if element.optional {
                Model::union(vec![model, Model::undefined()])
            } else {
                model
            };
            out.push(TupleElement { position, model, rest: element.rest });
        }
        Ok((Model::Tuple { elements: out }, deps))
    }

    fn build_from_checker(
        &self,
        node: &TypeNode,
        what: &str,
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        trace!(what, owner = ?scope.owner, "deferring to the checker's resolved type");
        let resolved = self
            .oracle
            .resolved_type(node, scope.owner)
            .ok_or_else(|| ModelGenerationError::UnresolvedType {
                what: what.to_string(),
                location: location.clone(),
            })?;
        self.build_resolved(&resolved, location, scope, deps)
    }

    // ------------------------------ Named types ------------------------------ //

    pub(crate) fn build_reference(
        &self,
        reference: &TypeReference,
        hint: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        let location = pick(&reference.location, hint);
        let declaration = self
            .oracle
            .resolve_declaration(reference, scope.owner)
            .ok_or_else(|| ModelGenerationError::UnresolvedSymbol {
                name: reference.name.clone(),
                location: location.clone(),
            })?;
        self.build_declared(&declaration, reference, location, scope, deps)
    }

    fn build_declared(
        &self,
        declaration: &Declaration,
        reference: &TypeReference,
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        if let Some(kind) = self.well_known(declaration) {
            return self.build_well_known(kind, reference, location, scope, deps);
        }
        match declaration {
            Declaration::Import { target, .. } => {
                // imports resolve in module scope, never against the importer's parameters
                let target = TypeReference {
                    name: target.clone(),
                    arguments: reference.arguments.clone(),
                    location: location.clone(),
                };
                let scope = scope.deeper(self.options.max_depth, location)?;
                let declaration = self.oracle.resolve_declaration(&target, None).ok_or_else(|| {
                    ModelGenerationError::UnresolvedSymbol {
                        name: target.name.clone(),
                        location: location.clone(),
                    }
                })?;
                self.build_declared(&declaration, &target, location, scope, deps)
            }
            Declaration::TypeParameter { name, .. } => {
                if !reference.arguments.is_empty() {
                    return Err(ModelGenerationError::unsupported(
                        format!("type arguments on type parameter `{name}`"),
                        location,
                    ));
                }
                match scope.params.get(name) {
                    Some(binding) => Ok((binding.model.clone(), deps)),
                    None => Err(ModelGenerationError::UnboundTypeParameter {
                        name: name.clone(),
                        location: location.clone(),
                    }),
                }
            }
            Declaration::Enum(decl) => {
                let model = Model::Enum {
                    name: decl.name.clone(),
                    members: decl
                        .members
                        .iter()
                        .map(|m| EnumMember { name: m.name.clone(), value: m.value.clone() })
                        .collect(),
                };
                Ok((Model::reference(decl.name.as_str()), insert_once(deps, &decl.name, model)))
            }
            Declaration::EnumMember { enum_name, member, .. } => {
                let canonical = format!("{enum_name}.{}", member.name);
                let model = Model::Enum {
                    name: canonical.clone(),
                    members: vec![EnumMember {
                        name: member.name.clone(),
                        value: member.value.clone(),
                    }],
                };
                Ok((Model::reference(canonical.as_str()), insert_once(deps, &canonical, model)))
            }
            Declaration::Interface(_) | Declaration::Alias(_) => {
                self.build_named(declaration, reference, location, scope, deps)
            }
            Declaration::Class { name, .. } => Err(ModelGenerationError::ClassReference {
                name: name.clone(),
                location: location.clone(),
            }),
            Declaration::Builtin { name } | Declaration::Opaque { name, .. } => {
                Err(ModelGenerationError::MissingTypeInformation {
                    name: name.clone(),
                    location: location.clone(),
                })
            }
        }
    }

    fn well_known(&self, declaration: &Declaration) -> Option<WellKnown> {
        let is = |name: &str| self.oracle.is_well_known(declaration, name);
        if is("Date") {
            Some(WellKnown::Date)
        } else if is("Array") || is("ReadonlyArray") {
            Some(WellKnown::Array)
        } else if is("Record") {
            Some(WellKnown::Record)
        } else {
            None
        }
    }

    /// Library types map straight onto models instead of being walked as declarations.
    fn build_well_known(
        &self,
        kind: WellKnown,
        reference: &TypeReference,
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        let arguments = self.oracle.type_arguments_of(reference);
        match kind {
            WellKnown::Date => Ok((Model::primitive(PrimitiveKind::Date), deps)),
            WellKnown::Array => match arguments.as_slice() {
                [] => Ok((Model::array(Model::any()), deps)),
                [element] => {
                    let (element, deps) = self.build(element, location, scope, deps)?;
                    Ok((Model::array(element), deps))
                }
                _ => Err(ModelGenerationError::unsupported(
                    "Array with more than one type argument",
                    location,
                )),
            },
            WellKnown::Record => self.build_record(&arguments, location, scope, deps),
        }
    }

    /// Interfaces and aliases: canonical name, circuit breaker, reserve, body, commit.
    fn build_named(
        &self,
        declaration: &Declaration,
        reference: &TypeReference,
        location: &Location,
        scope: Scope<'_>,
        mut deps: DependencyMap,
    ) -> Built {
        let name = declaration.name();
        let params = declaration.type_params();
        let arguments = self.oracle.type_arguments_of(reference);
        if arguments.len() > params.len() {
            return Err(ModelGenerationError::unsupported(
                format!(
                    "{} type arguments for `{name}`, which declares {}",
                    arguments.len(),
                    params.len()
                ),
                location,
            ));
        }

        // a) bind parameters: arguments in the caller's scope, defaults in the declaration's
        let mut bindings = TypeParamMap::new();
        let mut argument_models = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let (model, next) = match (arguments.get(i), &param.default) {
                (Some(argument), _) => self.build(argument, location, scope, deps)?,
                (None, Some(default)) => {
                    let inner = Scope::declaration(name, &bindings, scope.depth);
                    self.build(default, location, inner, deps)?
                }
                (None, None) => {
                    return Err(ModelGenerationError::MissingTypeArgument {
                        name: name.to_string(),
                        parameter: param.name.clone(),
                        location: location.clone(),
                    });
                }
            };
            deps = next;
            bindings.insert(
                param.name.clone(),
                TypeParamBinding { display: model.display_name(), model: model.clone() },
            );
            argument_models.push(model);
        }

        // b) canonical reference
        let canonical = if bindings.is_empty() {
            name.to_string()
        } else {
            let shown = bindings.values().map(|b| b.display.as_str()).collect::<Vec<_>>();
            format!("{name}<{}>", shown.join(", "))
        };
        let reference = Model::Reference {
            name: canonical.clone(),
            arguments: (!argument_models.is_empty()).then_some(argument_models),
        };

        // c) circuit breaker
        if deps.contains(&canonical) {
            trace!(
                name = %canonical,
                reserved = deps.is_reserved(&canonical),
                "already known, not expanding"
            );
            return Ok((reference, deps));
        }

        debug!(name = %canonical, "building named type");
        let deps = deps.reserve(&canonical);
        let body_scope = Scope::declaration(name, &bindings, scope.depth);
        let (model, deps) = match declaration {
            Declaration::Interface(decl) => {
                // d) own members, intersected with every base interface
                let members = self.oracle.members_of(declaration);
                let here = pick(&decl.location, location);
                let (shape, mut deps) = self.build_members(&members, here, body_scope, deps)?;
                if decl.extends.is_empty() {
                    (shape, deps)
                } else {
                    let mut parts = vec![shape];
                    for base in &decl.extends {
                        let (model, next) = self.build_reference(base, here, body_scope, deps)?;
                        deps = next;
                        parts.push(model);
                    }
                    (Model::intersection(parts), deps)
                }
            }
            // e) mapped/conditional bodies are routed to the checker by `build`
            Declaration::Alias(decl) => {
                self.build(&decl.body, pick(&decl.location, location), body_scope, deps)?
            }
            other => {
                return Err(ModelGenerationError::MissingTypeInformation {
                    name: other.name().to_string(),
                    location: location.clone(),
                });
            }
        };
        Ok((reference, deps.commit(&canonical, model)))
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn keyword_model(keyword: Keyword, location: &Location) -> Result<Model, ModelGenerationError> {
    let kind = match keyword {
        Keyword::String => PrimitiveKind::String,
        Keyword::Number => PrimitiveKind::Number,
        Keyword::Boolean => PrimitiveKind::Boolean,
        Keyword::Bigint => PrimitiveKind::Bigint,
        Keyword::Null => PrimitiveKind::Null,
        Keyword::Undefined | Keyword::Void => PrimitiveKind::Undefined,
        Keyword::Any | Keyword::Unknown => PrimitiveKind::Any,
        Keyword::Never => return Err(ModelGenerationError::unsupported("the never type", location)),
        Keyword::Object => {
            return Err(ModelGenerationError::unsupported("the object keyword", location));
        }
        Keyword::Symbol => return Err(ModelGenerationError::unsupported("symbol types", location)),
    };
    Ok(Model::primitive(kind))
}

/// Enums have no cycles: build once, no reservation needed.
fn insert_once(deps: DependencyMap, name: &str, model: Model) -> DependencyMap {
    if deps.contains(name) { deps } else { deps.insert(name, model) }
}

/// Prefer a node's own location over the hint from its parent.
fn pick<'a>(own: &'a Location, hint: &'a Location) -> &'a Location {
    if *own == Location::default() { hint } else { own }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::LiteralValue;
    use crate::oracle::{
        AliasDecl, EnumDecl, EnumMemberDecl, InterfaceDecl, MemberSignature, ModuleOracle,
        TypeModule, TypeParamDecl,
    };
    use pretty_assertions::assert_eq;

    fn oracle(declarations: Vec<Declaration>) -> ModuleOracle {
        ModuleOracle::new(TypeModule {
            file: "test.ts".into(),
            declarations,
            imports: Default::default(),
        })
    }

    fn alias(name: &str, params: &[&str], body: TypeNode) -> Declaration {
        Declaration::Alias(AliasDecl {
            name: name.into(),
            type_params: params
                .iter()
                .map(|p| TypeParamDecl { name: p.to_string(), default: None })
                .collect(),
            body,
            location: Location::new("test.ts", 1, 1),
        })
    }

    fn interface(name: &str, extends: &[&str], members: Vec<MemberSignature>) -> Declaration {
        Declaration::Interface(InterfaceDecl {
            name: name.into(),
            type_params: vec![],
            extends: extends
                .iter()
                .map(|e| TypeReference {
                    name: e.to_string(),
                    arguments: vec![],
                    location: Location::default(),
                })
                .collect(),
            members,
            location: Location::new("test.ts", 1, 1),
        })
    }

    /// `Branch<T> = {left?: Node<T>, right?: Node<T>}`, `Node<T> = Branch<T> | Leaf<T>`,
    /// `Leaf<T> = {values: T[]}`
    fn tree_module() -> ModuleOracle {
        let node_t = || TypeNode::reference("Node", vec![TypeNode::named("T")]);
        oracle(vec![
            alias("Branch", &["T"], TypeNode::type_literal(vec![
                MemberSignature::property("left", true, node_t()),
                MemberSignature::property("right", true, node_t()),
            ])),
            alias("Node", &["T"], TypeNode::union(vec![
                TypeNode::reference("Branch", vec![TypeNode::named("T")]),
                TypeNode::reference("Leaf", vec![TypeNode::named("T")]),
            ])),
            alias("Leaf", &["T"], TypeNode::type_literal(vec![
                MemberSignature::property("values", false, TypeNode::array(TypeNode::named("T"))),
            ])),
        ])
    }

    #[test]
    fn recursive_generic_types_terminate() {
        let oracle = tree_module();
        let root = TypeNode::reference("Branch", vec![TypeNode::number()]);
        let built = build_model(&oracle, &root, &Location::default()).unwrap();
        let names: Vec<_> = built.dependencies.keys().cloned().collect();
        assert_eq!(names, vec!["Branch<number>", "Node<number>", "Leaf<number>"]);
        assert_eq!(
            built.root,
            Model::Reference {
                name: "Branch<number>".into(),
                arguments: Some(vec![Model::number()]),
            }
        );
        assert_eq!(
            built.dependencies["Leaf<number>"],
            Model::object(vec![Model::member("values", false, Model::array(Model::number()))])
        );
    }

    #[test]
    fn rebuilding_yields_identical_models() {
        let oracle = tree_module();
        let root = TypeNode::reference("Node", vec![TypeNode::string()]);
        let a = build_model(&oracle, &root, &Location::default()).unwrap();
        let b = build_model(&oracle, &root, &Location::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn interface_inheritance_is_an_intersection() {
        let oracle = oracle(vec![
            interface(
                "Base",
                &[],
                vec![MemberSignature::property("id", false, TypeNode::number())],
            ),
            interface(
                "User",
                &["Base"],
                vec![MemberSignature::property("name", false, TypeNode::string())],
            ),
        ]);
        let built = build_declaration(&oracle, "User").unwrap();
        assert_eq!(
            built.dependencies["User"],
            Model::intersection(vec![
                Model::object(vec![Model::member("name", false, Model::string())]),
                Model::reference("Base"),
            ])
        );
        assert!(built.dependencies.contains_key("Base"));
    }

    #[test]
    fn function_members_are_reported() {
        let oracle = oracle(vec![interface("Api", &[], vec![
            MemberSignature::property(
                "call",
                false,
                TypeNode::Function { location: Location::new("api.ts", 3, 5) },
            ),
        ])]);
        let err = build_declaration(&oracle, "Api").unwrap_err();
        assert_eq!(err.code(), "E-MODEL-001");
        assert_eq!(err.location(), Some(&Location::new("api.ts", 3, 5)));
    }

    #[test]
    fn class_references_fail() {
        let oracle = oracle(vec![Declaration::Class {
            name: "Service".into(),
            location: Location::default(),
        }]);
        let err = build_declaration(&oracle, "Service").unwrap_err();
        assert!(matches!(err, ModelGenerationError::ClassReference { .. }));
    }

    #[test]
    fn unresolved_names_fail_without_panicking() {
        let oracle = oracle(vec![]);
        let err = build_declaration(&oracle, "Missing").unwrap_err();
        assert!(matches!(
            err,
            ModelGenerationError::UnresolvedSymbol { name, .. } if name == "Missing"
        ));
    }

    #[test]
    fn type_parameter_defaults_fill_missing_arguments() {
        let oracle = oracle(vec![Declaration::Alias(AliasDecl {
            name: "Page".into(),
            type_params: vec![
                TypeParamDecl { name: "T".into(), default: None },
                TypeParamDecl {
                    name: "C".into(),
                    default: Some(TypeNode::array(TypeNode::named("T"))),
                },
            ],
            body: TypeNode::type_literal(vec![
                MemberSignature::property("item", false, TypeNode::named("T")),
                MemberSignature::property("cursor", false, TypeNode::named("C")),
            ]),
            location: Location::default(),
        })]);
        let root = TypeNode::reference("Page", vec![TypeNode::string()]);
        let built = build_model(&oracle, &root, &Location::default()).unwrap();
        assert!(built.dependencies.contains_key("Page<string, string[]>"));

        let err = build_declaration(&oracle, "Page").unwrap_err();
        assert!(matches!(
            err,
            ModelGenerationError::MissingTypeArgument { parameter, .. } if parameter == "T"
        ));
    }

    #[test]
    fn enums_and_enum_members_become_references() {
        let oracle = oracle(vec![Declaration::Enum(EnumDecl {
            name: "Color".into(),
            members: vec![
                EnumMemberDecl { name: "Red".into(), value: LiteralValue::String("red".into()) },
                EnumMemberDecl { name: "Blue".into(), value: LiteralValue::String("blue".into()) },
            ],
            location: Location::default(),
        })]);
        let built =
            build_model(&oracle, &TypeNode::named("Color.Blue"), &Location::default()).unwrap();
        assert_eq!(built.root, Model::reference("Color.Blue"));
        assert!(matches!(
            &built.dependencies["Color.Blue"],
            Model::Enum { members, .. } if members.len() == 1
        ));

        let built = build_declaration(&oracle, "Color").unwrap();
        assert!(matches!(
            &built.dependencies["Color"],
            Model::Enum { members, .. } if members.len() == 2
        ));
    }

    #[test]
    fn tuple_rest_takes_the_array_element() {
        let oracle = oracle(vec![]);
        let node = TypeNode::Tuple {
            elements: vec![
                TupleMemberNode::required(TypeNode::string()),
                TupleMemberNode::rest(TypeNode::array(TypeNode::number())),
                TupleMemberNode::required(TypeNode::number()),
            ],
        };
        let built = build_model(&oracle, &node, &Location::default()).unwrap();
        let Model::Tuple { elements } = built.root else { panic!("expected a tuple") };
        assert_eq!(elements[1], TupleElement { position: 1, model: Model::number(), rest: true });
    }

    #[test]
    fn well_known_library_types() {
        let oracle = oracle(vec![]);
        let date = build_model(&oracle, &TypeNode::named("Date"), &Location::default()).unwrap();
        assert_eq!(date.root, Model::primitive(PrimitiveKind::Date));

        let list = TypeNode::reference("Array", vec![TypeNode::string()]);
        let list = build_model(&oracle, &list, &Location::default()).unwrap();
        assert_eq!(list.root, Model::array(Model::string()));

        let record = TypeNode::reference("Record", vec![TypeNode::string(), TypeNode::number()]);
        let record = build_model(&oracle, &record, &Location::default()).unwrap();
        assert_eq!(
            record.root,
            Model::object(vec![Model::index(Model::string(), false, Model::number())])
        );
    }

    #[test]
    fn depth_limit_is_reported() {
        let oracle = oracle(vec![]);
        let mut node = TypeNode::number();
        for _ in 0..10 {
            node = TypeNode::array(node);
        }
        let builder = ModelBuilder::new(&oracle).with_options(BuildOptions { max_depth: 5 });
        let err = builder.build_root(&node, &Location::default()).unwrap_err();
        assert!(matches!(err, ModelGenerationError::DepthLimitExceeded { limit: 5, .. }));
    }

    #[test]
    fn parallel_builds_merge_into_one_document() {
        let oracle = oracle(vec![
            interface(
                "Base",
                &[],
                vec![MemberSignature::property("id", false, TypeNode::number())],
            ),
            interface("A", &["Base"], vec![]),
            interface(
                "B",
                &["Base"],
                vec![MemberSignature::property("tag", false, TypeNode::string())],
            ),
        ]);
        let roots = ["A".to_string(), "B".to_string()];
        let doc = build_models(&oracle, &roots, BuildOptions::default()).unwrap();
        assert_eq!(doc.roots.keys().cloned().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(doc.dependencies.len(), 3);
        assert!(matches!(
            &doc.dependencies["A"],
            Model::Intersection { members }
                if matches!(&members[0], Model::Object { members } if members.is_empty())
        ));
    }
}
