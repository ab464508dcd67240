//! Models from the checker's evaluated types (mapped, conditional, `keyof`,
//! indexed access). Named types inside still go through the circuit breaker.
use super::{Built, DependencyMap, ModelBuilder, Scope};
use crate::error::ModelGenerationError;
use crate::ir::{Model, TupleElement};
use crate::oracle::{Location, ResolvedType, TypeOracle};

impl<'o, O: TypeOracle + ?Sized> ModelBuilder<'o, O> {
    pub(super) fn build_resolved(
        &self,
        resolved: &ResolvedType,
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        let scope = scope.deeper(self.options.max_depth, location)?;
        match resolved {
            ResolvedType::Primitive { primitive } => Ok((Model::primitive(*primitive), deps)),
            ResolvedType::Literal { value } => Ok((Model::literal(value.clone()), deps)),
            ResolvedType::Object { properties, string_index, number_index } => {
                let mut deps = deps;
                let mut members = Vec::with_capacity(properties.len() + 2);
                for property in properties {
                    let (model, next) =
                        self.build_resolved(&property.resolved, location, scope, deps)?;
                    deps = next;
                    members.push(Model::member(property.name.as_str(), property.optional, model));
                }
                let indexes = [(Model::string(), string_index), (Model::number(), number_index)];
                for (key, index) in indexes {
                    if let Some(index) = index {
                        let (model, next) = self.build_resolved(index, location, scope, deps)?;
                        deps = next;
                        members.push(Model::index(key, false, model));
                    }
                }
                Ok((Model::object(members), deps))
            }
            ResolvedType::Array { element } => {
                let (element, deps) = self.build_resolved(element, location, scope, deps)?;
                Ok((Model::array(element), deps))
            }
            ResolvedType::Tuple { elements } => {
                let mut deps = deps;
                let mut out = Vec::with_capacity(elements.len());
                for (position, element) in elements.iter().enumerate() {
                    let (model, next) =
                        self.build_resolved(&element.resolved, location, scope, deps)?;
                    deps = next;
                    out.push(TupleElement { position, model, rest: element.rest });
                }
                Ok((Model::Tuple { elements: out }, deps))
            }
            ResolvedType::Union { members } => {
                let (members, deps) = self.build_resolved_all(members, location, scope, deps)?;
                Ok((Model::union(members), deps))
            }
            ResolvedType::Intersection { members } => {
                let (members, deps) = self.build_resolved_all(members, location, scope, deps)?;
                Ok((Model::intersection(members), deps))
            }
            ResolvedType::Named(reference) => {
                self.build_reference(reference, location, scope, deps)
            }
            ResolvedType::TypeParameter { name } => match scope.params.get(name) {
                Some(binding) => Ok((binding.model.clone(), deps)),
                None => Err(ModelGenerationError::UnboundTypeParameter {
                    name: name.clone(),
                    location: location.clone(),
                }),
            },
        }
    }

    fn build_resolved_all(
        &self,
        members: &[ResolvedType],
        location: &Location,
        scope: Scope<'_>,
        mut deps: DependencyMap,
    ) -> Built<Vec<Model>> {
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let (model, next) = self.build_resolved(member, location, scope, deps)?;
            deps = next;
            out.push(model);
        }
        Ok((out, deps))
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{build_declaration, build_model};
    use crate::ir::{LiteralValue, Model, PrimitiveKind};
    use crate::oracle::{
        AliasDecl, Declaration, InterfaceDecl, Location, MappedNode, MemberSignature, ModuleOracle,
        ResolvedProperty, ResolvedType, TypeModule, TypeNode, TypeOperator, TypeParamDecl,
    };
    use pretty_assertions::assert_eq;

    fn point() -> Declaration {
        Declaration::Interface(InterfaceDecl {
            name: "Point".into(),
            type_params: vec![],
            extends: vec![],
            members: vec![
                MemberSignature::property("x", false, TypeNode::number()),
                MemberSignature::property("y", false, TypeNode::number()),
            ],
            location: Location::default(),
        })
    }

    #[test]
    fn mapped_alias_uses_the_checker_evaluation() {
        let partial = Declaration::Alias(AliasDecl {
            name: "PartialPoint".into(),
            type_params: vec![],
            body: TypeNode::Mapped(MappedNode {
                parameter: "K".into(),
                constraint: Box::new(TypeNode::TypeOperator {
                    operator: TypeOperator::Keyof,
                    operand: Box::new(TypeNode::named("Point")),
                }),
                template: None,
                optional: Some(true),
                resolved: Some(ResolvedType::Object {
                    properties: vec![ResolvedProperty {
                        name: "x".into(),
                        optional: true,
                        resolved: ResolvedType::Primitive { primitive: PrimitiveKind::Number },
                    }],
                    string_index: None,
                    number_index: None,
                }),
                location: Location::default(),
            }),
            location: Location::default(),
        });
        let oracle = ModuleOracle::new(TypeModule {
            declarations: vec![point(), partial],
            ..Default::default()
        });
        let built = build_declaration(&oracle, "PartialPoint").unwrap();
        assert_eq!(
            built.dependencies["PartialPoint"],
            Model::object(vec![Model::member("x", true, Model::number())])
        );
    }

    #[test]
    fn unevaluated_mapped_type_is_reported() {
        let node = TypeNode::Mapped(MappedNode {
            parameter: "K".into(),
            constraint: Box::new(TypeNode::string()),
            template: None,
            optional: None,
            resolved: None,
            location: Location::new("m.ts", 2, 3),
        });
        let oracle = ModuleOracle::new(TypeModule::default());
        let err = build_model(&oracle, &node, &Location::default()).unwrap_err();
        assert_eq!(err.code(), "E-MODEL-007");
        assert_eq!(err.location(), Some(&Location::new("m.ts", 2, 3)));
    }

    #[test]
    fn keyof_becomes_a_union_of_literals() {
        let oracle =
            ModuleOracle::new(TypeModule { declarations: vec![point()], ..Default::default() });
        let node = TypeNode::TypeOperator {
            operator: TypeOperator::Keyof,
            operand: Box::new(TypeNode::named("Point")),
        };
        let built = build_model(&oracle, &node, &Location::default()).unwrap();
        assert_eq!(
            built.root,
            Model::union(vec![
                Model::literal(LiteralValue::String("x".into())),
                Model::literal(LiteralValue::String("y".into())),
            ])
        );
    }

    #[test]
    fn resolved_type_parameters_use_the_bindings() {
        let unwrap = Declaration::Alias(AliasDecl {
            name: "Unwrap".into(),
            type_params: vec![TypeParamDecl { name: "T".into(), default: None }],
            body: TypeNode::Mapped(MappedNode {
                parameter: "K".into(),
                constraint: Box::new(TypeNode::string()),
                template: None,
                optional: None,
                resolved: Some(ResolvedType::Array {
                    element: Box::new(ResolvedType::TypeParameter { name: "T".into() }),
                }),
                location: Location::default(),
            }),
            location: Location::default(),
        });
        let oracle =
            ModuleOracle::new(TypeModule { declarations: vec![unwrap], ..Default::default() });
        let root = TypeNode::reference("Unwrap", vec![TypeNode::boolean()]);
        let built = build_model(&oracle, &root, &Location::default()).unwrap();
        assert_eq!(built.dependencies["Unwrap<boolean>"], Model::array(Model::boolean()));
    }
}
