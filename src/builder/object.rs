//! Object shapes: interface and type-literal members, index signatures, `Record`.
use super::{Built, DependencyMap, ModelBuilder, Scope, pick};
use crate::error::ModelGenerationError;
use crate::ir::{LiteralValue, Model, ObjectEntry, PrimitiveKind, format_number};
use crate::oracle::{Location, MemberSignature, PropertyName, TypeNode, TypeOracle};

impl<'o, O: TypeOracle + ?Sized> ModelBuilder<'o, O> {
    /// Named members in declaration order, then index members.
    pub(super) fn build_members(
        &self,
        members: &[MemberSignature],
        location: &Location,
        scope: Scope<'_>,
        mut deps: DependencyMap,
    ) -> Built {
        let mut named = Vec::new();
        let mut indexed = Vec::new();
        for member in members {
            match member {
                MemberSignature::Property { name, optional, node, location: own } => {
                    let here = pick(own, location);
                    let name = member_name(name, here)?;
                    let model = match node {
                        Some(node) => {
                            let (model, next) = self.build(node, here, scope, deps)?;
                            deps = next;
                            model
                        }
                        None => Model::any(),
                    };
                    named.push(Model::member(name, *optional, model));
                }
                MemberSignature::Index { key, node, optional, location: own } => {
                    let here = pick(own, location);
                    let (key, next) = self.build(key, here, scope, deps)?;
                    let (model, next) = self.build(node, here, scope, next)?;
                    deps = next;
                    for key in index_keys(key, &deps, here)? {
                        indexed.push(Model::index(key, *optional, model.clone()));
                    }
                }
                MemberSignature::Method { location: own, .. } => {
                    let here = pick(own, location);
                    return Err(ModelGenerationError::unsupported("method signatures", here));
                }
                MemberSignature::Call { location: own } => {
                    let here = pick(own, location);
                    return Err(ModelGenerationError::unsupported("call signatures", here));
                }
                MemberSignature::Construct { location: own } => {
                    let here = pick(own, location);
                    return Err(ModelGenerationError::unsupported("construct signatures", here));
                }
            }
        }
        named.extend(indexed);
        Ok((Model::object(named), deps))
    }

    /// `Record<K, V>`: index members for open keys, named members for literal keys.
    pub(super) fn build_record(
        &self,
        arguments: &[TypeNode],
        location: &Location,
        scope: Scope<'_>,
        deps: DependencyMap,
    ) -> Built {
        let [key, value] = arguments else {
            return Err(ModelGenerationError::unsupported(
                format!("Record with {} type arguments", arguments.len()),
                location,
            ));
        };
        let (key, deps) = self.build(key, location, scope, deps)?;
        let (value, deps) = self.build(value, location, scope, deps)?;
        let mut entries = Vec::new();
        record_entries(&key, &value, &deps, location, &mut entries)?;
        Ok((Model::object(entries), deps))
    }
}

fn member_name(name: &PropertyName, location: &Location) -> Result<String, ModelGenerationError> {
    match name {
        PropertyName::Identifier(s) | PropertyName::String(s) => Ok(s.clone()),
        PropertyName::Number(n) => Ok(format_number(*n)),
        PropertyName::Computed(text) => {
            let what = format!("computed member name `{text}`");
            Err(ModelGenerationError::unsupported(what, location))
        }
        PropertyName::Private(text) => {
            let what = format!("private member name `{text}`");
            Err(ModelGenerationError::unsupported(what, location))
        }
        PropertyName::BindingPattern(text) => {
            Err(ModelGenerationError::unsupported(format!("binding pattern `{text}`"), location))
        }
    }
}

/// Index signatures accept string, number and template-literal keys; a union
/// of those yields one index member per alternative. An alias of a key type
/// stays a reference so the generator resolves it.
fn index_keys(
    key: Model,
    deps: &DependencyMap,
    location: &Location,
) -> Result<Vec<Model>, ModelGenerationError> {
    match key {
        Model::Primitive { kind: PrimitiveKind::String | PrimitiveKind::Number }
        | Model::TemplateLiteral { .. } => Ok(vec![key]),
        Model::Union { members } => {
            let mut out = Vec::with_capacity(members.len());
            for m in members {
                out.extend(index_keys(m, deps, location)?);
            }
            Ok(out)
        }
        Model::Reference { ref name, .. } => match alias_target(name, deps) {
            Some(Model::Primitive { kind: PrimitiveKind::String | PrimitiveKind::Number })
            | Some(Model::TemplateLiteral { .. }) => Ok(vec![key]),
            Some(union @ Model::Union { .. }) => index_keys(union.clone(), deps, location),
            Some(other) => Err(ModelGenerationError::unsupported(
                format!("index key `{name}` of type `{}`", other.display_name()),
                location,
            )),
            None => Err(ModelGenerationError::unsupported(
                format!("index key `{name}` that is still being defined"),
                location,
            )),
        },
        other => Err(ModelGenerationError::unsupported(
            format!("index key of type `{}`", other.display_name()),
            location,
        )),
    }
}

/// Follow `type A = B; type B = string` chains to the first non-reference.
fn alias_target<'d>(name: &str, deps: &'d DependencyMap) -> Option<&'d Model> {
    let mut target = deps.get(name)?;
    for _ in 0..deps.len() {
        match target {
            Model::Reference { name, .. } => target = deps.get(name)?,
            _ => return Some(target),
        }
    }
    None
}

fn record_entries(
    key: &Model,
    value: &Model,
    deps: &DependencyMap,
    location: &Location,
    out: &mut Vec<ObjectEntry>,
) -> Result<(), ModelGenerationError> {
    match key {
        Model::Primitive { kind: PrimitiveKind::String | PrimitiveKind::Number }
        | Model::TemplateLiteral { .. } => {
            out.push(Model::index(key.clone(), false, value.clone()));
        }
        Model::Literal { value: literal @ (LiteralValue::String(_) | LiteralValue::Number(_)) } => {
            out.push(Model::member(literal.text(), false, value.clone()));
        }
        Model::Union { members } => {
            for m in members {
                record_entries(m, value, deps, location, out)?;
            }
        }
        Model::Enum { members, .. } => {
            for m in members {
                out.push(Model::member(m.value.text(), false, value.clone()));
            }
        }
        Model::Reference { name, .. } => match deps.get(name) {
            Some(resolved) => record_entries(resolved, value, deps, location, out)?,
            None => {
                return Err(ModelGenerationError::unsupported(
                    format!("Record key `{name}` that is still being defined"),
                    location,
                ));
            }
        },
        other => {
            return Err(ModelGenerationError::unsupported(
                format!("Record key of type `{}`", other.display_name()),
                location,
            ));
        }
    }
    Ok(())
}
