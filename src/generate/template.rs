//! Template literals compile to one anchored regex: literal text escaped,
//! interpolations replaced by a fragment per kind.
use indexmap::IndexMap;
use regex::Regex;

use crate::error::GenerationError;
use crate::ir::{LiteralValue, Model, PrimitiveKind};
use crate::runtime::TemplateParser;

pub fn compile(
    parts: &[Model],
    dependencies: &IndexMap<String, Model>,
) -> Result<TemplateParser, GenerationError> {
    let mut pattern = String::from("^");
    for part in parts {
        match part {
            Model::Literal { value: LiteralValue::String(text) } => {
                pattern.push_str(&regex::escape(text))
            }
            other => pattern.push_str(&fragment(other, dependencies, &mut Vec::new())?),
        }
    }
    pattern.push('$');
    let display = Model::TemplateLiteral { parts: parts.to_vec() }.display_name();
    match Regex::new(&pattern) {
        Ok(pattern) => Ok(TemplateParser { pattern, display }),
        Err(err) => {
            Err(GenerationError::InvalidTemplatePattern { pattern, message: err.to_string() })
        }
    }
}

fn fragment<'m>(
    model: &'m Model,
    dependencies: &'m IndexMap<String, Model>,
    following: &mut Vec<&'m str>,
) -> Result<String, GenerationError> {
    let unsupported =
        |kind: &str| Err(GenerationError::UnsupportedTemplateFragment { kind: kind.to_string() });
    match model {
        Model::Primitive { kind } => match kind {
            PrimitiveKind::Any | PrimitiveKind::String => Ok(".+".into()),
            PrimitiveKind::Number | PrimitiveKind::Bigint => Ok(r"\d+".into()),
            PrimitiveKind::Boolean => Ok("(true|false)".into()),
            PrimitiveKind::Null => Ok("null".into()),
            PrimitiveKind::Undefined => Ok("undefined".into()),
            PrimitiveKind::Date => unsupported("Date"),
        },
        Model::Literal { value } => Ok(regex::escape(&value.text())),
        Model::Enum { members, .. } => {
            let alternatives: Vec<String> =
                members.iter().map(|m| regex::escape(&m.value.text())).collect();
            Ok(format!("({})", alternatives.join("|")))
        }
        Model::Union { members } => {
            let mut alternatives = Vec::with_capacity(members.len());
            for m in members {
                alternatives.push(fragment(m, dependencies, following)?);
            }
            Ok(format!("({})", alternatives.join("|")))
        }
        Model::Reference { name, .. } => {
            if following.contains(&name.as_str()) {
                return unsupported(&format!("recursive reference `{name}`"));
            }
            let Some(target) = dependencies.get(name) else {
                return Err(GenerationError::MissingDependency { name: name.clone() });
            };
            following.push(name);
            let out = fragment(target, dependencies, following);
            following.pop();
            out
        }
        Model::Object { .. } => unsupported("an object type"),
        Model::Array { .. } => unsupported("an array type"),
        Model::Tuple { .. } => unsupported("a tuple type"),
        Model::Intersection { .. } => unsupported("an intersection type"),
        Model::TemplateLiteral { .. } => unsupported("a nested template literal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EnumMember;
    use pretty_assertions::assert_eq;

    fn pattern(parts: Vec<Model>, deps: &IndexMap<String, Model>) -> String {
        compile(&parts, deps).unwrap().pattern.as_str().to_string()
    }

    #[test]
    fn text_is_escaped_and_interpolations_become_fragments() {
        let deps = IndexMap::new();
        let parts = vec![
            Model::string_literal("v1.("),
            Model::number(),
            Model::string_literal("/"),
            Model::string(),
        ];
        let p = pattern(parts, &deps);
        assert_eq!(p, r"^v1\.\(\d+/.+$");
    }

    #[test]
    fn unions_and_enums_are_alternations() {
        let mut deps = IndexMap::new();
        deps.insert(
            "Side".to_string(),
            Model::Enum {
                name: "Side".into(),
                members: vec![
                    EnumMember { name: "Left".into(), value: LiteralValue::String("l".into()) },
                    EnumMember { name: "Right".into(), value: LiteralValue::String("r".into()) },
                ],
            },
        );
        let parts = vec![
            Model::union(vec![Model::string_literal("a"), Model::boolean()]),
            Model::string_literal("_"),
            Model::reference("Side"),
        ];
        let t = compile(&parts, &deps).unwrap();
        assert_eq!(t.pattern.as_str(), "^(a|(true|false))_(l|r)$");
        assert!(t.pattern.is_match("true_r"));
        assert!(!t.pattern.is_match("b_l"));
        assert_eq!(t.display, "`${\"a\" | boolean}_${Side}`");
    }

    #[test]
    fn structured_fragments_are_rejected() {
        let deps = IndexMap::new();
        let parts = [
            Model::object(vec![]),
            Model::array(Model::string()),
            Model::primitive(PrimitiveKind::Date),
        ];
        for part in parts {
            let err = compile(&[part], &deps).unwrap_err();
            assert!(matches!(err, GenerationError::UnsupportedTemplateFragment { .. }));
        }
    }

    #[test]
    fn dangling_and_cyclic_references_fail() {
        let mut deps = IndexMap::new();
        assert_eq!(
            compile(&[Model::reference("Id")], &deps).unwrap_err(),
            GenerationError::MissingDependency { name: "Id".into() }
        );
        deps.insert("Loop".to_string(), Model::reference("Loop"));
        assert!(matches!(
            compile(&[Model::reference("Loop")], &deps).unwrap_err(),
            GenerationError::UnsupportedTemplateFragment { .. }
        ));
    }
}
