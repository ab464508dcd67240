//! Environments threaded through the builder.
//!
//! `DependencyMap` is moved into every builder call and moved back out with
//! the result, so two independent builds can never observe each other's
//! entries. A named type gets its slot reserved before its body is built
//! and committed afterwards; anything that reaches a reserved slot is a
//! recursive reference and stops there.
use indexmap::IndexMap;

use crate::error::ModelGenerationError;
use crate::ir::Model;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Reserved,
    Ready(Model),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyMap {
    slots: IndexMap<String, Slot>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present either as a reservation or a finished model.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Reserved))
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        match self.slots.get(name)? {
            Slot::Ready(model) => Some(model),
            Slot::Reserved => None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn reserve(mut self, name: &str) -> Self {
        self.slots.entry(name.to_string()).or_insert(Slot::Reserved);
        self
    }

    /// Fill a slot. The entry keeps the position it was reserved at.
    #[must_use]
    pub fn commit(mut self, name: &str, model: Model) -> Self {
        self.slots.insert(name.to_string(), Slot::Ready(model));
        self
    }

    /// Reserve and commit in one step, for types that cannot recurse.
    #[must_use]
    pub fn insert(self, name: &str, model: Model) -> Self {
        self.reserve(name).commit(name, model)
    }

    /// Every slot must be committed by the time the root is done.
    pub fn finish(self) -> Result<IndexMap<String, Model>, ModelGenerationError> {
        self.slots
            .into_iter()
            .map(|(name, slot)| match slot {
                Slot::Ready(model) => Ok((name, model)),
                Slot::Reserved => Err(ModelGenerationError::IncompleteDependency { name }),
            })
            .collect()
    }
}

/// A type parameter bound for one generic instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamBinding {
    pub display: String,
    pub model: Model,
}

pub type TypeParamMap = IndexMap<String, TypeParamBinding>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserve_then_commit_keeps_order() {
        let deps = DependencyMap::new()
            .reserve("A")
            .insert("B", Model::string())
            .commit("A", Model::number());
        let done = deps.finish().unwrap();
        assert_eq!(done.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(done["A"], Model::number());
    }

    #[test]
    fn reserved_slot_is_visible_but_not_ready() {
        let deps = DependencyMap::new().reserve("Tree<number>");
        assert!(deps.contains("Tree<number>"));
        assert!(deps.is_reserved("Tree<number>"));
        assert!(deps.get("Tree<number>").is_none());
    }

    #[test]
    fn unfinished_reservation_fails_finish() {
        let err = DependencyMap::new().reserve("X").finish().unwrap_err();
        assert_eq!(err, ModelGenerationError::IncompleteDependency { name: "X".into() });
    }
}
