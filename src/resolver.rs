use std::collections::BTreeSet;

use crate::hierarchy::TypeHierarchy;
use crate::ir::MethodSignature;
use crate::model::ProgramModel;

/// Class Hierarchy Analysis dispatch: maps a declared call target to every
/// method that may run for it.
pub struct Resolver<'a> {
    model: &'a dyn ProgramModel,
    hierarchy: &'a dyn TypeHierarchy,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a dyn ProgramModel, hierarchy: &'a dyn TypeHierarchy) -> Self {
        Self { model, hierarchy }
    }

    /// Candidate targets of a call site. The resolved base target always comes
    /// first; an unresolvable site yields no candidates.
    pub fn resolve(&self, declared: &MethodSignature) -> Vec<MethodSignature> {
        let Some(target) = self.resolve_target(declared) else {
            return Vec::new();
        };

        if !self.hierarchy.contains(&target.class) {
            tracing::warn!(
                target: "chagraph",
                class = %target.class,
                method = %target,
                "declaring class missing from the type hierarchy; call site left unresolved"
            );
            return Vec::new();
        }

        let substitutes = if self.hierarchy.is_interface(&target.class) {
            self.hierarchy.implementers_of(&target.class)
        } else {
            self.hierarchy.subclasses_of(&target.class)
        };

        let mut candidates = vec![target.clone()];
        for class_id in substitutes {
            let Some(class) = self.model.class(&class_id) else {
                tracing::warn!(
                    target: "chagraph",
                    class = %class_id,
                    "subtype missing from the program model; skipped"
                );
                continue;
            };
            if class.is_interface {
                continue;
            }
            if class.method(&target.sub).is_some() {
                candidates.push(target.rebase(&class_id));
            }
        }
        candidates
    }

    /// Signature of the method a call to `declared` binds to: the declared
    /// class's own method, or the nearest superclass declaring the same
    /// sub-signature. Default methods on interfaces are not consulted.
    pub fn resolve_target(&self, declared: &MethodSignature) -> Option<MethodSignature> {
        let Some(class) = self.model.class(&declared.class) else {
            tracing::warn!(
                target: "chagraph",
                method = %declared,
                "declared class missing from the program model; call site left unresolved"
            );
            return None;
        };
        if class.method(&declared.sub).is_some() {
            return Some(declared.clone());
        }

        let mut visited = BTreeSet::from([class.name.clone()]);
        let mut next = class.superclass.clone();
        while let Some(ancestor_id) = next {
            if !visited.insert(ancestor_id.clone()) {
                tracing::warn!(
                    target: "chagraph",
                    class = %ancestor_id,
                    method = %declared,
                    "superclass cycle detected while resolving call target"
                );
                return None;
            }
            let Some(ancestor) = self.model.class(&ancestor_id) else {
                tracing::warn!(
                    target: "chagraph",
                    class = %ancestor_id,
                    method = %declared,
                    "ancestor missing from the program model; call site left unresolved"
                );
                return None;
            };
            if ancestor.method(&declared.sub).is_some() {
                return Some(declared.rebase(&ancestor_id));
            }
            next = ancestor.superclass.clone();
        }

        tracing::warn!(
            target: "chagraph",
            method = %declared,
            "no implementation found in the superclass chain"
        );
        None
    }
}
