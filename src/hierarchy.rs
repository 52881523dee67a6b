use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::ir::ClassId;
use crate::model::Program;

/// Subtype relationships between known classes and interfaces.
pub trait TypeHierarchy {
    fn contains(&self, class: &ClassId) -> bool;
    fn is_interface(&self, class: &ClassId) -> bool;
    /// Transitive subclasses, excluding the class itself.
    fn subclasses_of(&self, class: &ClassId) -> Vec<ClassId>;
    /// Transitive subtypes of an interface: sub-interfaces, implementing
    /// classes and their subclasses.
    fn implementers_of(&self, interface: &ClassId) -> Vec<ClassId>;
}

/// Hierarchy computed from the superclass and interface links of a program.
#[derive(Clone, Debug, Default)]
pub struct ClassHierarchy {
    known: BTreeSet<ClassId>,
    interfaces: BTreeSet<ClassId>,
    subclasses: BTreeMap<ClassId, BTreeSet<ClassId>>,
    implementers: BTreeMap<ClassId, BTreeSet<ClassId>>,
}

impl ClassHierarchy {
    pub fn from_program(program: &Program) -> Self {
        let mut hierarchy = Self::default();
        for class in program.classes() {
            hierarchy.known.insert(class.name.clone());
            if class.is_interface {
                hierarchy.interfaces.insert(class.name.clone());
            }
            if let Some(superclass) = &class.superclass {
                hierarchy
                    .subclasses
                    .entry(superclass.clone())
                    .or_default()
                    .insert(class.name.clone());
            }
            for interface in &class.interfaces {
                hierarchy
                    .implementers
                    .entry(interface.clone())
                    .or_default()
                    .insert(class.name.clone());
            }
        }
        hierarchy
    }

    /// Breadth-first closure over direct links, guarded against cycles.
    fn closure<'h>(
        &'h self,
        root: &ClassId,
        step: impl Fn(&ClassId) -> Vec<&'h BTreeSet<ClassId>>,
    ) -> Vec<ClassId> {
        let mut seen = BTreeSet::new();
        seen.insert(root.clone());
        let mut queue = VecDeque::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            for children in step(&current) {
                for child in children {
                    if seen.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
        }
        seen.remove(root);
        seen.into_iter().collect()
    }
}

impl TypeHierarchy for ClassHierarchy {
    fn contains(&self, class: &ClassId) -> bool {
        self.known.contains(class)
    }

    fn is_interface(&self, class: &ClassId) -> bool {
        self.interfaces.contains(class)
    }

    fn subclasses_of(&self, class: &ClassId) -> Vec<ClassId> {
        self.closure(class, |current| self.subclasses.get(current).into_iter().collect())
    }

    fn implementers_of(&self, interface: &ClassId) -> Vec<ClassId> {
        self.closure(interface, |current| {
            self.implementers
                .get(current)
                .into_iter()
                .chain(self.subclasses.get(current))
                .collect()
        })
    }
}
