use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ir::{ClassId, MethodSignature, Statement, SubSignature};

/// Query interface over the loaded program.
pub trait ProgramModel {
    fn class(&self, id: &ClassId) -> Option<&Class>;

    fn class_exists(&self, id: &ClassId) -> bool {
        self.class(id).is_some()
    }

    fn method(&self, sig: &MethodSignature) -> Option<&Method> {
        self.class(&sig.class)?.method(&sig.sub)
    }

    fn method_exists(&self, sig: &MethodSignature) -> bool {
        self.method(sig).is_some()
    }

    /// Statements of the method, or `None` when it is missing or has no body.
    fn method_body(&self, sig: &MethodSignature) -> Option<&[Statement]> {
        self.method(sig)?.body.as_deref()
    }
}

/// Class or interface declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Class {
    pub name: ClassId,
    #[serde(default)]
    pub superclass: Option<ClassId>,
    #[serde(default)]
    pub interfaces: Vec<ClassId>,
    #[serde(default, rename = "interface")]
    pub is_interface: bool,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl Class {
    /// Directly declared method with the given sub-signature.
    pub fn method(&self, sub: &SubSignature) -> Option<&Method> {
        self.methods.iter().find(|method| &method.sub == sub)
    }
}

/// Method declaration. A missing body marks an abstract or native method.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Method {
    #[serde(flatten)]
    pub sub: SubSignature,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub body: Option<Vec<Statement>>,
}

/// Where a class declaration came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassOrigin {
    Application,
    Library,
}

/// In-memory program model keyed by class identity.
#[derive(Clone, Debug, Default)]
pub struct Program {
    classes: BTreeMap<ClassId, Class>,
    application: BTreeSet<ClassId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add declarations; the first declaration of a class shadows later ones.
    pub fn add_classes(&mut self, classes: impl IntoIterator<Item = Class>, origin: ClassOrigin) {
        for class in classes {
            if self.classes.contains_key(&class.name) {
                tracing::warn!(
                    target: "chagraph",
                    class = %class.name,
                    "duplicate class declaration ignored; first declaration wins"
                );
                continue;
            }
            if origin == ClassOrigin::Application {
                self.application.insert(class.name.clone());
            }
            self.classes.insert(class.name.clone(), class);
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn application_classes(&self) -> impl Iterator<Item = &Class> {
        self.application
            .iter()
            .filter_map(|id| self.classes.get(id))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl ProgramModel for Program {
    fn class(&self, id: &ClassId) -> Option<&Class> {
        self.classes.get(id)
    }
}
