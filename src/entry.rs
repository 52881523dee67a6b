use jdescriptor::TypeDescriptor;

use crate::ir::{MethodSignature, SubSignature};
use crate::model::Program;

/// Supplier of the methods the call graph is rooted at.
pub trait EntryPoints {
    fn entry_points(&self, program: &Program) -> Vec<MethodSignature>;
}

/// Entry points named explicitly by the caller.
#[derive(Clone, Debug, Default)]
pub struct ExplicitEntryPoints(pub Vec<MethodSignature>);

impl EntryPoints for ExplicitEntryPoints {
    fn entry_points(&self, _program: &Program) -> Vec<MethodSignature> {
        self.0.clone()
    }
}

/// Every `public static void main(String[])` declared by an application class.
#[derive(Clone, Copy, Debug, Default)]
pub struct MainMethods;

impl EntryPoints for MainMethods {
    fn entry_points(&self, program: &Program) -> Vec<MethodSignature> {
        let mut entries: Vec<MethodSignature> = program
            .application_classes()
            .filter(|class| !class.is_interface)
            .flat_map(|class| {
                class
                    .methods
                    .iter()
                    .filter(|method| method.is_static && is_main(&method.sub))
                    .map(move |method| MethodSignature::new(class.name.clone(), method.sub.clone()))
            })
            .collect();
        entries.sort();
        entries
    }
}

fn is_main(sub: &SubSignature) -> bool {
    if sub.name != "main" {
        return false;
    }
    let Ok(descriptor) = sub.method_descriptor() else {
        return false;
    };
    let string_array = TypeDescriptor::Array(
        Box::new(TypeDescriptor::Object("java/lang/String".to_string())),
        1,
    );
    descriptor.parameter_types() == &vec![string_array]
        && descriptor.return_type() == &TypeDescriptor::Void
}
