//! Class Hierarchy Analysis call graph construction over JVM program models.
//!
//! A [`driver::construct`] run starts from a set of entry points, scans each
//! reachable method body for call sites and expands every call site to all
//! methods the class hierarchy allows it to dispatch to.

pub mod call_graph;
pub mod driver;
pub mod entry;
pub mod hierarchy;
pub mod ir;
pub mod load;
pub mod model;
pub mod report;
pub mod resolver;
pub mod scanner;

pub use call_graph::CallGraph;
pub use driver::{build_call_graph, construct, Budget, CallKinds, Construction, Stats};
pub use hierarchy::{ClassHierarchy, TypeHierarchy};
pub use ir::{CallKind, ClassId, MethodSignature, SubSignature};
pub use model::{Program, ProgramModel};
