use crate::ir::{InvokeExpr, MethodSignature};
use crate::model::ProgramModel;

/// Invocations found in the body of `method`, with their statically-declared
/// targets.
///
/// Duplicate targets are kept; the driver deduplicates edges. A method missing
/// from the model yields no calls and a warning, a method without a body
/// yields no calls silently.
pub fn call_sites(model: &dyn ProgramModel, method: &MethodSignature) -> Vec<InvokeExpr> {
    if !model.method_exists(method) {
        tracing::warn!(
            target: "chagraph",
            method = %method,
            "method not found in the program model; treating it as calling nothing"
        );
        return Vec::new();
    }
    let Some(body) = model.method_body(method) else {
        return Vec::new();
    };

    body.iter()
        .filter_map(|statement| statement.invocation())
        .cloned()
        .collect()
}
