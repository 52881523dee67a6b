use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use jdescriptor::{MethodDescriptor, TypeDescriptor};
use serde::{Deserialize, Serialize};

/// Class or interface identity in JVM internal form (`com/example/App`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method signature without its declaring class, used to match overrides.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SubSignature {
    pub name: String,
    pub descriptor: String,
}

impl SubSignature {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Parameter and return types decoded from the descriptor.
    pub fn method_descriptor(&self) -> Result<MethodDescriptor> {
        parse_descriptor(&self.descriptor)
    }
}

impl fmt::Display for SubSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor)
    }
}

/// Unique method identity: declaring class plus sub-signature.
///
/// Rendered as `com/example/App.run(I)V`, the same shape used for logical
/// locations in reports.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodSignature {
    pub class: ClassId,
    pub sub: SubSignature,
}

impl MethodSignature {
    pub fn new(class: ClassId, sub: SubSignature) -> Self {
        Self { class, sub }
    }

    /// Same sub-signature declared on another class.
    pub fn rebase(&self, class: &ClassId) -> Self {
        Self {
            class: class.clone(),
            sub: self.sub.clone(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.sub)
    }
}

impl FromStr for MethodSignature {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let open = text
            .find('(')
            .with_context(|| format!("missing descriptor in method signature `{text}`"))?;
        let (qualified, descriptor) = text.split_at(open);
        let (class, name) = qualified
            .rsplit_once('.')
            .with_context(|| format!("missing declaring class in method signature `{text}`"))?;
        if class.is_empty() || name.is_empty() {
            anyhow::bail!("empty class or method name in method signature `{text}`");
        }
        parse_descriptor(descriptor)
            .with_context(|| format!("invalid method signature `{text}`"))?;
        Ok(Self::new(
            ClassId::new(class),
            SubSignature::new(name, descriptor),
        ))
    }
}

impl TryFrom<String> for MethodSignature {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MethodSignature> for String {
    fn from(value: MethodSignature) -> Self {
        value.to_string()
    }
}

/// Parse a JVM method descriptor, rejecting trailing text and `void` parameters.
pub(crate) fn parse_descriptor(text: &str) -> Result<MethodDescriptor> {
    let descriptor: MethodDescriptor = text
        .parse()
        .with_context(|| format!("malformed method descriptor `{text}`"))?;
    if descriptor.to_string() != text {
        anyhow::bail!("trailing characters in method descriptor `{text}`");
    }
    if descriptor.parameter_types().contains(&TypeDescriptor::Void) {
        anyhow::bail!("void parameter in method descriptor `{text}`");
    }
    Ok(descriptor)
}

/// One statement of a method body, reduced to what call-site scanning needs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Statement {
    Invoke(InvokeExpr),
    Assign { local: String, value: Expr },
    Other,
}

impl Statement {
    /// Invocation carried by a bare call or by the right-hand side of an assignment.
    pub fn invocation(&self) -> Option<&InvokeExpr> {
        match self {
            Statement::Invoke(invoke)
            | Statement::Assign {
                value: Expr::Invoke(invoke),
                ..
            } => Some(invoke),
            Statement::Assign { .. } | Statement::Other => None,
        }
    }
}

/// Right-hand side of an assignment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    Invoke(InvokeExpr),
    Other,
}

/// Invocation expression with its statically-declared target.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InvokeExpr {
    pub target: MethodSignature,
    #[serde(default)]
    pub kind: CallKind,
}

/// Call opcode classification. CHA resolves every kind the same way; the kind
/// only travels to the reports.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    #[default]
    Virtual,
    Interface,
    Special,
    Static,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
            CallKind::Special => "special",
            CallKind::Static => "static",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
