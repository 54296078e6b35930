//! Declaration tree consumed by the checker.
//!
//! This is the input contract: an external parser produces these shapes (or a
//! caller deserializes them from JSON). Nothing here is mutated by resolution.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::span::{Span, Spanned};

/// Shared handle to an immutable type expression.
pub type TypeRef = Arc<TypeExpr>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// A class, interface or primitive name with its type arguments.
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
    },
    /// A reference to a type parameter in scope.
    Param { name: String },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>, args: Vec<TypeRef>) -> TypeRef {
        Arc::new(TypeExpr::Named { name: name.into(), args })
    }

    /// A named type without type arguments.
    pub fn simple(name: impl Into<String>) -> TypeRef {
        Self::named(name, Vec::new())
    }

    pub fn param(name: impl Into<String>) -> TypeRef {
        Arc::new(TypeExpr::Param { name: name.into() })
    }

    pub fn name(&self) -> &str {
        match self {
            TypeExpr::Named { name, .. } | TypeExpr::Param { name } => name,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeExpr::Named { args, .. } => args,
            TypeExpr::Param { .. } => &[],
        }
    }

    /// Nesting depth; a bare name has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.args().iter().map(|a| a.depth()).max().unwrap_or(0)
    }

    /// True if any `Param` occurs in this expression.
    pub fn mentions_param(&self) -> bool {
        match self {
            TypeExpr::Param { .. } => true,
            TypeExpr::Named { args, .. } => args.iter().any(|a| a.mentions_param()),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Param { name } => write!(f, "{name}"),
            TypeExpr::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 { write!(f, ", ")?; }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: Spanned<String>,
    #[serde(default)]
    pub bound: Option<TypeRef>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>, bound: Option<TypeRef>) -> Self {
        Self { name: Spanned::dummy(name.into()), bound }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => write!(f, "field"),
            MemberKind::Method => write!(f, "method"),
            MemberKind::Constructor => write!(f, "constructor"),
        }
    }
}

/// Name and types of a field, method or constructor.
///
/// Fields have no parameters and carry their type in `ret`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberSignature {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    #[serde(default)]
    pub is_abstract: bool,
}

impl MemberSignature {
    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            type_params: Vec::new(),
            params: Vec::new(),
            ret: ty,
            is_abstract: false,
        }
    }

    pub fn method(name: impl Into<String>, params: Vec<TypeRef>, ret: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            type_params: Vec::new(),
            params,
            ret,
            is_abstract: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.type_params.is_empty() {
            write!(f, "<")?;
            for (i, tp) in self.type_params.iter().enumerate() {
                if i > 0 { write!(f, ", ")?; }
                write!(f, "{}", tp.name.node)?;
                if let Some(b) = &tp.bound {
                    write!(f, " extends {b}")?;
                }
            }
            write!(f, "> ")?;
        }
        match self.kind {
            MemberKind::Field => write!(f, "{}: {}", self.name, self.ret),
            MemberKind::Method | MemberKind::Constructor => {
                write!(f, "{}(", self.name)?;
                for (i, p) in self.params.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{p}")?;
                }
                write!(f, "): {}", self.ret)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDecl {
    #[serde(flatten)]
    pub sig: MemberSignature,
    #[serde(default)]
    pub declared_override: bool,
    #[serde(default)]
    pub span: Span,
}

impl MemberDecl {
    pub fn new(sig: MemberSignature) -> Self {
        Self { sig, declared_override: false, span: Span::dummy() }
    }

    pub fn overriding(sig: MemberSignature) -> Self {
        Self { sig, declared_override: true, span: Span::dummy() }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    #[default]
    Class,
    Interface,
}

/// A parsed class or interface declaration.
///
/// For interfaces, `interfaces` lists the extended interfaces and `supertype`
/// is always `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    #[serde(default)]
    pub kind: DeclKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub type_params: Vec<TypeParam>,
    #[serde(default)]
    pub supertype: Option<Spanned<TypeRef>>,
    #[serde(default)]
    pub interfaces: Vec<Spanned<TypeRef>>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub span: Span,
}

impl ClassDecl {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: Spanned::dummy(name.into()),
            kind: DeclKind::Class,
            is_abstract: false,
            type_params: Vec::new(),
            supertype: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            span: Span::dummy(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self { kind: DeclKind::Interface, ..Self::class(name) }
    }

    pub fn with_type_params(mut self, params: Vec<TypeParam>) -> Self {
        self.type_params = params;
        self
    }

    pub fn extends(mut self, supertype: TypeRef) -> Self {
        self.supertype = Some(Spanned::dummy(supertype));
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(Spanned::dummy(interface));
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name.node
    }

    /// Concrete classes must implement every inherited abstract method.
    pub fn is_concrete(&self) -> bool {
        self.kind == DeclKind::Class && !self.is_abstract
    }

    /// Supertype then interfaces, in declaration order.
    pub fn direct_ancestors(&self) -> impl Iterator<Item = (AncestorRole, &Spanned<TypeRef>)> {
        self.supertype.iter()
            .map(|s| (AncestorRole::Supertype, s))
            .chain(self.interfaces.iter().map(|i| (AncestorRole::Interface, i)))
    }
}

/// Which slot of a declaration an ancestor was named in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorRole {
    Supertype,
    Interface,
}

/// Everything one parse produced: the unit of resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

impl CompilationUnit {
    pub fn new(classes: Vec<ClassDecl>) -> Self {
        Self { package: None, classes }
    }

    pub fn from_json(json: &str) -> Result<Self, crate::diagnostics::CheckError> {
        serde_json::from_str(json)
            .map_err(|e| crate::diagnostics::CheckError::input(format!("invalid compilation unit: {e}")))
    }
}
