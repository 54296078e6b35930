use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

/// Hard failures. Every variant except `Config` and `Input` aborts the
/// resolution of a single class; sibling classes are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("Type parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String, span: Span },

    #[error("Unknown type parameter '{name}'")]
    UnknownParameter { name: String, span: Span },

    #[error("Cannot resolve name '{name}'")]
    UnresolvedName { name: String, span: Span },

    #[error("Cannot resolve supertype '{name}'")]
    UnresolvedSupertype { name: String, span: Span },

    #[error("Cannot resolve interface '{name}'")]
    UnresolvedInterface { name: String, span: Span },

    #[error("Type expression nests deeper than {limit} levels")]
    CyclicType { limit: usize, span: Span },

    #[error("Inheritance cycle through '{name}'")]
    CyclicInheritance { name: String, span: Span },

    #[error("'{name}' expects {expected} type argument(s), found {found}")]
    TypeArgumentArity { name: String, expected: usize, found: usize, span: Span },

    #[error("'{name}' is already declared")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("Config error: {msg}")]
    Config { msg: String, path: Option<PathBuf> },

    #[error("Input error: {msg}")]
    Input { msg: String },
}

impl CheckError {
    pub fn duplicate_parameter(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateParameter { name: name.into(), span }
    }

    pub fn unknown_parameter(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownParameter { name: name.into(), span }
    }

    pub fn unresolved_name(name: impl Into<String>, span: Span) -> Self {
        Self::UnresolvedName { name: name.into(), span }
    }

    pub fn unresolved_supertype(name: impl Into<String>, span: Span) -> Self {
        Self::UnresolvedSupertype { name: name.into(), span }
    }

    pub fn unresolved_interface(name: impl Into<String>, span: Span) -> Self {
        Self::UnresolvedInterface { name: name.into(), span }
    }

    pub fn cyclic_type(limit: usize) -> Self {
        Self::CyclicType { limit, span: Span::dummy() }
    }

    pub fn cyclic_inheritance(name: impl Into<String>, span: Span) -> Self {
        Self::CyclicInheritance { name: name.into(), span }
    }

    pub fn type_argument_arity(name: impl Into<String>, expected: usize, found: usize, span: Span) -> Self {
        Self::TypeArgumentArity { name: name.into(), expected, found, span }
    }

    pub fn duplicate_declaration(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateDeclaration { name: name.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input { msg: msg.into() }
    }

    pub fn kind(&self) -> Option<DiagnosticKind> {
        Some(match self {
            Self::DuplicateParameter { .. } => DiagnosticKind::DuplicateParameter,
            Self::UnknownParameter { .. } => DiagnosticKind::UnknownParameter,
            Self::UnresolvedName { .. } => DiagnosticKind::UnresolvedName,
            Self::UnresolvedSupertype { .. } => DiagnosticKind::UnresolvedSupertype,
            Self::UnresolvedInterface { .. } => DiagnosticKind::UnresolvedInterface,
            Self::CyclicType { .. } => DiagnosticKind::CyclicType,
            Self::CyclicInheritance { .. } => DiagnosticKind::CyclicInheritance,
            Self::TypeArgumentArity { .. } => DiagnosticKind::TypeArgumentArity,
            Self::DuplicateDeclaration { .. } => DiagnosticKind::DuplicateDeclaration,
            Self::Config { .. } | Self::Input { .. } => return None,
        })
    }

    pub fn span(&self) -> Span {
        match self {
            Self::DuplicateParameter { span, .. }
            | Self::UnknownParameter { span, .. }
            | Self::UnresolvedName { span, .. }
            | Self::UnresolvedSupertype { span, .. }
            | Self::UnresolvedInterface { span, .. }
            | Self::CyclicType { span, .. }
            | Self::CyclicInheritance { span, .. }
            | Self::TypeArgumentArity { span, .. }
            | Self::DuplicateDeclaration { span, .. } => *span,
            Self::Config { .. } | Self::Input { .. } => Span::dummy(),
        }
    }

    /// Fill in the span if the error was raised without one.
    pub fn at(mut self, site: Span) -> Self {
        match &mut self {
            Self::DuplicateParameter { span, .. }
            | Self::UnknownParameter { span, .. }
            | Self::UnresolvedName { span, .. }
            | Self::UnresolvedSupertype { span, .. }
            | Self::UnresolvedInterface { span, .. }
            | Self::CyclicType { span, .. }
            | Self::CyclicInheritance { span, .. }
            | Self::TypeArgumentArity { span, .. }
            | Self::DuplicateDeclaration { span, .. } => *span = span.or(site),
            Self::Config { .. } | Self::Input { .. } => {}
        }
        self
    }

    /// Record this failure as a diagnostic against `class`.
    pub fn to_diagnostic(&self, class: &str) -> Diagnostic {
        Diagnostic {
            kind: self.kind().unwrap_or(DiagnosticKind::Internal),
            severity: Severity::Error,
            class: class.to_string(),
            member: None,
            message: self.to_string(),
            span: self.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateParameter,
    UnknownParameter,
    UnresolvedName,
    UnresolvedSupertype,
    UnresolvedInterface,
    CyclicType,
    CyclicInheritance,
    TypeArgumentArity,
    DuplicateDeclaration,
    DiamondConflict,
    DuplicateInterface,
    BoundViolation,
    UnimplementedAbstractMember,
    NoMatchingSupertypeMember,
    ArityMismatch,
    TypeMismatch,
    Conforms,
    Internal,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateParameter => "duplicate_parameter",
            DiagnosticKind::UnknownParameter => "unknown_parameter",
            DiagnosticKind::UnresolvedName => "unresolved_name",
            DiagnosticKind::UnresolvedSupertype => "unresolved_supertype",
            DiagnosticKind::UnresolvedInterface => "unresolved_interface",
            DiagnosticKind::CyclicType => "cyclic_type",
            DiagnosticKind::CyclicInheritance => "cyclic_inheritance",
            DiagnosticKind::TypeArgumentArity => "type_argument_arity",
            DiagnosticKind::DuplicateDeclaration => "duplicate_declaration",
            DiagnosticKind::DiamondConflict => "diamond_conflict",
            DiagnosticKind::DuplicateInterface => "duplicate_interface",
            DiagnosticKind::BoundViolation => "bound_violation",
            DiagnosticKind::UnimplementedAbstractMember => "unimplemented_abstract_member",
            DiagnosticKind::NoMatchingSupertypeMember => "no_matching_supertype_member",
            DiagnosticKind::ArityMismatch => "arity_mismatch",
            DiagnosticKind::TypeMismatch => "type_mismatch",
            DiagnosticKind::Conforms => "conforms",
            DiagnosticKind::Internal => "internal",
        }
    }
}

/// One record handed to a [`DiagnosticSink`]. The checker defines the shape;
/// presentation belongs to whoever implements the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, class: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            class: class.to_string(),
            member: None,
            message: message.into(),
            span,
        }
    }

    pub fn warning(kind: DiagnosticKind, class: &str, message: impl Into<String>, span: Span) -> Self {
        Self { severity: Severity::Warning, ..Self::error(kind, class, message, span) }
    }

    pub fn note(kind: DiagnosticKind, class: &str, message: impl Into<String>, span: Span) -> Self {
        Self { severity: Severity::Note, ..Self::error(kind, class, message, span) }
    }

    pub fn for_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}", self.severity, self.kind.code(), self.class)?;
        if let Some(m) = &self.member {
            write!(f, ".{m}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Receiver for ordered diagnostic records.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink that drops everything; for callers that only want the reports.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

/// Render a diagnostic with ariadne against the source the tree was parsed from.
pub fn render_diagnostic(source: &str, diagnostic: &Diagnostic) -> std::io::Result<()> {
    use ariadne::{Label, Report, ReportKind, Source};

    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };
    let span = diagnostic.span;
    let end = span.end.min(source.len());
    let start = span.start.min(end);
    Report::build(kind, (), start)
        .with_code(diagnostic.kind.code())
        .with_message(format!("in '{}'", diagnostic.class))
        .with_label(Label::new(start..end).with_message(&diagnostic.message))
        .finish()
        .eprint(Source::from(source))
}
