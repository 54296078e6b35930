//! Override conformance: does each member declared as overriding actually
//! match something the class inherits?

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::ast::{DeclKind, MemberDecl, MemberKind, MemberSignature, TypeRef};
use crate::config::CheckerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::span::Span;

use super::bind::{BoundClass, SymbolTable};
use super::hierarchy::{InheritedMember, ResolvedHierarchy};
use super::subst::{bound_of, same_bound, Substituter};
use super::subtype::SubtypeEnv;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Conforms,
    ArityMismatch,
    TypeMismatch,
    NoMatchingSupertypeMember,
}

impl Outcome {
    pub fn kind(self) -> DiagnosticKind {
        match self {
            Outcome::Conforms => DiagnosticKind::Conforms,
            Outcome::ArityMismatch => DiagnosticKind::ArityMismatch,
            Outcome::TypeMismatch => DiagnosticKind::TypeMismatch,
            Outcome::NoMatchingSupertypeMember => DiagnosticKind::NoMatchingSupertypeMember,
        }
    }

    pub fn is_error(self) -> bool {
        self != Outcome::Conforms
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceVerdict {
    pub member: String,
    pub member_index: usize,
    pub outcome: Outcome,
    /// The ancestor whose member was overridden, for `Conforms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<TypeRef>,
    pub detail: String,
    pub span: Span,
}

impl ConformanceVerdict {
    pub fn to_diagnostic(&self, class: &str) -> Diagnostic {
        let diagnostic = if self.outcome.is_error() {
            Diagnostic::error(self.outcome.kind(), class, self.detail.as_str(), self.span)
        } else {
            Diagnostic::note(self.outcome.kind(), class, self.detail.as_str(), self.span)
        };
        diagnostic.for_member(self.member.as_str())
    }
}

pub struct OverrideChecker<'a> {
    symbols: &'a SymbolTable,
    subst: Substituter,
    covariant_returns: bool,
}

impl<'a> OverrideChecker<'a> {
    pub fn new(symbols: &'a SymbolTable, config: &CheckerConfig) -> Self {
        Self {
            symbols,
            subst: Substituter::new(config.max_type_depth),
            covariant_returns: config.covariant_returns,
        }
    }

    /// One verdict per member with `declared_override`, in declaration order.
    pub fn check(&self, class: &BoundClass, hierarchy: &ResolvedHierarchy) -> Vec<ConformanceVerdict> {
        class.decl().members.iter()
            .enumerate()
            .filter(|(_, m)| m.declared_override)
            .map(|(i, m)| {
                let verdict = self.check_member(class, hierarchy, i, m);
                tracing::trace!(class = %class.name(), member = %m.sig.name, outcome = %verdict.outcome, "override verdict");
                verdict
            })
            .collect()
    }

    fn check_member(
        &self,
        class: &BoundClass,
        hierarchy: &ResolvedHierarchy,
        index: usize,
        member: &MemberDecl,
    ) -> ConformanceVerdict {
        let sig = &member.sig;
        let verdict = |outcome: Outcome, matched: Option<TypeRef>, detail: String| ConformanceVerdict {
            member: sig.name.clone(),
            member_index: index,
            outcome,
            matched,
            detail,
            span: member.span,
        };
        let no_match = |detail: String| verdict(Outcome::NoMatchingSupertypeMember, None, detail);

        if sig.kind == MemberKind::Constructor {
            return no_match(format!("Constructor '{}' cannot override", sig.name));
        }
        let Some(bucket) = hierarchy.bucket(&sig.name) else {
            return no_match(format!("'{}' does not override any inherited member", sig.name));
        };
        if bucket.conflict.is_some() {
            return no_match(format!("'{}' is inherited with conflicting signatures; there is nothing to override", sig.name));
        }
        let same_kind: Vec<&InheritedMember> = bucket.candidates.iter()
            .filter(|c| c.sig.kind == sig.kind)
            .collect();
        if same_kind.is_empty() {
            return no_match(format!("No inherited {} named '{}'", sig.kind, sig.name));
        }

        let same_arity: Vec<&InheritedMember> = same_kind.iter()
            .copied()
            .filter(|c| c.sig.arity() == sig.arity())
            .collect();
        if same_arity.is_empty() {
            let arities: BTreeSet<usize> = same_kind.iter().map(|c| c.sig.arity()).collect();
            let arities: Vec<String> = arities.iter().map(usize::to_string).collect();
            return verdict(
                Outcome::ArityMismatch,
                None,
                format!(
                    "'{}' takes {} parameter(s) but the inherited '{}' takes {}",
                    sig.name,
                    sig.arity(),
                    sig.name,
                    arities.join(" or ")
                ),
            );
        }

        let mut first_detail = None;
        for candidate in same_arity {
            match self.compare(class, sig, candidate) {
                Ok(()) => {
                    return verdict(
                        Outcome::Conforms,
                        Some(candidate.origin.clone()),
                        format!("Overrides '{}' from '{}'", candidate.sig, candidate.origin),
                    );
                }
                Err(detail) => {
                    first_detail.get_or_insert(detail);
                }
            }
        }
        verdict(Outcome::TypeMismatch, None, first_detail.unwrap_or_default())
    }

    /// `Err` carries a description of the first difference.
    fn compare(&self, class: &BoundClass, sig: &MemberSignature, candidate: &InheritedMember) -> Result<(), String> {
        let origin = &candidate.origin;
        let (declared, aligned) = match self.subst.align_method_params(sig, &candidate.sig) {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                return Err(format!(
                    "'{}' declares {} type parameter(s) but the one in '{origin}' declares {}",
                    sig.name,
                    sig.type_params.len(),
                    candidate.sig.type_params.len()
                ));
            }
            Err(e) => return Err(e.to_string()),
        };

        for (mine, theirs) in declared.type_params.iter().zip(&aligned.type_params) {
            if !same_bound(mine, theirs) {
                return Err(format!(
                    "Type parameter '{}' is bounded by '{}' but '{origin}' declares '{}'",
                    mine.name.node,
                    bound_of(mine),
                    bound_of(theirs)
                ));
            }
        }

        if declared.kind == MemberKind::Field {
            if declared.ret != aligned.ret {
                return Err(format!(
                    "Field type '{}' differs from '{}' declared in '{origin}'",
                    declared.ret, aligned.ret
                ));
            }
            return Ok(());
        }

        for (i, (mine, inherited)) in declared.params.iter().zip(&aligned.params).enumerate() {
            if mine != inherited {
                return Err(format!(
                    "Parameter {} is '{mine}' but '{origin}' declares '{inherited}'",
                    i + 1
                ));
            }
        }

        let scope = class.method_scope(&declared.name, &declared.type_params);
        let env = SubtypeEnv::new(self.symbols, &scope, self.subst);
        let ret_ok = declared.ret == aligned.ret
            || (self.covariant_returns && env.is_subtype(&declared.ret, &aligned.ret));
        if !ret_ok {
            return Err(format!(
                "Return type '{}' is not compatible with '{}' declared in '{origin}'",
                declared.ret, aligned.ret
            ));
        }
        Ok(())
    }

    /// Abstract inherited methods a concrete class leaves without an
    /// implementation.
    pub fn unimplemented_abstract(&self, class: &BoundClass, hierarchy: &ResolvedHierarchy) -> Vec<Diagnostic> {
        if !class.decl().is_concrete() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (name, bucket) in &hierarchy.inherited {
            if bucket.conflict.is_some() {
                continue;
            }
            for candidate in bucket.candidates.iter().filter(|c| c.sig.is_abstract && c.sig.kind == MemberKind::Method) {
                let declared = class.members_named(name)
                    .any(|m| !m.sig.is_abstract && self.same_parameters(&m.sig, &candidate.sig));
                let inherited = bucket.candidates.iter().any(|other| {
                    other.origin_kind == DeclKind::Class
                        && !other.sig.is_abstract
                        && self.same_parameters(&other.sig, &candidate.sig)
                });
                if !declared && !inherited {
                    out.push(
                        Diagnostic::error(
                            DiagnosticKind::UnimplementedAbstractMember,
                            class.name(),
                            format!("'{}' must implement '{}' from '{}'", class.name(), candidate.sig, candidate.origin),
                            class.decl().name.span.or(class.decl().span),
                        )
                        .for_member(name.as_str()),
                    );
                }
            }
        }
        out
    }

    fn same_parameters(&self, sig: &MemberSignature, abstract_sig: &MemberSignature) -> bool {
        if sig.kind != MemberKind::Method {
            return false;
        }
        match self.subst.align_method_params(sig, abstract_sig) {
            Ok(Some((declared, aligned))) => {
                declared.params == aligned.params
                    && declared.type_params.iter().zip(&aligned.type_params).all(|(a, b)| same_bound(a, b))
            }
            _ => false,
        }
    }
}
