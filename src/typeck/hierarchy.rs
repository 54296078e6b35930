//! Hierarchy resolution: the instantiated set of members a class inherits.
//!
//! Ancestors are walked depth-first, supertype before interfaces, composing
//! the use-site bindings at every level. The result is a static map from
//! member name to every substituted signature an ancestor contributes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{AncestorRole, ClassDecl, DeclKind, MemberKind, MemberSignature, TypeRef};
use crate::diagnostics::{CheckError, Diagnostic, DiagnosticKind};
use crate::span::Span;

use super::bind::{BoundClass, SymbolTable};
use super::subst::{bindings_for, same_bound, Bindings, Substituter};
use super::subtype::SubtypeEnv;

/// A member as seen through one instantiated ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritedMember {
    /// The ancestor as instantiated for this class, e.g. `Function<Long, Long>`.
    pub origin: TypeRef,
    pub origin_kind: DeclKind,
    pub sig: MemberSignature,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiamondConflict {
    pub member: String,
    pub origins: Vec<TypeRef>,
}

/// Everything inherited under one member name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberBucket {
    pub candidates: Vec<InheritedMember>,
    /// Set when two unrelated ancestors contribute incompatible methods; such a
    /// bucket offers nothing to override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<DiamondConflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedHierarchy {
    pub class: Arc<ClassDecl>,
    /// Instantiated ancestors in visit order, each once.
    pub ancestors: Vec<TypeRef>,
    pub inherited: BTreeMap<String, MemberBucket>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedHierarchy {
    pub fn bucket(&self, name: &str) -> Option<&MemberBucket> {
        self.inherited.get(name)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &DiamondConflict> {
        self.inherited.values().filter_map(|b| b.conflict.as_ref())
    }
}

struct Walk {
    stack: Vec<String>,
    seen: HashSet<TypeRef>,
    ancestors: Vec<TypeRef>,
    members: Vec<InheritedMember>,
    diagnostics: Vec<Diagnostic>,
}

pub struct HierarchyResolver<'a> {
    symbols: &'a SymbolTable,
    subst: Substituter,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols, subst: Substituter::new(symbols.max_depth()) }
    }

    /// Fails only on hard errors (an ancestor that cannot be bound, an
    /// inheritance cycle); everything else is recorded in `diagnostics`.
    pub fn resolve(&self, class: &BoundClass) -> Result<ResolvedHierarchy, CheckError> {
        let root = class.name();
        let mut walk = Walk {
            stack: vec![root.to_string()],
            seen: HashSet::new(),
            ancestors: Vec::new(),
            members: Vec::new(),
            diagnostics: Vec::new(),
        };

        let mut listed = HashSet::new();
        for (role, ancestor) in class.decl().direct_ancestors() {
            if role == AncestorRole::Interface && !listed.insert(Arc::clone(&ancestor.node)) {
                walk.diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::DuplicateInterface,
                    root,
                    format!("'{}' is listed more than once", ancestor.node),
                    ancestor.span,
                ));
                continue;
            }
            self.visit(class, &ancestor.node, role, ancestor.span, &mut walk)?;
        }

        let inherited = self.merge(class, walk.members, &mut walk.diagnostics);
        tracing::debug!(
            class = %root,
            ancestors = walk.ancestors.len(),
            members = inherited.len(),
            "resolved hierarchy"
        );

        Ok(ResolvedHierarchy {
            class: Arc::clone(class.decl()),
            ancestors: walk.ancestors,
            inherited,
            diagnostics: walk.diagnostics,
        })
    }

    /// `ty` is already instantiated in terms of the root class's parameters.
    /// `site` is the span of the root's direct ancestor the walk came through.
    fn visit(
        &self,
        root: &BoundClass,
        ty: &TypeRef,
        role: AncestorRole,
        site: Span,
        walk: &mut Walk,
    ) -> Result<(), CheckError> {
        let name = ty.name();
        if walk.stack.iter().any(|n| n == name) {
            return Err(CheckError::cyclic_inheritance(name, site));
        }
        if !walk.seen.insert(Arc::clone(ty)) {
            return Ok(());
        }
        let Some(ancestor) = self.symbols.class(name) else {
            return Err(match role {
                AncestorRole::Supertype => CheckError::unresolved_supertype(name, site),
                AncestorRole::Interface => CheckError::unresolved_interface(name, site),
            });
        };
        tracing::trace!(class = %root.name(), ancestor = %ty, "visiting ancestor");

        let bindings = bindings_for(&ancestor.decl().type_params, ty.args());
        self.check_bounds(root, ancestor, ty, &bindings, site, walk);
        walk.ancestors.push(Arc::clone(ty));

        for member in &ancestor.decl().members {
            if member.sig.kind == MemberKind::Constructor {
                continue;
            }
            match self.subst.apply_signature(&member.sig, &bindings) {
                Ok(sig) => walk.members.push(InheritedMember {
                    origin: Arc::clone(ty),
                    origin_kind: ancestor.decl().kind,
                    sig,
                    span: member.span,
                }),
                Err(e) => walk.diagnostics.push(
                    e.at(site).to_diagnostic(root.name()).for_member(member.sig.name.as_str()),
                ),
            }
        }

        walk.stack.push(name.to_string());
        let result = ancestor.decl().direct_ancestors().try_for_each(|(next_role, next)| {
            let instantiated = self.subst.apply(&next.node, &bindings).map_err(|e| e.at(site))?;
            self.visit(root, &instantiated, next_role, site, walk)
        });
        walk.stack.pop();
        result
    }

    fn check_bounds(
        &self,
        root: &BoundClass,
        ancestor: &BoundClass,
        ty: &TypeRef,
        bindings: &Bindings,
        site: Span,
        walk: &mut Walk,
    ) {
        let env = SubtypeEnv::new(self.symbols, root.params(), self.subst);
        for (param, arg) in ancestor.decl().type_params.iter().zip(ty.args()) {
            let Some(bound) = &param.bound else { continue };
            let bound = match self.subst.apply(bound, bindings) {
                Ok(b) => b,
                Err(e) => {
                    walk.diagnostics.push(e.at(site).to_diagnostic(root.name()));
                    continue;
                }
            };
            if !env.is_subtype(arg, &bound) {
                walk.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::BoundViolation,
                    root.name(),
                    format!(
                        "Type argument '{arg}' is not within bound '{bound}' of '{}' in '{}'",
                        param.name.node,
                        ancestor.name()
                    ),
                    site,
                ));
            }
        }
    }

    fn merge(
        &self,
        root: &BoundClass,
        members: Vec<InheritedMember>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> BTreeMap<String, MemberBucket> {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<InheritedMember>> = HashMap::new();
        for member in members {
            let name = member.sig.name.clone();
            if !grouped.contains_key(&name) {
                order.push(name.clone());
            }
            grouped.entry(name).or_default().push(member);
        }

        let mut inherited = BTreeMap::new();
        for name in order {
            let mut candidates = grouped.remove(&name).unwrap_or_default();
            candidates.sort_by_cached_key(|m| (m.origin.to_string(), m.sig.to_string()));
            let conflict = self.find_conflict(root, &name, &candidates);
            if let Some(c) = &conflict {
                let described: Vec<String> = c.origins.iter()
                    .map(|o| {
                        let sig = candidates.iter()
                            .find(|m| &m.origin == o)
                            .map(|m| m.sig.to_string())
                            .unwrap_or_default();
                        format!("'{o}' ({sig})")
                    })
                    .collect();
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::DiamondConflict,
                        root.name(),
                        format!("'{name}' is inherited with incompatible signatures from {}", described.join(" and ")),
                        root.decl().name.span.or(root.decl().span),
                    )
                    .for_member(name.as_str()),
                );
            }
            inherited.insert(name, MemberBucket { candidates, conflict });
        }
        inherited
    }

    fn find_conflict(&self, root: &BoundClass, name: &str, candidates: &[InheritedMember]) -> Option<DiamondConflict> {
        for (i, a) in candidates.iter().enumerate() {
            for b in &candidates[i + 1..] {
                if self.incompatible(root, a, b) {
                    return Some(DiamondConflict {
                        member: name.to_string(),
                        origins: vec![Arc::clone(&a.origin), Arc::clone(&b.origin)],
                    });
                }
            }
        }
        None
    }

    /// Same parameter list, unrelated returns, unrelated contributing ancestors.
    fn incompatible(&self, root: &BoundClass, a: &InheritedMember, b: &InheritedMember) -> bool {
        if a.sig.kind != MemberKind::Method || b.sig.kind != MemberKind::Method || a.origin == b.origin {
            return false;
        }
        let Ok(Some((a_sig, b_sig))) = self.subst.align_method_params(&a.sig, &b.sig) else {
            return false;
        };
        let same_bounds = a_sig.type_params.iter().zip(&b_sig.type_params).all(|(x, y)| same_bound(x, y));
        if !same_bounds || a_sig.params != b_sig.params {
            return false;
        }
        let scope = root.method_scope(&a_sig.name, &a_sig.type_params);
        let env = SubtypeEnv::new(self.symbols, &scope, self.subst);
        !env.related(&a_sig.ret, &b_sig.ret) && !env.related(&a.origin, &b.origin)
    }
}
