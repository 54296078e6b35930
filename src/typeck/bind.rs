//! Symbol binding for one compilation unit.
//!
//! Every declaration is bound once, up front, into a read-only
//! [`SymbolTable`]. Binding resolves each simple type name against (in order)
//! the method's type parameters, the class's type parameters, the visible
//! class names and the primitive names, and records what every occurrence
//! refers to. The bound declaration is normalized: a `Named` reference that is
//! really a type parameter becomes `Param`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::ast::{
    AncestorRole, ClassDecl, CompilationUnit, DeclKind, MemberDecl, MemberKind, MemberSignature,
    TypeExpr, TypeParam, TypeRef,
};
use crate::config::CheckerConfig;
use crate::diagnostics::CheckError;
use crate::prelude;
use crate::span::{Span, Spanned};

use super::params::ParamTable;

/// The entity an identifier occurrence refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    TypeParam { scope: String, name: String },
    Class { name: String, kind: DeclKind },
    Primitive { name: String },
    Member { class: String, index: usize, kind: MemberKind },
}

/// Where in a declaration an occurrence sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    ClassParamBound(usize),
    Supertype,
    Interface(usize),
    MemberParamBound { member: usize, param: usize },
    MemberParam { member: usize, param: usize },
    MemberReturn(usize),
    MemberName(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub site: Site,
    pub name: String,
    pub symbol: Symbol,
    pub span: Span,
}

/// What the binder knows about a declaration before its body is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclHeader {
    pub kind: DeclKind,
    pub arity: usize,
}

impl DeclHeader {
    fn of(decl: &ClassDecl) -> Self {
        Self { kind: decl.kind, arity: decl.type_params.len() }
    }
}

/// A successfully bound class or interface.
#[derive(Debug, Clone)]
pub struct BoundClass {
    decl: Arc<ClassDecl>,
    params: ParamTable<'static>,
    occurrences: Vec<Occurrence>,
    members: BTreeMap<String, Vec<usize>>,
}

impl BoundClass {
    pub fn name(&self) -> &str {
        self.decl.name()
    }

    /// The normalized declaration.
    pub fn decl(&self) -> &Arc<ClassDecl> {
        &self.decl
    }

    /// Class-level type parameters with bound (normalized) bounds.
    pub fn params(&self) -> &ParamTable<'static> {
        &self.params
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Members declared under `name`, in declaration order.
    pub fn members_named(&self, name: &str) -> impl Iterator<Item = &MemberDecl> {
        self.members.get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.decl.members[i])
    }

    /// The scope visible inside method `member`: `type_params` chained onto
    /// the class parameters.
    pub fn method_scope(&self, member: &str, type_params: &[TypeParam]) -> ParamTable<'_> {
        let mut scope = self.params.child(format!("{}.{member}", self.name()));
        for p in type_params {
            // duplicates were rejected when the class was bound
            let _ = scope.declare(p.clone());
        }
        scope
    }
}

#[derive(Debug, Clone)]
pub struct UnitEntry {
    pub name: String,
    pub span: Span,
    pub result: Result<Arc<BoundClass>, CheckError>,
}

/// Read-only declaration context for one compilation unit.
#[derive(Debug)]
pub struct SymbolTable {
    headers: HashMap<String, DeclHeader>,
    classes: HashMap<String, Result<Arc<BoundClass>, CheckError>>,
    unit: Vec<UnitEntry>,
    max_depth: usize,
}

impl SymbolTable {
    pub fn build(unit: &CompilationUnit, config: &CheckerConfig) -> Self {
        let prelude_decls: &[ClassDecl] = if config.prelude { prelude::prelude_classes() } else { &[] };

        // Headers first, so bodies may refer to declarations in any order.
        let mut headers = HashMap::new();
        for decl in prelude_decls {
            headers.insert(decl.name().to_string(), DeclHeader::of(decl));
        }
        let mut owns_name = Vec::with_capacity(unit.classes.len());
        for decl in &unit.classes {
            let fresh = !headers.contains_key(decl.name());
            if fresh {
                headers.insert(decl.name().to_string(), DeclHeader::of(decl));
            }
            owns_name.push(fresh);
        }

        let mut table = Self {
            headers,
            classes: HashMap::new(),
            unit: Vec::with_capacity(unit.classes.len()),
            max_depth: config.max_type_depth,
        };

        for decl in prelude_decls {
            let result = table.bind_class(decl).map(Arc::new);
            table.classes.insert(decl.name().to_string(), result);
        }

        for (decl, fresh) in unit.classes.iter().zip(owns_name) {
            let result = if fresh {
                let result = table.bind_class(decl).map(Arc::new);
                table.classes.insert(decl.name().to_string(), result.clone());
                result
            } else {
                tracing::debug!(class = %decl.name(), "duplicate declaration");
                Err(CheckError::duplicate_declaration(decl.name(), decl.name.span.or(decl.span)))
            };
            table.unit.push(UnitEntry {
                name: decl.name().to_string(),
                span: decl.span,
                result,
            });
        }
        table
    }

    /// Declarations of the unit, in source order, including failed ones.
    pub fn unit_classes(&self) -> &[UnitEntry] {
        &self.unit
    }

    pub fn get(&self, name: &str) -> Option<&Result<Arc<BoundClass>, CheckError>> {
        self.classes.get(name)
    }

    /// A visible declaration that bound without error.
    pub fn class(&self, name: &str) -> Option<&Arc<BoundClass>> {
        self.classes.get(name).and_then(|r| r.as_ref().ok())
    }

    pub fn header(&self, name: &str) -> Option<&DeclHeader> {
        self.headers.get(name)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve a simple type name as seen from `scope`.
    pub fn resolve_name(&self, name: &str, scope: &ParamTable<'_>) -> Option<Symbol> {
        if let Some((_, declared_in)) = scope.find(name) {
            return Some(Symbol::TypeParam { scope: declared_in.to_string(), name: name.to_string() });
        }
        if let Some(header) = self.headers.get(name) {
            return Some(Symbol::Class { name: name.to_string(), kind: header.kind });
        }
        if prelude::is_primitive(name) {
            return Some(Symbol::Primitive { name: name.to_string() });
        }
        None
    }

    fn bind_class(&self, decl: &ClassDecl) -> Result<BoundClass, CheckError> {
        let class_name = decl.name();
        let mut params = ParamTable::root(class_name);
        for p in &decl.type_params {
            params.declare(p.clone()).map_err(|e| e.at(decl.name.span))?;
        }

        let mut occurrences = Vec::new();
        let mut type_params = Vec::with_capacity(decl.type_params.len());
        for (i, p) in decl.type_params.iter().enumerate() {
            let bound = p.bound.as_ref()
                .map(|b| self.bind_type(b, &params, Site::ClassParamBound(i), p.name.span.or(decl.span), 1, &mut occurrences))
                .transpose()?;
            type_params.push(TypeParam { name: p.name.clone(), bound });
        }
        for p in &type_params {
            params.set_bound(&p.name.node, p.bound.clone());
        }

        let supertype = decl.supertype.as_ref()
            .map(|s| self.bind_ancestor(s, AncestorRole::Supertype, Site::Supertype, &params, &mut occurrences))
            .transpose()?;
        let interfaces = decl.interfaces.iter()
            .enumerate()
            .map(|(i, s)| self.bind_ancestor(s, AncestorRole::Interface, Site::Interface(i), &params, &mut occurrences))
            .collect::<Result<Vec<_>, _>>()?;

        let mut members = Vec::with_capacity(decl.members.len());
        let mut member_index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, member) in decl.members.iter().enumerate() {
            let sig = self.bind_member(i, member, &params, &mut occurrences)?;
            occurrences.push(Occurrence {
                site: Site::MemberName(i),
                name: sig.name.clone(),
                symbol: Symbol::Member { class: class_name.to_string(), index: i, kind: sig.kind },
                span: member.span,
            });
            member_index.entry(sig.name.clone()).or_default().push(i);
            members.push(MemberDecl { sig, declared_override: member.declared_override, span: member.span });
        }

        tracing::trace!(class = %class_name, occurrences = occurrences.len(), "bound declaration");

        let normalized = ClassDecl {
            name: decl.name.clone(),
            kind: decl.kind,
            is_abstract: decl.is_abstract,
            type_params,
            supertype,
            interfaces,
            members,
            span: decl.span,
        };
        Ok(BoundClass {
            decl: Arc::new(normalized),
            params,
            occurrences,
            members: member_index,
        })
    }

    fn bind_ancestor(
        &self,
        ancestor: &Spanned<TypeRef>,
        role: AncestorRole,
        site: Site,
        params: &ParamTable<'_>,
        out: &mut Vec<Occurrence>,
    ) -> Result<Spanned<TypeRef>, CheckError> {
        let head = ancestor.node.name();
        let head_is_class = matches!(&*ancestor.node, TypeExpr::Named { .. })
            && !params.contains(head)
            && self.headers.contains_key(head);
        if !head_is_class {
            return Err(match role {
                AncestorRole::Supertype => CheckError::unresolved_supertype(head, ancestor.span),
                AncestorRole::Interface => CheckError::unresolved_interface(head, ancestor.span),
            });
        }
        let node = self.bind_type(&ancestor.node, params, site, ancestor.span, 1, out)?;
        Ok(Spanned::new(node, ancestor.span))
    }

    fn bind_member(
        &self,
        index: usize,
        member: &MemberDecl,
        params: &ParamTable<'_>,
        out: &mut Vec<Occurrence>,
    ) -> Result<MemberSignature, CheckError> {
        let sig = &member.sig;
        let mut scope = params.child(format!("{}.{}", params.scope(), sig.name));
        for p in &sig.type_params {
            scope.declare(p.clone()).map_err(|e| e.at(member.span))?;
        }

        let mut type_params = Vec::with_capacity(sig.type_params.len());
        for (j, p) in sig.type_params.iter().enumerate() {
            let site = Site::MemberParamBound { member: index, param: j };
            let bound = p.bound.as_ref()
                .map(|b| self.bind_type(b, &scope, site, member.span, 1, out))
                .transpose()?;
            type_params.push(TypeParam { name: p.name.clone(), bound });
        }

        let param_types = sig.params.iter()
            .enumerate()
            .map(|(j, t)| self.bind_type(t, &scope, Site::MemberParam { member: index, param: j }, member.span, 1, out))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = self.bind_type(&sig.ret, &scope, Site::MemberReturn(index), member.span, 1, out)?;

        Ok(MemberSignature {
            name: sig.name.clone(),
            kind: sig.kind,
            type_params,
            params: param_types,
            ret,
            is_abstract: sig.is_abstract,
        })
    }

    fn bind_type(
        &self,
        ty: &TypeRef,
        scope: &ParamTable<'_>,
        site: Site,
        span: Span,
        depth: usize,
        out: &mut Vec<Occurrence>,
    ) -> Result<TypeRef, CheckError> {
        if depth > self.max_depth {
            return Err(CheckError::cyclic_type(self.max_depth).at(span));
        }

        let name = ty.name();
        let args = ty.args();
        let symbol = match &**ty {
            TypeExpr::Param { .. } => match scope.find(name) {
                Some((_, declared_in)) => Symbol::TypeParam { scope: declared_in.to_string(), name: name.to_string() },
                None => return Err(CheckError::unknown_parameter(name, span)),
            },
            TypeExpr::Named { .. } => self.resolve_name(name, scope)
                .ok_or_else(|| CheckError::unresolved_name(name, span))?,
        };
        out.push(Occurrence { site, name: name.to_string(), symbol: symbol.clone(), span });

        match symbol {
            Symbol::TypeParam { .. } => {
                if !args.is_empty() {
                    return Err(CheckError::type_argument_arity(name, 0, args.len(), span));
                }
                Ok(match &**ty {
                    TypeExpr::Param { .. } => Arc::clone(ty),
                    TypeExpr::Named { .. } => TypeExpr::param(name),
                })
            }
            Symbol::Primitive { .. } => {
                if !args.is_empty() {
                    return Err(CheckError::type_argument_arity(name, 0, args.len(), span));
                }
                Ok(Arc::clone(ty))
            }
            Symbol::Class { .. } => {
                let bound_args = args.iter()
                    .map(|a| self.bind_type(a, scope, site, span, depth + 1, out))
                    .collect::<Result<Vec<_>, _>>()?;
                let expected = self.headers.get(name).map_or(0, |h| h.arity);
                if expected != args.len() {
                    return Err(CheckError::type_argument_arity(name, expected, args.len(), span));
                }
                if bound_args.iter().zip(args).all(|(b, a)| Arc::ptr_eq(b, a)) {
                    Ok(Arc::clone(ty))
                } else {
                    Ok(TypeExpr::named(name, bound_args))
                }
            }
            Symbol::Member { .. } => Err(CheckError::unresolved_name(name, span)),
        }
    }
}
