use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ast::{MemberSignature, TypeExpr, TypeParam, TypeRef};
use crate::diagnostics::CheckError;
use crate::prelude::OBJECT;

/// Parameter name -> replacement.
pub type Bindings = HashMap<String, TypeRef>;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Pair a declaration's parameters with the arguments given at a use site.
/// Extra parameters or arguments are ignored; arity is checked at bind time.
pub fn bindings_for(params: &[TypeParam], args: &[TypeRef]) -> Bindings {
    params.iter()
        .zip(args.iter())
        .map(|(p, a)| (p.name.node.clone(), Arc::clone(a)))
        .collect()
}

/// Substitute with the default nesting limit.
pub fn substitute(ty: &TypeRef, bindings: &Bindings) -> Result<TypeRef, CheckError> {
    Substituter::default().apply(ty, bindings)
}

/// Replaces parameter references in type expressions.
///
/// Never mutates its input. Subtrees without a bound parameter are shared
/// with the input rather than copied.
#[derive(Debug, Clone, Copy)]
pub struct Substituter {
    max_depth: usize,
}

impl Default for Substituter {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Substituter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Fails with `CyclicType` when the input or the result nests deeper than
    /// the limit.
    pub fn apply(&self, ty: &TypeRef, bindings: &Bindings) -> Result<TypeRef, CheckError> {
        if bindings.is_empty() || !ty.mentions_param() {
            if ty.depth() > self.max_depth {
                return Err(CheckError::cyclic_type(self.max_depth));
            }
            return Ok(Arc::clone(ty));
        }
        let out = self.walk(ty, bindings, 1)?;
        if out.depth() > self.max_depth {
            return Err(CheckError::cyclic_type(self.max_depth));
        }
        Ok(out)
    }

    fn walk(&self, ty: &TypeRef, bindings: &Bindings, depth: usize) -> Result<TypeRef, CheckError> {
        if depth > self.max_depth {
            return Err(CheckError::cyclic_type(self.max_depth));
        }
        match &**ty {
            TypeExpr::Param { name } => Ok(bindings.get(name).cloned().unwrap_or_else(|| Arc::clone(ty))),
            TypeExpr::Named { args, .. } if args.is_empty() => Ok(Arc::clone(ty)),
            TypeExpr::Named { name, args } => {
                let new_args = args.iter()
                    .map(|a| self.walk(a, bindings, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                if new_args.iter().zip(args).all(|(n, o)| Arc::ptr_eq(n, o)) {
                    Ok(Arc::clone(ty))
                } else {
                    Ok(TypeExpr::named(name.clone(), new_args))
                }
            }
        }
    }

    /// Instantiate an inherited member. Method-level type parameters shadow
    /// the class-level bindings, and are renamed if a replacement would
    /// otherwise be captured by them.
    pub fn apply_signature(&self, sig: &MemberSignature, bindings: &Bindings) -> Result<MemberSignature, CheckError> {
        if sig.type_params.is_empty() {
            return self.map_signature(sig, sig.type_params.clone(), bindings);
        }

        let mut local: Bindings = bindings.iter()
            .filter(|(k, _)| !sig.type_params.iter().any(|p| p.name.node == **k))
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();

        let mut free = HashSet::new();
        for v in local.values() {
            collect_params(v, &mut free);
        }

        let mut type_params = Vec::with_capacity(sig.type_params.len());
        for p in &sig.type_params {
            let mut fresh = p.name.node.clone();
            while free.contains(&fresh) || sig.type_params.iter().any(|q| q.name.node == fresh && q.name.node != p.name.node) {
                fresh.push('\'');
            }
            if fresh != p.name.node {
                local.insert(p.name.node.clone(), TypeExpr::param(fresh.clone()));
            }
            free.insert(fresh.clone());
            let mut renamed = p.clone();
            renamed.name.node = fresh;
            type_params.push(renamed);
        }
        self.map_signature(sig, type_params, &local)
    }

    /// Rename `sig`'s method type parameters positionally to `to`, so two
    /// generic methods can be compared structurally. `None` if the counts differ.
    pub fn rename_method_params(&self, sig: &MemberSignature, to: &[TypeParam]) -> Result<Option<MemberSignature>, CheckError> {
        if sig.type_params.len() != to.len() {
            return Ok(None);
        }
        if sig.type_params.is_empty() {
            return Ok(Some(sig.clone()));
        }
        let renaming: Bindings = sig.type_params.iter()
            .zip(to)
            .map(|(from, to)| (from.name.node.clone(), TypeExpr::param(to.name.node.clone())))
            .collect();
        let type_params = sig.type_params.iter()
            .zip(to)
            .map(|(from, to)| TypeParam { name: to.name.clone(), bound: from.bound.clone() })
            .collect();
        self.map_signature(sig, type_params, &renaming).map(Some)
    }

    /// Bring a declared generic method and an inherited one onto common
    /// method type parameter names. The declared names are kept unless one of
    /// them also occurs free in `inherited` (a class parameter the declared
    /// method shadows); then both sides are renamed to fresh positional names.
    /// `None` if the counts differ.
    pub fn align_method_params(
        &self,
        declared: &MemberSignature,
        inherited: &MemberSignature,
    ) -> Result<Option<(MemberSignature, MemberSignature)>, CheckError> {
        if declared.type_params.len() != inherited.type_params.len() {
            return Ok(None);
        }
        if declared.type_params.is_empty() {
            return Ok(Some((declared.clone(), inherited.clone())));
        }
        let mut taken = free_params(inherited);
        let captured = declared.type_params.iter().any(|p| taken.contains(&p.name.node));
        if !captured {
            return Ok(self.rename_method_params(inherited, &declared.type_params)?
                .map(|aligned| (declared.clone(), aligned)));
        }

        taken.extend(free_params(declared));
        let fresh: Vec<TypeParam> = (0..declared.type_params.len())
            .map(|i| {
                let mut name = format!("${i}");
                while taken.contains(&name) {
                    name.push('\'');
                }
                TypeParam::new(name, None)
            })
            .collect();
        let declared = self.rename_method_params(declared, &fresh)?;
        let inherited = self.rename_method_params(inherited, &fresh)?;
        Ok(declared.zip(inherited))
    }

    fn map_signature(&self, sig: &MemberSignature, type_params: Vec<TypeParam>, bindings: &Bindings) -> Result<MemberSignature, CheckError> {
        let type_params = type_params.into_iter()
            .map(|p| {
                let bound = p.bound.as_ref().map(|b| self.apply(b, bindings)).transpose()?;
                Ok(TypeParam { name: p.name, bound })
            })
            .collect::<Result<Vec<_>, CheckError>>()?;
        let params = sig.params.iter()
            .map(|p| self.apply(p, bindings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MemberSignature {
            name: sig.name.clone(),
            kind: sig.kind,
            type_params,
            params,
            ret: self.apply(&sig.ret, bindings)?,
            is_abstract: sig.is_abstract,
        })
    }
}

/// The bound of `param`; an unbounded parameter is bounded by `Object`.
pub fn bound_of(param: &TypeParam) -> TypeRef {
    param.bound.clone().unwrap_or_else(|| TypeExpr::simple(OBJECT))
}

/// Method type parameters line up only if their bounds are the same.
pub fn same_bound(a: &TypeParam, b: &TypeParam) -> bool {
    bound_of(a) == bound_of(b)
}

/// Parameters a signature mentions but does not declare itself.
fn free_params(sig: &MemberSignature) -> HashSet<String> {
    let mut out = HashSet::new();
    for ty in sig.params.iter().chain(std::iter::once(&sig.ret)) {
        collect_params(ty, &mut out);
    }
    for bound in sig.type_params.iter().filter_map(|p| p.bound.as_ref()) {
        collect_params(bound, &mut out);
    }
    for p in &sig.type_params {
        out.remove(&p.name.node);
    }
    out
}

fn collect_params(ty: &TypeExpr, out: &mut HashSet<String>) {
    match ty {
        TypeExpr::Param { name } => {
            out.insert(name.clone());
        }
        TypeExpr::Named { args, .. } => {
            for a in args {
                collect_params(a, out);
            }
        }
    }
}
