use crate::ast::{TypeExpr, TypeRef};
use crate::prelude::{self, OBJECT};

use super::bind::SymbolTable;
use super::params::ParamTable;
use super::subst::{bindings_for, Substituter};

/// Nominal subtyping over instantiated declarations.
///
/// Type arguments are invariant: `Box<Integer>` is not a `Box<Number>`.
/// A type parameter is a subtype of whatever its bound is a subtype of, and
/// an unbounded parameter behaves like `Object`. Primitives are only
/// subtypes of themselves.
pub struct SubtypeEnv<'a> {
    symbols: &'a SymbolTable,
    scope: &'a ParamTable<'a>,
    subst: Substituter,
}

impl<'a> SubtypeEnv<'a> {
    pub fn new(symbols: &'a SymbolTable, scope: &'a ParamTable<'a>, subst: Substituter) -> Self {
        Self { symbols, scope, subst }
    }

    pub fn is_subtype(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        self.walk(sub, sup, 0)
    }

    /// Either direction.
    pub fn related(&self, a: &TypeRef, b: &TypeRef) -> bool {
        self.is_subtype(a, b) || self.is_subtype(b, a)
    }

    fn walk(&self, sub: &TypeRef, sup: &TypeRef, depth: usize) -> bool {
        if sub == sup {
            return true;
        }
        // bounds a cyclic declaration graph
        if depth > self.subst.max_depth() {
            return false;
        }
        match &**sub {
            TypeExpr::Param { name } => {
                let bound = self.scope.find(name)
                    .and_then(|(p, _)| p.bound.clone())
                    .unwrap_or_else(|| TypeExpr::simple(OBJECT));
                return self.walk(&bound, sup, depth + 1);
            }
            TypeExpr::Named { name, .. } if prelude::is_primitive(name) => return false,
            TypeExpr::Named { .. } => {}
        }
        if matches!(&**sup, TypeExpr::Named { name, args } if name == OBJECT && args.is_empty()) {
            return true;
        }

        let Some(class) = self.symbols.class(sub.name()) else {
            return false;
        };
        let bindings = bindings_for(&class.decl().type_params, sub.args());
        class.decl().direct_ancestors().any(|(_, ancestor)| {
            self.subst.apply(&ancestor.node, &bindings)
                .map(|inst| self.walk(&inst, sup, depth + 1))
                .unwrap_or(false)
        })
    }
}
