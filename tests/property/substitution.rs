//! Property-based tests for type substitution.
//!
//! Generated type trees are substituted with generated bindings and the
//! results are checked against the structural rules substitution must keep.

use std::sync::Arc;

use overcheck::ast::{TypeExpr, TypeRef};
use overcheck::typeck::subst::{substitute, Bindings, Substituter};
use proptest::prelude::*;

const PARAMS: [&str; 3] = ["T", "U", "V"];

fn arb_class_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Box".to_string()),
        Just("Pair".to_string()),
        Just("Long".to_string()),
        Just("String".to_string()),
    ]
}

fn arb_param() -> impl Strategy<Value = TypeRef> {
    prop::sample::select(PARAMS.to_vec()).prop_map(|p| TypeExpr::param(p))
}

/// Type trees without parameters.
fn arb_ground() -> impl Strategy<Value = TypeRef> {
    arb_class_name()
        .prop_map(|n| TypeExpr::simple(n))
        .prop_recursive(3, 12, 2, |inner| {
            (arb_class_name(), prop::collection::vec(inner, 1..3))
                .prop_map(|(name, args)| TypeExpr::named(name, args))
        })
}

/// Type trees that may mention `T`, `U` and `V`.
fn arb_type() -> impl Strategy<Value = TypeRef> {
    prop_oneof![arb_class_name().prop_map(|n| TypeExpr::simple(n)), arb_param()]
        .prop_recursive(4, 24, 3, |inner| {
            (arb_class_name(), prop::collection::vec(inner, 1..4))
                .prop_map(|(name, args)| TypeExpr::named(name, args))
        })
}

fn arb_bindings() -> impl Strategy<Value = Bindings> {
    prop::collection::vec(arb_ground(), 3).prop_map(|values| {
        PARAMS.iter().map(|p| p.to_string()).zip(values).collect()
    })
}

fn mentions(ty: &TypeExpr, param: &str) -> bool {
    match ty {
        TypeExpr::Param { name } => name == param,
        TypeExpr::Named { args, .. } => args.iter().any(|a| mentions(a, param)),
    }
}

proptest! {
    /// Property: no bindings means the very same tree comes back
    #[test]
    fn empty_bindings_are_identity(ty in arb_type()) {
        let out = substitute(&ty, &Bindings::new()).unwrap();
        prop_assert!(Arc::ptr_eq(&ty, &out));
    }

    /// Property: a tree without parameters is shared, whatever the bindings
    #[test]
    fn ground_types_are_untouched(ty in arb_ground(), bindings in arb_bindings()) {
        let out = substitute(&ty, &bindings).unwrap();
        prop_assert!(Arc::ptr_eq(&ty, &out));
    }

    /// Property: binding every parameter to a ground type leaves no parameter behind
    #[test]
    fn full_bindings_eliminate_parameters(ty in arb_type(), bindings in arb_bindings()) {
        let out = substitute(&ty, &bindings).unwrap();
        prop_assert!(!out.mentions_param());
    }

    /// Property: substituting twice is the same as substituting once
    #[test]
    fn substitution_is_idempotent(ty in arb_type(), bindings in arb_bindings()) {
        let once = substitute(&ty, &bindings).unwrap();
        let twice = substitute(&once, &bindings).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: the input tree is never modified
    #[test]
    fn input_is_not_mutated(ty in arb_type(), bindings in arb_bindings()) {
        let before = (*ty).clone();
        let _ = substitute(&ty, &bindings);
        prop_assert_eq!(&before, &*ty);
    }

    /// Property: unbound parameters survive and bound ones do not
    #[test]
    fn partial_bindings_keep_unbound(ty in arb_type(), value in arb_ground()) {
        let bindings: Bindings = [("T".to_string(), value)].into_iter().collect();
        let out = substitute(&ty, &bindings).unwrap();
        prop_assert!(!mentions(&out, "T"));
        prop_assert_eq!(mentions(&out, "U"), mentions(&ty, "U"));
        prop_assert_eq!(mentions(&out, "V"), mentions(&ty, "V"));
    }

    /// Property: results deeper than the limit are rejected, others accepted
    #[test]
    fn depth_limit_is_exact(ty in arb_type(), bindings in arb_bindings(), limit in 1usize..8) {
        let unlimited = substitute(&ty, &bindings).unwrap();
        let limited = Substituter::new(limit).apply(&ty, &bindings);
        if unlimited.depth() <= limit && ty.depth() <= limit {
            prop_assert_eq!(limited.unwrap(), unlimited);
        } else {
            prop_assert!(limited.is_err());
        }
    }
}
