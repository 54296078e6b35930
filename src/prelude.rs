use std::sync::OnceLock;

use crate::ast::{ClassDecl, CompilationUnit};

const PRELUDE_SOURCE: &str = include_str!("../prelude/core.json");

/// Primitive type names; always visible, never generic, never inherited from.
pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// The implicit top of the reference-type lattice.
pub const OBJECT: &str = "Object";

/// Parsed once on first access, shared by all checkers.
struct PreludeData {
    classes: Vec<ClassDecl>,
}

static PRELUDE: OnceLock<PreludeData> = OnceLock::new();

fn get_prelude() -> &'static PreludeData {
    PRELUDE.get_or_init(|| {
        let unit = CompilationUnit::from_json(PRELUDE_SOURCE).expect("prelude must parse");
        PreludeData { classes: unit.classes }
    })
}

/// Built-in declarations in their declared order.
pub fn prelude_classes() -> &'static [ClassDecl] {
    &get_prelude().classes
}

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}
