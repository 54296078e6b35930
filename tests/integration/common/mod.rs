#![allow(dead_code)]

use std::process::Command;

use overcheck::ast::{ClassDecl, CompilationUnit, MemberDecl, MemberSignature, TypeExpr, TypeParam, TypeRef};
use overcheck::config::CheckerConfig;
use overcheck::diagnostics::{Diagnostic, DiagnosticKind};
use overcheck::typeck::{Checker, ClassReport};

pub fn overcheck() -> Command {
    Command::new(env!("CARGO_BIN_EXE_overcheck"))
}

pub fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

pub fn ty(name: &str) -> TypeRef {
    TypeExpr::simple(name)
}

pub fn generic(name: &str, args: &[TypeRef]) -> TypeRef {
    TypeExpr::named(name, args.to_vec())
}

pub fn param(name: &str) -> TypeRef {
    TypeExpr::param(name)
}

pub fn type_params(names: &[&str]) -> Vec<TypeParam> {
    names.iter().map(|n| TypeParam::new(*n, None)).collect()
}

pub fn method(name: &str, params: &[TypeRef], ret: TypeRef) -> MemberDecl {
    MemberDecl::new(MemberSignature::method(name, params.to_vec(), ret))
}

pub fn abstract_method(name: &str, params: &[TypeRef], ret: TypeRef) -> MemberDecl {
    let mut sig = MemberSignature::method(name, params.to_vec(), ret);
    sig.is_abstract = true;
    MemberDecl::new(sig)
}

pub fn override_method(name: &str, params: &[TypeRef], ret: TypeRef) -> MemberDecl {
    MemberDecl::overriding(MemberSignature::method(name, params.to_vec(), ret))
}

pub fn check(classes: Vec<ClassDecl>, name: &str) -> ClassReport {
    check_with(classes, name, CheckerConfig::default())
}

pub fn check_with(classes: Vec<ClassDecl>, name: &str, config: CheckerConfig) -> ClassReport {
    let checker = Checker::new(&CompilationUnit::new(classes), config);
    checker.check_class(name).unwrap_or_else(|e| panic!("checking {name} failed: {e}"))
}

pub fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

pub fn load_fixture(name: &str) -> CompilationUnit {
    let json = std::fs::read_to_string(fixture_path(name)).unwrap();
    CompilationUnit::from_json(&json).unwrap()
}
