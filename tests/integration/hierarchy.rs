mod common;

use common::*;
use overcheck::ast::{ClassDecl, CompilationUnit, MemberSignature, TypeParam, MemberDecl};
use overcheck::config::CheckerConfig;
use overcheck::diagnostics::{CheckError, DiagnosticKind, Severity};
use overcheck::typeck::conform::Outcome;
use overcheck::typeck::Checker;

fn member_set(report: &overcheck::typeck::ClassReport) -> Vec<String> {
    report.hierarchy.inherited.iter()
        .flat_map(|(name, bucket)| {
            bucket.candidates.iter().map(move |c| format!("{name} <- {} :: {}", c.origin, c.sig))
        })
        .collect()
}

#[test]
fn bindings_compose_through_three_levels() {
    let report = check(vec![
        ClassDecl::interface("Source")
            .with_type_params(type_params(&["S"]))
            .member(abstract_method("next", &[], param("S"))),
        ClassDecl::class("Pipe")
            .abstract_()
            .with_type_params(type_params(&["A", "B"]))
            .implements(generic("Source", &[param("B")]))
            .member(method("push", &[param("A")], ty("void"))),
        ClassDecl::class("Text")
            .abstract_()
            .with_type_params(type_params(&["X"]))
            .extends(generic("Pipe", &[param("X"), ty("String")])),
        ClassDecl::class("Lines")
            .extends(generic("Text", &[ty("Integer")]))
            .member(override_method("next", &[], ty("String")))
            .member(override_method("push", &[ty("Integer")], ty("void"))),
    ], "Lines");

    assert_eq!(member_set(&report), vec![
        "next <- Source<String> :: next(): String",
        "push <- Pipe<Integer, String> :: push(Integer): void",
    ]);
    assert!(report.verdicts.iter().all(|v| v.outcome == Outcome::Conforms));
    assert!(!report.has_errors());
}

#[test]
fn own_parameters_flow_into_ancestors() {
    let report = check(vec![
        ClassDecl::class("Base")
            .with_type_params(type_params(&["T"]))
            .member(method("put", &[param("T")], ty("void"))),
        ClassDecl::class("Derived")
            .with_type_params(type_params(&["U"]))
            .extends(generic("Base", &[generic("Comparable", &[param("U")])]))
            .member(override_method("put", &[generic("Comparable", &[param("U")])], ty("void"))),
    ], "Derived");

    assert_eq!(report.verdict("put").unwrap().outcome, Outcome::Conforms);
}

#[test]
fn interface_order_does_not_change_members() {
    let decls = |first: &str, second: &str| vec![
        ClassDecl::interface("Named").member(abstract_method("name", &[], ty("String"))),
        ClassDecl::interface("Sized").member(abstract_method("size", &[], ty("int"))),
        ClassDecl::interface("Both").member(abstract_method("name", &[], ty("String"))),
        ClassDecl::class("Thing")
            .abstract_()
            .implements(ty(first))
            .implements(ty(second))
            .implements(ty("Both")),
    ];
    let a = check(decls("Named", "Sized"), "Thing");
    let b = check(decls("Sized", "Named"), "Thing");
    assert_eq!(member_set(&a), member_set(&b));
    assert_eq!(a.hierarchy.inherited, b.hierarchy.inherited);
}

#[test]
fn duplicate_interface_warns_once() {
    let report = check(vec![
        ClassDecl::class("Job")
            .implements(ty("Runnable"))
            .implements(ty("Runnable"))
            .member(override_method("run", &[], ty("void"))),
    ], "Job");

    let warnings: Vec<_> = report.diagnostics.iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::DuplicateInterface);
    assert!(!report.has_errors());
}

#[test]
fn inheritance_cycle_fails_only_its_classes() {
    let unit = CompilationUnit::new(vec![
        ClassDecl::class("A").extends(ty("B")),
        ClassDecl::class("B").extends(ty("A")),
        ClassDecl::class("C").implements(ty("Runnable")).member(override_method("run", &[], ty("void"))),
    ]);
    let checker = Checker::new(&unit, CheckerConfig::default());
    assert!(matches!(checker.check_class("A"), Err(CheckError::CyclicInheritance { .. })));
    assert!(matches!(checker.check_class("B"), Err(CheckError::CyclicInheritance { .. })));
    assert!(checker.check_class("C").is_ok());
}

#[test]
fn self_expanding_supertype_is_a_cycle() {
    let unit = CompilationUnit::new(vec![
        ClassDecl::class("Grow")
            .with_type_params(type_params(&["T"]))
            .extends(generic("Grow", &[generic("Supplier", &[param("T")])])),
    ]);
    let checker = Checker::new(&unit, CheckerConfig::default());
    assert!(matches!(checker.check_class("Grow"), Err(CheckError::CyclicInheritance { .. })));
}

#[test]
fn deep_substitution_is_reported_at_the_member() {
    let config = CheckerConfig { max_type_depth: 3, ..CheckerConfig::default() };
    let report = check_with(vec![
        ClassDecl::interface("Wrap")
            .with_type_params(type_params(&["T"]))
            .member(method("get", &[], generic("Supplier", &[generic("Supplier", &[param("T")])])))
            .member(method("size", &[], ty("int"))),
        ClassDecl::class("Deep").implements(generic("Wrap", &[generic("Supplier", &[ty("Long")])])),
    ], "Deep", config);

    let cyclic: Vec<_> = report.diagnostics.iter()
        .filter(|d| d.kind == DiagnosticKind::CyclicType)
        .collect();
    assert_eq!(cyclic.len(), 1);
    assert_eq!(cyclic[0].member.as_deref(), Some("get"));
    assert!(report.hierarchy.bucket("get").is_none());
    assert!(report.hierarchy.bucket("size").is_some());
}

#[test]
fn type_argument_outside_bound() {
    let report = check(vec![
        ClassDecl::class("Stats").with_type_params(vec![TypeParam::new("N", Some(ty("Number")))]),
        ClassDecl::class("Good").extends(generic("Stats", &[ty("Long")])),
        ClassDecl::class("Bad").extends(generic("Stats", &[ty("String")])),
    ], "Bad");
    assert_eq!(kinds(&report.diagnostics), vec![DiagnosticKind::BoundViolation]);

    let good = check(vec![
        ClassDecl::class("Stats").with_type_params(vec![TypeParam::new("N", Some(ty("Number")))]),
        ClassDecl::class("Good").extends(generic("Stats", &[ty("Long")])),
    ], "Good");
    assert!(good.diagnostics.is_empty());
}

#[test]
fn recursive_bound_accepts_self_comparable() {
    let report = check(vec![
        ClassDecl::class("Sorted").with_type_params(vec![
            TypeParam::new("T", Some(generic("Comparable", &[param("T")]))),
        ]),
        ClassDecl::class("Names").extends(generic("Sorted", &[ty("String")])),
    ], "Names");
    assert!(report.diagnostics.is_empty());
}

#[test]
fn abstract_members_must_be_implemented() {
    let report = check(vec![
        ClassDecl::class("Shape")
            .abstract_()
            .member(abstract_method("area", &[], ty("double")))
            .member(method("name", &[], ty("String"))),
        ClassDecl::class("Square").extends(ty("Shape")),
    ], "Square");
    assert_eq!(kinds(&report.diagnostics), vec![DiagnosticKind::UnimplementedAbstractMember]);
    assert_eq!(report.diagnostics[0].message, "'Square' must implement 'area(): double' from 'Shape'");
}

#[test]
fn generic_method_override() {
    let mut inherited = MemberSignature::method("convert", vec![param("I")], generic("Supplier", &[param("O")]));
    inherited.type_params.push(TypeParam::new("O", None));
    let mut declared = MemberSignature::method("convert", vec![ty("Long")], generic("Supplier", &[param("R")]));
    declared.type_params.push(TypeParam::new("R", None));

    let report = check(vec![
        ClassDecl::interface("Converter")
            .with_type_params(type_params(&["I"]))
            .member(MemberDecl::new(inherited)),
        ClassDecl::class("LongConverter")
            .implements(generic("Converter", &[ty("Long")]))
            .member(MemberDecl::overriding(declared)),
    ], "LongConverter");
    assert_eq!(report.verdict("convert").unwrap().outcome, Outcome::Conforms);
}

#[test]
fn generic_method_type_parameter_count_must_match() {
    let mut inherited = MemberSignature::method("wrap", vec![ty("Long")], ty("Long"));
    inherited.type_params.push(TypeParam::new("X", None));
    let report = check(vec![
        ClassDecl::interface("Wrapper").member(MemberDecl::new(inherited)),
        ClassDecl::class("Plain")
            .implements(ty("Wrapper"))
            .member(override_method("wrap", &[ty("Long")], ty("Long"))),
    ], "Plain");
    let verdict = report.verdict("wrap").unwrap();
    assert_eq!(verdict.outcome, Outcome::TypeMismatch);
    assert!(verdict.detail.contains("type parameter"));
}
