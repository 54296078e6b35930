mod common;

use common::*;
use overcheck::ast::{ClassDecl, CompilationUnit};
use overcheck::config::CheckerConfig;
use overcheck::diagnostics::{Diagnostic, NullSink};
use overcheck::fingerprint::{fingerprint_outcome, fingerprint_unit};
use overcheck::typeck::Checker;

/// A unit with a mix of conforming, failing and unresolvable classes.
fn wide_unit(n: usize) -> CompilationUnit {
    let mut classes = vec![
        ClassDecl::class("Base")
            .with_type_params(type_params(&["T"]))
            .member(method("get", &[], param("T")))
            .member(method("put", &[param("T")], ty("void"))),
    ];
    for i in 0..n {
        let class = match i % 4 {
            0 => ClassDecl::class(format!("C{i}"))
                .extends(generic("Base", &[ty("Integer")]))
                .member(override_method("get", &[], ty("Integer"))),
            1 => ClassDecl::class(format!("C{i}"))
                .extends(generic("Base", &[ty("Long")]))
                .member(override_method("put", &[ty("Integer")], ty("void"))),
            2 => ClassDecl::class(format!("C{i}"))
                .implements(ty("Runnable"))
                .member(override_method("run", &[ty("int")], ty("void"))),
            _ => ClassDecl::class(format!("C{i}")).extends(ty("Nowhere")),
        };
        classes.push(class);
    }
    CompilationUnit::new(classes)
}

#[test]
fn parallel_sink_sequence_matches_sequential() {
    let unit = wide_unit(64);
    for jobs in [1, 2, 3, 8] {
        let checker = Checker::new(&unit, CheckerConfig { jobs, ..CheckerConfig::default() });
        let mut sequential: Vec<Diagnostic> = Vec::new();
        let mut parallel: Vec<Diagnostic> = Vec::new();
        let a = checker.check_unit(&mut sequential);
        let b = checker.check_unit_parallel(&mut parallel);
        assert_eq!(sequential, parallel, "jobs = {jobs}");
        assert_eq!(a, b);
    }
}

#[test]
fn outcomes_are_in_declaration_order() {
    let unit = wide_unit(16);
    let checker = Checker::new(&unit, CheckerConfig { jobs: 4, ..CheckerConfig::default() });
    let report = checker.check_unit_parallel(&mut NullSink);
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.clone()).collect();
    let expected: Vec<_> = unit.classes.iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, expected);
}

#[test]
fn repeated_runs_have_equal_fingerprints() {
    let unit = wide_unit(24);
    let checker = Checker::new(&unit, CheckerConfig { jobs: 4, ..CheckerConfig::default() });
    let first = checker.check_unit_parallel(&mut NullSink);
    let second = checker.check_unit(&mut NullSink);
    assert_eq!(fingerprint_unit(&first), fingerprint_unit(&second));
    for (a, b) in first.outcomes.iter().zip(&second.outcomes) {
        assert_eq!(fingerprint_outcome(a), fingerprint_outcome(b));
    }

    let rebuilt = Checker::new(&unit, CheckerConfig::default());
    assert_eq!(fingerprint_unit(&first), fingerprint_unit(&rebuilt.check_unit(&mut NullSink)));
}

#[test]
fn library_entry_points_agree() {
    let unit = wide_unit(12);
    let mut a: Vec<Diagnostic> = Vec::new();
    let mut b: Vec<Diagnostic> = Vec::new();
    overcheck::check_unit(&unit, CheckerConfig::default(), &mut a);
    overcheck::check_unit_parallel(&unit, CheckerConfig { jobs: 3, ..CheckerConfig::default() }, &mut b);
    assert_eq!(a, b);
    assert!(!a.is_empty());
}
