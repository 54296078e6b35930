pub mod span;
pub mod ast;
pub mod diagnostics;
pub mod config;
pub mod prelude;
pub mod typeck;
pub mod fingerprint;

use ast::CompilationUnit;
use config::CheckerConfig;
use diagnostics::DiagnosticSink;
use typeck::{Checker, UnitReport};

/// Check every class of `unit` (bind → resolve hierarchy → check overrides),
/// sending the ordered diagnostics to `sink`.
pub fn check_unit(unit: &CompilationUnit, config: CheckerConfig, sink: &mut dyn DiagnosticSink) -> UnitReport {
    let checker = Checker::new(unit, config);
    checker.check_unit(sink)
}

/// Like [`check_unit`], but classes are checked on worker threads. The sink
/// sees the same sequence either way.
pub fn check_unit_parallel(unit: &CompilationUnit, config: CheckerConfig, sink: &mut dyn DiagnosticSink) -> UnitReport {
    let checker = Checker::new(unit, config);
    checker.check_unit_parallel(sink)
}
