pub mod batch;
pub mod bind;
pub mod conform;
pub mod hierarchy;
pub mod params;
pub mod subst;
pub mod subtype;

use serde::Serialize;

use crate::ast::CompilationUnit;
use crate::config::CheckerConfig;
use crate::diagnostics::{CheckError, Diagnostic, DiagnosticSink};
use crate::span::Span;
use bind::{BoundClass, SymbolTable, UnitEntry};
use conform::{ConformanceVerdict, OverrideChecker};
use hierarchy::{HierarchyResolver, ResolvedHierarchy};

/// Everything the checker produced for one class that bound successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    pub hierarchy: ResolvedHierarchy,
    pub verdicts: Vec<ConformanceVerdict>,
    /// Hierarchy diagnostics, then one per verdict, then missing
    /// implementations.
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn verdict(&self, member: &str) -> Option<&ConformanceVerdict> {
        self.verdicts.iter().find(|v| v.member == member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOutcome {
    pub name: String,
    pub result: Result<ClassReport, CheckError>,
}

impl ClassOutcome {
    /// The records this class contributes to the sink, in order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match &self.result {
            Ok(report) => report.diagnostics.clone(),
            Err(e) => vec![e.to_diagnostic(&self.name)],
        }
    }

    pub fn has_errors(&self) -> bool {
        match &self.result {
            Ok(report) => report.has_errors(),
            Err(_) => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitReport {
    pub outcomes: Vec<ClassOutcome>,
}

impl UnitReport {
    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(ClassOutcome::has_errors)
    }

    pub fn outcome(&self, name: &str) -> Option<&ClassOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.outcomes.iter().flat_map(ClassOutcome::diagnostics).collect()
    }
}

/// Read-only checking context for one compilation unit.
#[derive(Debug)]
pub struct Checker {
    symbols: SymbolTable,
    config: CheckerConfig,
}

impl Checker {
    pub fn new(unit: &CompilationUnit, config: CheckerConfig) -> Self {
        let symbols = SymbolTable::build(unit, &config);
        tracing::debug!(classes = unit.classes.len(), package = ?unit.package, "built symbol table");
        Self { symbols, config }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    fn lookup(&self, name: &str) -> Result<&BoundClass, CheckError> {
        match self.symbols.get(name) {
            Some(Ok(class)) => Ok(class.as_ref()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(CheckError::unresolved_name(name, Span::dummy())),
        }
    }

    /// Resolve the inherited member set of any visible declaration.
    pub fn resolve(&self, name: &str) -> Result<ResolvedHierarchy, CheckError> {
        let class = self.lookup(name)?;
        HierarchyResolver::new(&self.symbols).resolve(class)
    }

    pub fn check_class(&self, name: &str) -> Result<ClassReport, CheckError> {
        let class = self.lookup(name)?;
        self.check_bound(class)
    }

    fn check_bound(&self, class: &BoundClass) -> Result<ClassReport, CheckError> {
        let hierarchy = HierarchyResolver::new(&self.symbols).resolve(class)?;
        let checker = OverrideChecker::new(&self.symbols, &self.config);
        let verdicts = checker.check(class, &hierarchy);

        let mut diagnostics = hierarchy.diagnostics.clone();
        diagnostics.extend(verdicts.iter().map(|v| v.to_diagnostic(class.name())));
        if self.config.require_abstract_implementations {
            diagnostics.extend(checker.unimplemented_abstract(class, &hierarchy));
        }
        Ok(ClassReport { hierarchy, verdicts, diagnostics })
    }

    fn check_entry(&self, entry: &UnitEntry) -> ClassOutcome {
        let result = match &entry.result {
            Ok(class) => self.check_bound(class),
            Err(e) => Err(e.clone()),
        };
        if let Err(e) = &result {
            tracing::debug!(class = %entry.name, error = %e, "class failed");
        }
        ClassOutcome { name: entry.name.clone(), result }
    }

    /// Check every class of the unit in declaration order.
    pub fn check_unit(&self, sink: &mut dyn DiagnosticSink) -> UnitReport {
        let outcomes = self.symbols.unit_classes().iter()
            .map(|entry| self.check_entry(entry))
            .collect();
        Self::emit_all(outcomes, sink)
    }

    /// Same records in the same order as [`Checker::check_unit`], with the
    /// classes checked on `jobs` worker threads.
    pub fn check_unit_parallel(&self, sink: &mut dyn DiagnosticSink) -> UnitReport {
        let jobs = self.config.effective_jobs();
        tracing::debug!(jobs, classes = self.symbols.unit_classes().len(), "checking unit in parallel");
        let outcomes = batch::run_ordered(self.symbols.unit_classes(), jobs, |entry| self.check_entry(entry));
        Self::emit_all(outcomes, sink)
    }

    fn emit_all(outcomes: Vec<ClassOutcome>, sink: &mut dyn DiagnosticSink) -> UnitReport {
        for outcome in &outcomes {
            for d in outcome.diagnostics() {
                sink.emit(d);
            }
        }
        UnitReport { outcomes }
    }
}
