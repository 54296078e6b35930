use std::collections::HashMap;

use crate::ast::{TypeParam, TypeRef};
use crate::diagnostics::CheckError;
use crate::span::Span;

/// Type parameters declared by one generic scope (a class, or a generic
/// method inside it). Child tables shadow their parent.
#[derive(Debug, Clone)]
pub struct ParamTable<'p> {
    scope: String,
    parent: Option<&'p ParamTable<'p>>,
    params: Vec<TypeParam>,
    index: HashMap<String, usize>,
}

impl ParamTable<'static> {
    pub fn root(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), parent: None, params: Vec::new(), index: HashMap::new() }
    }
}

impl<'p> ParamTable<'p> {
    /// A nested scope whose lookups fall back to `self`.
    pub fn child<'c>(&'c self, scope: impl Into<String>) -> ParamTable<'c> {
        ParamTable { scope: scope.into(), parent: Some(self), params: Vec::new(), index: HashMap::new() }
    }

    pub fn declare(&mut self, param: TypeParam) -> Result<(), CheckError> {
        if self.index.contains_key(&param.name.node) {
            return Err(CheckError::duplicate_parameter(param.name.node.clone(), param.name.span));
        }
        self.index.insert(param.name.node.clone(), self.params.len());
        self.params.push(param);
        Ok(())
    }

    /// Replace the bound of a parameter declared in this scope.
    pub fn set_bound(&mut self, name: &str, bound: Option<TypeRef>) {
        if let Some(&i) = self.index.get(name) {
            self.params[i].bound = bound;
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&TypeParam, CheckError> {
        self.find(name)
            .map(|(p, _)| p)
            .ok_or_else(|| CheckError::unknown_parameter(name, Span::dummy()))
    }

    /// The parameter and the name of the scope that declares it.
    pub fn find(&self, name: &str) -> Option<(&TypeParam, &str)> {
        let mut table = Some(self);
        while let Some(t) = table {
            if let Some(&i) = t.index.get(name) {
                return Some((&t.params[i], t.scope.as_str()));
            }
            table = t.parent;
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Parameters of this scope only, in declaration order.
    pub fn params(&self) -> &[TypeParam] {
        &self.params
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}
