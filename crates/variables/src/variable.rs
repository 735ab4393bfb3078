use crate::expression::Expression;
use crate::filter::{Filter, FilterUse};
use std::collections::HashMap;
use std::sync::Arc;
use xformula_model::QName;

#[derive(Debug, Clone)]
pub struct FactVariable {
    pub filters: Vec<FilterUse>,
    /// Keep aspect-matched facts together as one sequence value.
    pub matches: bool,
    pub nils: bool,
    pub implicit_filtering: bool,
}

impl Default for FactVariable {
    fn default() -> Self {
        Self { filters: Vec::new(), matches: false, nils: false, implicit_filtering: true }
    }
}

impl FactVariable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(self, filter: impl Filter + 'static) -> Self {
        self.filter_use(FilterUse::new(filter))
    }

    pub fn filter_use(mut self, filter: FilterUse) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(mut self, matches: bool) -> Self {
        self.matches = matches;
        self
    }

    pub fn nils(mut self, nils: bool) -> Self {
        self.nils = nils;
        self
    }

    pub fn implicit_filtering(mut self, enabled: bool) -> Self {
        self.implicit_filtering = enabled;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GeneralVariable {
    pub select: Arc<dyn Expression>,
}

#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub select: Option<Arc<dyn Expression>>,
    pub required: bool,
}

/// Replays the recorded evaluations of another rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeImport {
    pub source: QName,
}

#[derive(Debug, Clone)]
pub enum VariableKind {
    Fact(FactVariable),
    General(GeneralVariable),
    Parameter(Parameter),
    ScopeImport(ScopeImport),
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: QName,
    pub bind_as_sequence: bool,
    pub fallback: Option<Arc<dyn Expression>>,
    pub depends_on: Vec<QName>,
    pub kind: VariableKind,
}

impl Variable {
    fn with_kind(name: QName, kind: VariableKind) -> Self {
        Self { name, bind_as_sequence: false, fallback: None, depends_on: Vec::new(), kind }
    }

    pub fn fact(name: QName, fact: FactVariable) -> Self {
        Self::with_kind(name, VariableKind::Fact(fact))
    }

    pub fn general(name: QName, select: impl Expression + 'static) -> Self {
        Self::with_kind(name, VariableKind::General(GeneralVariable { select: Arc::new(select) }))
    }

    /// Parameters always bind their whole value as one sequence.
    pub fn parameter(name: QName, parameter: Parameter) -> Self {
        let mut v = Self::with_kind(name, VariableKind::Parameter(parameter));
        v.bind_as_sequence = true;
        v
    }

    pub fn scope_import(name: QName, source: QName) -> Self {
        Self::with_kind(name, VariableKind::ScopeImport(ScopeImport { source }))
    }

    pub fn bind_as_sequence(mut self, yes: bool) -> Self {
        self.bind_as_sequence = yes;
        self
    }

    pub fn fallback(mut self, expr: impl Expression + 'static) -> Self {
        self.fallback = Some(Arc::new(expr));
        self
    }

    pub fn depends_on(mut self, name: QName) -> Self {
        self.depends_on.push(name);
        self
    }

    pub fn as_fact(&self) -> Option<&FactVariable> {
        match &self.kind {
            VariableKind::Fact(f) => Some(f),
            _ => None,
        }
    }

    /// Explicit matches mode; only fact variables can declare it.
    pub fn matches(&self) -> bool {
        self.as_fact().is_some_and(|f| f.matches)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Formula,
    ValueAssertion,
    ExistenceAssertion,
    ConsistencyAssertion,
    CustomFunction,
}

/// Variable table of one rule, in declaration order.
#[derive(Debug, Clone)]
pub struct VariableSet {
    pub name: QName,
    pub kind: RuleKind,
    variables: Vec<Variable>,
    index: HashMap<QName, usize>,
}

impl VariableSet {
    pub fn new(name: QName, kind: RuleKind) -> Self {
        Self { name, kind, variables: Vec::new(), index: HashMap::new() }
    }

    /// Adds a variable; a later definition with the same name replaces the earlier one in place.
    pub fn add(&mut self, variable: Variable) -> &mut Self {
        match self.index.get(&variable.name) {
            Some(&i) => self.variables[i] = variable,
            None => {
                self.index.insert(variable.name.clone(), self.variables.len());
                self.variables.push(variable);
            }
        }
        self
    }

    pub fn with(mut self, variable: Variable) -> Self {
        self.add(variable);
        self
    }

    pub fn get(&self, name: &QName) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.variables[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
