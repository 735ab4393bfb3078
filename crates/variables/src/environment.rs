use crate::aspect_facts::UncoveredAspectFacts;
use crate::value::Sequence;
use std::collections::HashMap;
use xformula_model::{AspectSet, QName};

/// Which binding environment a variable was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingClass {
    Fact,
    General,
    Scope,
}

/// Snapshot of one variable's binding at the moment it was bound.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundVariable {
    pub class: BindingClass,
    pub value: Sequence,
    pub is_fallback: bool,
    pub aspects_covered: AspectSet,
    pub uncovered: UncoveredAspectFacts,
}

/// Variable environment visible to one evaluation frame.
///
/// Frames never share an environment: [`Environment::bind`] and
/// [`Environment::import`] return extended copies.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    parameters: HashMap<QName, Sequence>,
    fact_variables: HashMap<QName, BoundVariable>,
    general_variables: HashMap<QName, BoundVariable>,
    scope_variables: HashMap<QName, BoundVariable>,
    imported: HashMap<QName, Sequence>,
    order: Vec<QName>,
}

impl Environment {
    pub fn with_parameters(parameters: HashMap<QName, Sequence>) -> Self {
        Self { parameters, ..Self::default() }
    }

    /// Copy of `self` with `name` bound, routed by binding class.
    pub fn bind(&self, name: &QName, bound: BoundVariable) -> Environment {
        let mut env = self.clone();
        let target = match bound.class {
            BindingClass::Fact => &mut env.fact_variables,
            BindingClass::General => &mut env.general_variables,
            BindingClass::Scope => &mut env.scope_variables,
        };
        if target.insert(name.clone(), bound).is_none() {
            env.order.push(name.clone());
        }
        env
    }

    /// Copy of `self` exposing another rule's variables.
    pub fn import(&self, variables: &[(QName, Sequence)]) -> Environment {
        let mut env = self.clone();
        for (name, value) in variables {
            env.imported.insert(name.clone(), value.clone());
        }
        env
    }

    pub fn parameter(&self, name: &QName) -> Option<&Sequence> {
        self.parameters.get(name)
    }

    pub fn fact_variable(&self, name: &QName) -> Option<&BoundVariable> {
        self.fact_variables.get(name)
    }

    pub fn general_variable(&self, name: &QName) -> Option<&BoundVariable> {
        self.general_variables.get(name)
    }

    pub fn scope_variable(&self, name: &QName) -> Option<&BoundVariable> {
        self.scope_variables.get(name)
    }

    pub fn imported(&self, name: &QName) -> Option<&Sequence> {
        self.imported.get(name)
    }

    pub fn binding(&self, name: &QName) -> Option<&BoundVariable> {
        self.fact_variables
            .get(name)
            .or_else(|| self.general_variables.get(name))
            .or_else(|| self.scope_variables.get(name))
    }

    /// Value of a bound variable, an imported variable or a parameter, in that order.
    pub fn value_of(&self, name: &QName) -> Option<Sequence> {
        if let Some(b) = self.binding(name) {
            return Some(b.value.clone());
        }
        self.imported.get(name).or_else(|| self.parameters.get(name)).cloned()
    }

    /// Names of bound variables in binding order.
    pub fn bound_names(&self) -> &[QName] {
        &self.order
    }
}
