//! Recording and replay of per-evaluation results for scope imports.
use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::expression::{Expression, ExpressionContext};
use crate::sink::ResultSink;
use crate::value::Sequence;
use std::collections::HashMap;
use std::sync::Arc;
use xformula_model::{Instance, QName};

/// One completed evaluation of a rule: its result value and the variables
/// bound when it was produced, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEvaluation {
    pub value: Sequence,
    pub variables: Vec<(QName, Sequence)>,
}

/// Recorded evaluations by rule name.
#[derive(Debug, Clone, Default)]
pub struct ScopeResults {
    by_rule: HashMap<QName, Vec<ScopeEvaluation>>,
}

impl ScopeResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: QName, evaluations: Vec<ScopeEvaluation>) {
        self.by_rule.insert(rule, evaluations);
    }

    pub fn get(&self, rule: &QName) -> Option<&[ScopeEvaluation]> {
        self.by_rule.get(rule).map(Vec::as_slice)
    }
}

/// Sink evaluating a rule's value expression for every combination.
pub struct ScopeRecorder<'a> {
    rule: QName,
    instance: &'a Instance,
    value: Arc<dyn Expression>,
    evaluations: Vec<ScopeEvaluation>,
}

impl<'a> ScopeRecorder<'a> {
    pub fn new(rule: QName, instance: &'a Instance, value: Arc<dyn Expression>) -> Self {
        Self { rule, instance, value, evaluations: Vec::new() }
    }

    pub fn evaluations(&self) -> &[ScopeEvaluation] {
        &self.evaluations
    }

    /// Registers what was recorded under the rule name.
    pub fn finish(self, results: &mut ScopeResults) {
        results.register(self.rule, self.evaluations);
    }
}

impl ResultSink for ScopeRecorder<'_> {
    fn evaluate_result(&mut self, environment: &Environment) -> Result<(), EvaluationError> {
        let ctx = ExpressionContext { instance: self.instance, environment };
        let value = self.value.evaluate(&ctx).map_err(|e| EvaluationError::expression(&self.rule, e))?;
        let variables = environment
            .bound_names()
            .iter()
            .filter_map(|name| environment.binding(name).map(|b| (name.clone(), b.value.clone())))
            .collect();
        self.evaluations.push(ScopeEvaluation { value, variables });
        Ok(())
    }
}
