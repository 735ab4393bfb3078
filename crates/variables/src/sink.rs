use crate::environment::Environment;
use crate::error::EvaluationError;

/// Receiver of complete binding combinations.
pub trait ResultSink {
    /// Called once per combination, in evaluation order.
    fn evaluate_result(&mut self, environment: &Environment) -> Result<(), EvaluationError>;

    /// Called for existence assertions when a variable has neither facts nor a fallback.
    fn evaluation_not_satisfied(&mut self, _environment: &Environment) -> Result<(), EvaluationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub results: Vec<Environment>,
    pub not_satisfied: usize,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultSink for CollectingSink {
    fn evaluate_result(&mut self, environment: &Environment) -> Result<(), EvaluationError> {
        self.results.push(environment.clone());
        Ok(())
    }

    fn evaluation_not_satisfied(&mut self, _environment: &Environment) -> Result<(), EvaluationError> {
        self.not_satisfied += 1;
        Ok(())
    }
}
