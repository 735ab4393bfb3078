use crate::expression::ExpressionError;
use thiserror::Error;
use xformula_model::QName;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("evaluation of variable ${variable} failed: {source}")]
    Expression {
        variable: QName,
        #[source]
        source: ExpressionError,
    },
    #[error("filter of variable ${variable} failed: {source}")]
    Filter {
        variable: QName,
        #[source]
        source: ExpressionError,
    },
    #[error("variable ${0} depends on itself")]
    CyclicDependency(QName),
    #[error("required parameter ${0} has no value")]
    MissingParameter(QName),
}

impl EvaluationError {
    pub fn expression(variable: &QName, source: ExpressionError) -> Self {
        Self::Expression { variable: variable.clone(), source }
    }

    pub fn filter(variable: &QName, source: ExpressionError) -> Self {
        Self::Filter { variable: variable.clone(), source }
    }
}
