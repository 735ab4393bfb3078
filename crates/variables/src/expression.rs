//! Narrow expression contract used for general variables, parameters,
//! fallback values and scope result values.
//!
//! The evaluator never parses expressions; callers plug in any compiled form
//! through [`Expression`]. [`Constant`], [`VariableRef`] and [`FnExpression`]
//! cover the cases the evaluator itself and its tests need.
use crate::environment::Environment;
use crate::value::Sequence;
use core::fmt;
use std::sync::Arc;
use thiserror::Error;
use xformula_model::{Instance, QName};

/// Namespace of W3C XPath/XQuery error codes.
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct ExpressionError {
    pub code: QName,
    pub message: String,
}

impl ExpressionError {
    pub fn new(code: QName, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Error with a code in the `err:` namespace, e.g. `XPST0008`.
    pub fn xqt(local: &str, message: impl Into<String>) -> Self {
        Self::new(QName::prefixed("err", ERR_NS, local), message)
    }

    pub fn undefined_variable(name: &QName) -> Self {
        Self::xqt("XPST0008", format!("variable ${name} is not in scope"))
    }
}

/// What an expression can see while it runs.
pub struct ExpressionContext<'a> {
    pub instance: &'a Instance,
    pub environment: &'a Environment,
}

pub trait Expression: fmt::Debug + Send + Sync {
    fn evaluate(&self, ctx: &ExpressionContext<'_>) -> Result<Sequence, ExpressionError>;
}

/// Expression yielding a fixed sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant(pub Sequence);

impl Expression for Constant {
    fn evaluate(&self, _ctx: &ExpressionContext<'_>) -> Result<Sequence, ExpressionError> {
        Ok(self.0.clone())
    }
}

/// `$name`: the current value of a bound variable or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef(pub QName);

impl Expression for VariableRef {
    fn evaluate(&self, ctx: &ExpressionContext<'_>) -> Result<Sequence, ExpressionError> {
        ctx.environment.value_of(&self.0).ok_or_else(|| ExpressionError::undefined_variable(&self.0))
    }
}

type EvalFn = dyn Fn(&ExpressionContext<'_>) -> Result<Sequence, ExpressionError> + Send + Sync;

/// Closure-backed expression.
#[derive(Clone)]
pub struct FnExpression {
    label: String,
    func: Arc<EvalFn>,
}

impl FnExpression {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ExpressionContext<'_>) -> Result<Sequence, ExpressionError> + Send + Sync + 'static,
    {
        Self { label: label.into(), func: Arc::new(f) }
    }
}

impl fmt::Debug for FnExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnExpression").field(&self.label).finish()
    }
}

impl Expression for FnExpression {
    fn evaluate(&self, ctx: &ExpressionContext<'_>) -> Result<Sequence, ExpressionError> {
        (self.func)(ctx)
    }
}
