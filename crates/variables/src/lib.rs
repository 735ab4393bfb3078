//! Variable-set binding for XBRL formula rules.
//!
//! An [`Evaluator`] walks the variables of a [`VariableSet`] in dependency
//! order and hands every valid combination of bound values to a
//! [`ResultSink`]. Fact variables draw candidates from an
//! [`Instance`](xformula_model::Instance) through a [`BindingResolver`];
//! sequence-bound fact variables are partitioned by their uncovered aspects,
//! and uncovered-aspect facts flow to deeper variables for implicit
//! filtering.
pub mod aspect_facts;
pub mod binding;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod filter;
pub mod matcher;
pub mod options;
pub mod partition;
pub mod plan;
pub mod resolver;
pub mod scope;
pub mod sink;
pub mod value;
pub mod variable;

pub use aspect_facts::UncoveredAspectFacts;
pub use binding::{Binding, BindingKind, BoundValue, FactBinding, GeneralBinding, NotBindings, ScopeBinding};
pub use diagnostics::{CollectingDiagnostics, Diagnostic, DiagnosticsSink, Severity, TracingDiagnostics};
pub use environment::{BindingClass, BoundVariable, Environment};
pub use error::EvaluationError;
pub use evaluator::Evaluator;
pub use expression::{Constant, Expression, ExpressionContext, ExpressionError, FnExpression, VariableRef};
pub use filter::{
    ConceptNameFilter, ExplicitDimensionFilter, Filter, FilterUse, GeneralFilter, PeriodFilter, UnitFilter,
};
pub use matcher::{AspectMatcher, StandardAspectMatcher};
pub use options::EvaluatorOptions;
pub use partition::Partitioner;
pub use plan::plan_order;
pub use resolver::{BindingResolver, InstanceResolver, ResolveContext};
pub use scope::{ScopeEvaluation, ScopeRecorder, ScopeResults};
pub use sink::{CollectingSink, ResultSink};
pub use value::{AtomicValue, Item, Sequence};
pub use variable::{
    FactVariable, GeneralVariable, Parameter, RuleKind, ScopeImport, Variable, VariableKind, VariableSet,
};
