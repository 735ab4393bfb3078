//! Depth-first search over variable bindings.
//!
//! [`Evaluator::evaluate_variables`] binds the head of the ordered variable
//! list, iterates over its values and recurses on the tail. Every frame gets
//! its own copies of the environment, the fallback bindings and the ambient
//! uncovered-aspect facts, so nothing a deeper frame does is visible after it
//! returns.
use crate::aspect_facts::UncoveredAspectFacts;
use crate::binding::{Binding, BindingKind, NotBindings};
use crate::diagnostics::{self, Diagnostic, DiagnosticsSink, TracingDiagnostics};
use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::expression::ExpressionContext;
use crate::matcher::{AspectMatcher, StandardAspectMatcher};
use crate::options::EvaluatorOptions;
use crate::partition::Partitioner;
use crate::plan::plan_order;
use crate::resolver::{BindingResolver, ResolveContext};
use crate::sink::ResultSink;
use crate::variable::{RuleKind, Variable, VariableSet};
use tracing::{debug, debug_span, trace};
use xformula_model::{Instance, QName};

static TRACING_DIAGNOSTICS: TracingDiagnostics = TracingDiagnostics;

pub struct Evaluator<'a> {
    instance: &'a Instance,
    variables: &'a VariableSet,
    resolver: &'a dyn BindingResolver,
    matcher: Option<&'a dyn AspectMatcher>,
    standard_matcher: StandardAspectMatcher,
    diagnostics: &'a dyn DiagnosticsSink,
    options: EvaluatorOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(instance: &'a Instance, variables: &'a VariableSet, resolver: &'a dyn BindingResolver) -> Self {
        Self {
            instance,
            variables,
            resolver,
            matcher: None,
            standard_matcher: StandardAspectMatcher::default(),
            diagnostics: &TRACING_DIAGNOSTICS,
            options: EvaluatorOptions::default(),
        }
    }

    /// Replaces the [`StandardAspectMatcher`] used for partitioning and the
    /// compatibility guard.
    pub fn with_matcher(mut self, matcher: &'a dyn AspectMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &'a dyn DiagnosticsSink) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_options(mut self, options: EvaluatorOptions) -> Self {
        self.standard_matcher = StandardAspectMatcher::new(options.aspect_model());
        self.options = options;
        self
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    fn matcher(&self) -> &dyn AspectMatcher {
        match self.matcher {
            Some(matcher) => matcher,
            None => &self.standard_matcher,
        }
    }

    /// Evaluates the whole variable set, feeding every combination to `sink`.
    ///
    /// Returns `Ok(false)` when a variable could not be resolved; the reason
    /// has been reported to the diagnostics sink.
    pub fn evaluate(&self, sink: &mut dyn ResultSink) -> Result<bool, EvaluationError> {
        let span = debug_span!("evaluate", rule = %self.variables.name);
        let _guard = span.enter();
        let order = match self.options.order() {
            Some(order) => order.to_vec(),
            None => plan_order(self.variables)?,
        };
        let environment = Environment::with_parameters(self.options.parameters().clone());
        let ok = self.evaluate_variables(&order, &NotBindings::new(), None, &environment, sink)?;
        debug!(ok, variables = order.len(), "evaluation finished");
        Ok(ok)
    }

    /// Binds `ordered[0]` and recurses on the rest.
    ///
    /// `Ok(true)` only means no variable failed to resolve; it says nothing
    /// about how many combinations reached the sink.
    pub fn evaluate_variables(
        &self,
        ordered: &[QName],
        not_bindings: &NotBindings,
        ambient: Option<&UncoveredAspectFacts>,
        environment: &Environment,
        sink: &mut dyn ResultSink,
    ) -> Result<bool, EvaluationError> {
        let Some((head, rest)) = ordered.split_first() else {
            sink.evaluate_result(environment)?;
            return Ok(true);
        };
        let Some(variable) = self.variables.get(head) else {
            self.diagnostics.report(
                Diagnostic::error(diagnostics::UNKNOWN_VARIABLE, "variable is not declared by the rule")
                    .with_detail("variable", head)
                    .with_detail("rule", &self.variables.name),
            );
            return Ok(false);
        };

        let ctx = ResolveContext {
            instance: self.instance,
            ambient,
            environment,
            not_bindings,
            options: &self.options,
        };
        let Some(mut binding) = self.resolver.resolve(variable, &ctx)? else {
            self.diagnostics.report(
                Diagnostic::error(diagnostics::NO_BINDING, "no binding could be produced for variable")
                    .with_detail("variable", head)
                    .with_detail("rule", &self.variables.name),
            );
            return Ok(false);
        };
        if variable.bind_as_sequence && matches!(binding.kind(), BindingKind::Fact(_)) {
            binding.partition(variable, &Partitioner::new(self.instance, self.matcher(), self.diagnostics));
        }
        trace!(variable = %head, values = binding.values().len(), remaining = rest.len(), "variable bound");

        if rest.is_empty() {
            self.bind_last(variable, binding, ambient, environment, sink)
        } else {
            self.bind_and_recurse(variable, binding, rest, not_bindings, ambient, environment, sink)
        }
    }

    fn bind_last(
        &self,
        variable: &Variable,
        mut binding: Binding,
        ambient: Option<&UncoveredAspectFacts>,
        environment: &Environment,
        sink: &mut dyn ResultSink,
    ) -> Result<bool, EvaluationError> {
        if binding.has_values() {
            while binding.advance() {
                if !self.compatible(variable, ambient, &binding) {
                    continue;
                }
                sink.evaluate_result(&extend(environment, &binding))?;
            }
        } else if self.try_fallback(variable, &mut binding, environment, false)? {
            binding.advance();
            sink.evaluate_result(&extend(environment, &binding))?;
        } else if self.variables.kind == RuleKind::ExistenceAssertion {
            sink.evaluation_not_satisfied(environment)?;
        }
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_and_recurse(
        &self,
        variable: &Variable,
        mut binding: Binding,
        rest: &[QName],
        not_bindings: &NotBindings,
        ambient: Option<&UncoveredAspectFacts>,
        environment: &Environment,
        sink: &mut dyn ResultSink,
    ) -> Result<bool, EvaluationError> {
        let mut recursed = false;
        while binding.advance() {
            if !self.compatible(variable, ambient, &binding) {
                continue;
            }
            recursed = true;
            let propagated = binding.propagate_ambient(ambient);
            let child_env = extend(environment, &binding);
            if !self.evaluate_variables(rest, not_bindings, propagated.as_ref().or(ambient), &child_env, sink)? {
                return Ok(false);
            }
        }
        if recursed {
            return Ok(true);
        }

        let empty = !binding.has_values();
        if self.try_fallback(variable, &mut binding, environment, true)? {
            binding.advance();
            let child_env = extend(environment, &binding);
            let mut child_not_bindings = not_bindings.clone();
            child_not_bindings.insert(variable.name.clone(), binding);
            return self.evaluate_variables(rest, &child_not_bindings, ambient, &child_env, sink);
        }
        if empty && self.variables.kind == RuleKind::ExistenceAssertion {
            sink.evaluation_not_satisfied(environment)?;
        }
        Ok(true)
    }

    fn compatible(&self, variable: &Variable, ambient: Option<&UncoveredAspectFacts>, binding: &Binding) -> bool {
        !self.options.implicit_filtering()
            || self.matcher().match_uncovered_aspects(variable, ambient, binding, self.instance)
    }

    fn try_fallback(
        &self,
        variable: &Variable,
        binding: &mut Binding,
        environment: &Environment,
        force: bool,
    ) -> Result<bool, EvaluationError> {
        let ctx = ExpressionContext { instance: self.instance, environment };
        let applied = binding
            .try_fallback(variable, &ctx, force)
            .map_err(|e| EvaluationError::expression(&variable.name, e))?;
        if applied {
            debug!(variable = %variable.name, force, "fallback value bound");
        }
        Ok(applied)
    }
}

/// Copy of `environment` with the binding's current value and, for scope
/// imports, the replayed evaluation's variables.
fn extend(environment: &Environment, binding: &Binding) -> Environment {
    environment.import(binding.current_imports()).bind(binding.name(), binding.snapshot())
}
