//! Production of a fresh [`Binding`] for a variable at one evaluation frame.
use crate::aspect_facts::UncoveredAspectFacts;
use crate::binding::{Binding, NotBindings};
use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::expression::ExpressionContext;
use crate::matcher::StandardAspectMatcher;
use crate::options::EvaluatorOptions;
use crate::scope::ScopeResults;
use crate::variable::{FactVariable, Parameter, Variable, VariableKind};
use tracing::trace;
use xformula_model::{AspectSet, FactId, Instance, QName};

/// State visible to a resolver while it binds one variable.
pub struct ResolveContext<'a> {
    pub instance: &'a Instance,
    pub ambient: Option<&'a UncoveredAspectFacts>,
    pub environment: &'a Environment,
    pub not_bindings: &'a NotBindings,
    pub options: &'a EvaluatorOptions,
}

impl ResolveContext<'_> {
    pub fn expression_context(&self) -> ExpressionContext<'_> {
        ExpressionContext { instance: self.instance, environment: self.environment }
    }
}

pub trait BindingResolver {
    /// `Ok(None)` means the variable cannot be bound at all, which aborts the
    /// evaluation.
    fn resolve(&self, variable: &Variable, ctx: &ResolveContext<'_>) -> Result<Option<Binding>, EvaluationError>;
}

/// Resolver drawing fact candidates from the instance and scope imports from
/// previously recorded rule results.
#[derive(Debug, Clone, Default)]
pub struct InstanceResolver {
    scopes: ScopeResults,
}

impl InstanceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scopes(scopes: ScopeResults) -> Self {
        Self { scopes }
    }

    pub fn scopes(&self) -> &ScopeResults {
        &self.scopes
    }

    fn resolve_fact(
        variable: &Variable,
        fact: &FactVariable,
        ctx: &ResolveContext<'_>,
    ) -> Result<Binding, EvaluationError> {
        let instance = ctx.instance;
        let covered: AspectSet = fact
            .filters
            .iter()
            .filter(|f| f.cover)
            .flat_map(|f| f.filter.aspects_covered(instance))
            .collect();
        let matcher = StandardAspectMatcher::new(ctx.options.aspect_model());
        let ambient = ctx.ambient.filter(|_| fact.implicit_filtering && ctx.options.implicit_filtering());
        let expr_ctx = ctx.expression_context();

        let mut candidates = Vec::new();
        for id in instance.facts() {
            if !fact.nils && instance.is_nil(id) {
                continue;
            }
            if !Self::passes_filters(variable, fact, &expr_ctx, id)? {
                continue;
            }
            if let Some(ambient) = ambient
                && !matcher.compatible(id, ambient, &covered, instance)
            {
                continue;
            }
            candidates.push(id);
        }

        let mut defined = AspectSet::new();
        for &id in &candidates {
            defined.extend(instance.aspects_defined(id, ctx.options.aspect_model()));
        }
        trace!(
            variable = %variable.name,
            candidates = candidates.len(),
            covered = covered.len(),
            "fact variable resolved"
        );
        Ok(Binding::fact(variable, candidates, defined, covered))
    }

    fn passes_filters(
        variable: &Variable,
        fact: &FactVariable,
        ctx: &ExpressionContext<'_>,
        id: FactId,
    ) -> Result<bool, EvaluationError> {
        for filter in &fact.filters {
            if !filter.accepts(ctx, id).map_err(|e| EvaluationError::filter(&variable.name, e))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn resolve_parameter(
        variable: &Variable,
        parameter: &Parameter,
        ctx: &ResolveContext<'_>,
    ) -> Result<Binding, EvaluationError> {
        let value = match (ctx.environment.parameter(&variable.name), &parameter.select) {
            (Some(value), _) => value.clone(),
            (None, Some(select)) => select
                .evaluate(&ctx.expression_context())
                .map_err(|e| EvaluationError::expression(&variable.name, e))?,
            (None, None) if parameter.required => return Err(EvaluationError::MissingParameter(variable.name.clone())),
            (None, None) => Vec::new(),
        };
        Ok(Binding::parameter(variable, value))
    }

    fn resolve_scope(&self, variable: &Variable, source: &QName) -> Option<Binding> {
        let evaluations = self.scopes.get(source)?;
        trace!(variable = %variable.name, source = %source, evaluations = evaluations.len(), "scope import resolved");
        Some(Binding::scope(variable, source.clone(), evaluations.to_vec()))
    }
}

impl BindingResolver for InstanceResolver {
    fn resolve(&self, variable: &Variable, ctx: &ResolveContext<'_>) -> Result<Option<Binding>, EvaluationError> {
        match &variable.kind {
            VariableKind::Fact(fact) => Self::resolve_fact(variable, fact, ctx).map(Some),
            VariableKind::General(general) => {
                let items = general
                    .select
                    .evaluate(&ctx.expression_context())
                    .map_err(|e| EvaluationError::expression(&variable.name, e))?;
                Ok(Some(Binding::general(variable, items)))
            }
            VariableKind::Parameter(parameter) => Self::resolve_parameter(variable, parameter, ctx).map(Some),
            VariableKind::ScopeImport(import) => Ok(self.resolve_scope(variable, &import.source)),
        }
    }
}
