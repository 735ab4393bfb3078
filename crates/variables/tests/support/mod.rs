//! Shared builders for the evaluator integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use xformula_model::{Context, FactId, Instance, Period, QName};
use xformula_variables::{
    BindingResolver, CollectingDiagnostics, CollectingSink, ConceptNameFilter, Environment, EvaluationError,
    Evaluator, EvaluatorOptions, FactVariable, InstanceResolver, VariableSet, value::facts_of,
};

pub const SCHEME: &str = "http://www.example.com/entity";

pub fn year_end(year: i32) -> Period {
    Period::Instant(NaiveDate::from_ymd_opt(year, 12, 31).expect("valid date"))
}

pub fn context(id: &str, entity: &str, year: i32) -> Context {
    Context::new(id, SCHEME, entity, year_end(year))
}

pub fn q(local: &str) -> QName {
    QName::local(local)
}

pub fn concepts(names: &[&str]) -> FactVariable {
    FactVariable::new().filter(ConceptNameFilter::new(names.iter().map(|n| q(n))))
}

pub struct Run {
    pub outcome: Result<bool, EvaluationError>,
    pub sink: CollectingSink,
    pub diagnostics: CollectingDiagnostics,
}

pub fn run(instance: &Instance, set: &VariableSet, options: EvaluatorOptions) -> Run {
    run_with(instance, set, &InstanceResolver::new(), options)
}

pub fn run_with(
    instance: &Instance,
    set: &VariableSet,
    resolver: &dyn BindingResolver,
    options: EvaluatorOptions,
) -> Run {
    let diagnostics = CollectingDiagnostics::new();
    let mut sink = CollectingSink::new();
    let outcome = Evaluator::new(instance, set, resolver)
        .with_diagnostics(&diagnostics)
        .with_options(options)
        .evaluate(&mut sink);
    Run { outcome, sink, diagnostics }
}

/// Facts bound to `name` in one result environment.
pub fn bound_facts(env: &Environment, name: &str) -> Vec<FactId> {
    env.binding(&q(name)).map(|b| facts_of(&b.value).collect()).unwrap_or_default()
}

/// `(a, b)` fact pairs across all results, for two item-bound variables.
pub fn pairs(sink: &CollectingSink, a: &str, b: &str) -> Vec<(Vec<FactId>, Vec<FactId>)> {
    sink.results.iter().map(|env| (bound_facts(env, a), bound_facts(env, b))).collect()
}
