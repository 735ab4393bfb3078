mod support;

use std::sync::Arc;
use support::{concepts, context, q};
use xformula_model::InstanceBuilder;
use xformula_variables::{
    AtomicValue, BindingClass, CollectingSink, Constant, Evaluator, FnExpression, InstanceResolver, Item, RuleKind,
    ScopeRecorder, ScopeResults, Variable, VariableRef, VariableSet,
};

fn ints(values: &[i64]) -> Vec<Item> {
    values.iter().map(|&v| Item::Atomic(AtomicValue::Integer(v))).collect()
}

#[test]
fn scope_import_replays_recorded_evaluations() {
    let mut builder = InstanceBuilder::new();
    builder.add_context(context("c", "E", 2020));
    let fact = builder.item(q("A"), "c", None, "7");
    let instance = builder.build().expect("instance");

    let source = VariableSet::new(q("source"), RuleKind::Formula)
        .with(Variable::general(q("n"), Constant(ints(&[1, 2]))))
        .with(Variable::fact(q("a"), concepts(&["A"])));
    let mut recorder = ScopeRecorder::new(q("source"), &instance, Arc::new(VariableRef(q("n"))));
    let resolver = InstanceResolver::new();
    let ok = Evaluator::new(&instance, &source, &resolver).evaluate(&mut recorder).expect("source evaluates");
    assert!(ok);
    assert_eq!(recorder.evaluations().len(), 2);
    let mut scopes = ScopeResults::new();
    recorder.finish(&mut scopes);

    let doubled = FnExpression::new("$n * 2", |ctx| {
        let n = ctx.environment.value_of(&q("n")).unwrap_or_default();
        Ok(n.into_iter()
            .map(|item| match item {
                Item::Atomic(AtomicValue::Integer(i)) => Item::Atomic(AtomicValue::Integer(i * 2)),
                other => other,
            })
            .collect())
    });
    let target = VariableSet::new(q("target"), RuleKind::Formula)
        .with(Variable::scope_import(q("s"), q("source")))
        .with(Variable::general(q("d"), doubled).depends_on(q("s")));
    let resolver = InstanceResolver::with_scopes(scopes);
    let mut sink = CollectingSink::new();
    assert_eq!(Evaluator::new(&instance, &target, &resolver).evaluate(&mut sink), Ok(true));

    assert_eq!(sink.len(), 2);
    let doubled: Vec<_> = sink.results.iter().filter_map(|env| env.value_of(&q("d"))).collect();
    assert_eq!(doubled, vec![ints(&[2]), ints(&[4])]);
    for env in &sink.results {
        assert_eq!(env.imported(&q("a")), Some(&vec![Item::Fact(fact)]));
        let s = env.scope_variable(&q("s")).expect("scope variable bound");
        assert_eq!(s.class, BindingClass::Scope);
        assert!(env.fact_variable(&q("s")).is_none());
    }
}

#[test]
fn empty_recorded_scope_produces_no_results() {
    let instance = InstanceBuilder::new().build().expect("instance");
    let mut scopes = ScopeResults::new();
    scopes.register(q("source"), Vec::new());
    let target = VariableSet::new(q("target"), RuleKind::Formula).with(Variable::scope_import(q("s"), q("source")));
    let resolver = InstanceResolver::with_scopes(scopes);
    let mut sink = CollectingSink::new();
    assert_eq!(Evaluator::new(&instance, &target, &resolver).evaluate(&mut sink), Ok(true));
    assert!(sink.is_empty());
}
