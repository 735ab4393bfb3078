mod support;

use rstest::rstest;
use support::{context, q};
use xformula_model::{Aspect, AspectSet, FactId, Instance, InstanceBuilder, Unit};
use xformula_variables::diagnostics::IDENTITY_FAILURE;
use xformula_variables::{
    BoundValue, CollectingDiagnostics, FactVariable, Partitioner, StandardAspectMatcher, Variable,
};

struct Sample {
    instance: Instance,
    a20: FactId,
    a20_dup: FactId,
    a21: FactId,
    b20_usd: FactId,
    b20_eur: FactId,
}

fn sample() -> Sample {
    let mut builder = InstanceBuilder::new();
    builder
        .add_context(context("c20", "E", 2020))
        .add_context(context("c20b", "E", 2020))
        .add_context(context("c21", "E", 2021))
        .add_unit(Unit::new("usd", q("USD")))
        .add_unit(Unit::new("eur", q("EUR")));
    let a20 = builder.item(q("A"), "c20", None, "1");
    // s-equal context under another id.
    let a20_dup = builder.item(q("A"), "c20b", None, "1");
    let a21 = builder.item(q("A"), "c21", None, "2");
    let b20_usd = builder.item(q("B"), "c20", Some("usd"), "3");
    let b20_eur = builder.item(q("B"), "c20", Some("eur"), "4");
    Sample { instance: builder.build().expect("instance"), a20, a20_dup, a21, b20_usd, b20_eur }
}

fn keys(aspects: &[Aspect]) -> AspectSet {
    aspects.iter().cloned().collect()
}

fn facts(values: &[BoundValue]) -> Vec<FactId> {
    values
        .iter()
        .map(|v| match v {
            BoundValue::Fact(f) => *f,
            other => panic!("expected single fact, got {other:?}"),
        })
        .collect()
}

#[test]
fn no_uncovered_keys_keeps_candidates_unchanged() {
    let s = sample();
    let matcher = StandardAspectMatcher::default();
    let diagnostics = CollectingDiagnostics::new();
    let partitioner = Partitioner::new(&s.instance, &matcher, &diagnostics);
    let var = Variable::fact(q("v"), FactVariable::new().matches(true));
    let candidates = [s.a21, s.a20, s.a20_dup];
    let out = partitioner.partition(&candidates, &AspectSet::new(), &var, true);
    assert_eq!(facts(&out), candidates.to_vec());
    assert!(partitioner.partition(&[], &keys(&[Aspect::Period]), &var, true).is_empty());
}

#[test]
fn groups_follow_discovery_order() {
    let s = sample();
    let matcher = StandardAspectMatcher::default();
    let diagnostics = CollectingDiagnostics::new();
    let partitioner = Partitioner::new(&s.instance, &matcher, &diagnostics);
    let var = Variable::fact(q("v"), FactVariable::new().matches(true));
    let out = partitioner.partition(&[s.a21, s.a20, s.b20_usd, s.a20_dup], &keys(&[Aspect::Period]), &var, true);
    assert_eq!(
        out,
        vec![BoundValue::Group(vec![s.a21]), BoundValue::Group(vec![s.a20, s.b20_usd, s.a20_dup])]
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn duplicates_are_dropped_when_matches_is_off() {
    let s = sample();
    let matcher = StandardAspectMatcher::default();
    let diagnostics = CollectingDiagnostics::new();
    let partitioner = Partitioner::new(&s.instance, &matcher, &diagnostics);
    let var = Variable::fact(q("v"), FactVariable::new());
    let candidates = [s.a20, s.a20_dup, s.b20_usd, s.b20_eur, s.a21];
    let out = partitioner.partition(&candidates, &keys(&[Aspect::Period]), &var, true);
    // Units differ, so the two B facts are not duplicates.
    assert_eq!(facts(&out), vec![s.a20, s.b20_usd, s.b20_eur, s.a21]);
    assert_eq!(diagnostics.events().len(), 1);

    let kept = partitioner.partition(&candidates, &keys(&[Aspect::Period]), &var, false);
    assert_eq!(facts(&kept), vec![s.a20, s.a20_dup, s.b20_usd, s.b20_eur, s.a21]);
}

#[test]
fn foreign_ids_are_reported_and_kept_standalone() {
    let s = sample();
    let matcher = StandardAspectMatcher::default();
    let diagnostics = CollectingDiagnostics::new();
    let partitioner = Partitioner::new(&s.instance, &matcher, &diagnostics);
    let var = Variable::fact(q("v"), FactVariable::new());
    let out = partitioner.partition(&[s.a20, FactId::ROOT, s.a21], &keys(&[Aspect::Period]), &var, true);
    assert_eq!(facts(&out), vec![s.a20, FactId::ROOT, s.a21]);
    assert_eq!(diagnostics.in_category(IDENTITY_FAILURE).len(), 1);
}

#[rstest]
#[case::matches_groups_duplicates(true)]
#[case::duplicates_kept_one_by_one(false)]
fn nothing_covered_keeps_duplicates(#[case] matches: bool) {
    let s = sample();
    let matcher = StandardAspectMatcher::default();
    let diagnostics = CollectingDiagnostics::new();
    let partitioner = Partitioner::new(&s.instance, &matcher, &diagnostics);
    let var = Variable::fact(q("v"), FactVariable::new().matches(matches));
    let all = keys(&[
        Aspect::Location,
        Aspect::Concept,
        Aspect::EntityIdentifier,
        Aspect::Period,
        Aspect::NonXdtSegment,
        Aspect::NonXdtScenario,
    ]);
    let candidates = [s.a20, s.a20_dup, s.a21];
    let out = partitioner.partition(&candidates, &all, &var, false);
    let expected = if matches {
        vec![BoundValue::Group(vec![s.a20, s.a20_dup]), BoundValue::Group(vec![s.a21])]
    } else {
        candidates.iter().copied().map(BoundValue::Fact).collect()
    };
    assert_eq!(out, expected);
    assert!(diagnostics.is_empty());
}
