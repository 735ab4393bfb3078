//! Per-frame binding state of one variable.
//!
//! A [`Binding`] is produced by the resolver each time the evaluator reaches
//! a variable. It owns the iteration domain (facts, partition groups, items
//! or replayed scope evaluations) and a cursor over it. Variant-specific
//! state lives in the closed [`BindingKind`] sum type.
use crate::aspect_facts::UncoveredAspectFacts;
use crate::environment::{BindingClass, BoundVariable};
use crate::expression::{ExpressionContext, ExpressionError};
use crate::partition::Partitioner;
use crate::scope::ScopeEvaluation;
use crate::value::{Item, Sequence};
use crate::variable::Variable;
use std::collections::HashMap;
use xformula_model::{AspectSet, FactId, QName};

/// Fallback bindings carried down the recursion, keyed by variable name.
pub type NotBindings = HashMap<QName, Binding>;

/// One step of a binding's iteration domain.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Fact(FactId),
    /// Aspect-matched facts bound together (matches mode).
    Group(Vec<FactId>),
    Item(Item),
    /// Whole sequence bound at once (sequence binding or fallback value).
    Sequence(Sequence),
    /// Index into the scope binding's replayed evaluations.
    Evaluation(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactBinding {
    facts: Vec<FactId>,
    aspects_defined: AspectSet,
    aspects_covered: AspectSet,
    uncovered: UncoveredAspectFacts,
}

impl FactBinding {
    pub fn facts(&self) -> &[FactId] {
        &self.facts
    }

    pub fn aspects_defined(&self) -> &AspectSet {
        &self.aspects_defined
    }

    pub fn aspects_covered(&self) -> &AspectSet {
        &self.aspects_covered
    }

    /// Aspects defined by the candidates and not covered by a filter.
    pub fn uncovered_aspect_keys(&self) -> AspectSet {
        self.aspects_defined.difference(&self.aspects_covered)
    }

    pub fn uncovered_aspect_facts(&self) -> &UncoveredAspectFacts {
        &self.uncovered
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralBinding {
    items: Sequence,
}

impl GeneralBinding {
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeBinding {
    source: QName,
    evaluations: Vec<ScopeEvaluation>,
}

impl ScopeBinding {
    pub fn source(&self) -> &QName {
        &self.source
    }

    pub fn evaluations(&self) -> &[ScopeEvaluation] {
        &self.evaluations
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    Fact(FactBinding),
    General(GeneralBinding),
    Scope(ScopeBinding),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    name: QName,
    kind: BindingKind,
    values: Vec<BoundValue>,
    cursor: Option<usize>,
    values_found: bool,
    is_fallback: bool,
}

impl Binding {
    fn with_values(variable: &Variable, kind: BindingKind, values: Vec<BoundValue>) -> Self {
        let values_found = !values.is_empty();
        Self { name: variable.name.clone(), kind, values, cursor: None, values_found, is_fallback: false }
    }

    /// Fact binding over candidates in document order, one value per fact.
    pub fn fact(
        variable: &Variable,
        facts: Vec<FactId>,
        aspects_defined: AspectSet,
        aspects_covered: AspectSet,
    ) -> Self {
        let values = facts.iter().copied().map(BoundValue::Fact).collect();
        let kind = BindingKind::Fact(FactBinding {
            facts,
            aspects_defined,
            aspects_covered,
            uncovered: UncoveredAspectFacts::new(),
        });
        Self::with_values(variable, kind, values)
    }

    /// General binding: one value per item, or the whole non-empty sequence
    /// once when the variable binds as a sequence.
    pub fn general(variable: &Variable, items: Sequence) -> Self {
        let values = if variable.bind_as_sequence {
            if items.is_empty() { Vec::new() } else { vec![BoundValue::Sequence(items.clone())] }
        } else {
            items.iter().cloned().map(BoundValue::Item).collect()
        };
        Self::with_values(variable, BindingKind::General(GeneralBinding { items }), values)
    }

    /// Parameter binding; the value is bound once even when empty.
    pub fn parameter(variable: &Variable, value: Sequence) -> Self {
        let values = vec![BoundValue::Sequence(value.clone())];
        Self::with_values(variable, BindingKind::General(GeneralBinding { items: value }), values)
    }

    pub fn scope(variable: &Variable, source: QName, evaluations: Vec<ScopeEvaluation>) -> Self {
        let values = (0..evaluations.len()).map(BoundValue::Evaluation).collect();
        Self::with_values(variable, BindingKind::Scope(ScopeBinding { source, evaluations }), values)
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    pub fn class(&self) -> BindingClass {
        match self.kind {
            BindingKind::Fact(_) => BindingClass::Fact,
            BindingKind::General(_) => BindingClass::General,
            BindingKind::Scope(_) => BindingClass::Scope,
        }
    }

    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    /// Covered aspects; empty for non-fact and fallback bindings.
    pub fn aspects_covered(&self) -> AspectSet {
        match &self.kind {
            BindingKind::Fact(fb) if !self.is_fallback => fb.aspects_covered.clone(),
            _ => AspectSet::new(),
        }
    }

    /// Uncovered-aspect map of the current value; only fact bindings that are
    /// not in fallback state take part in aspect covering.
    pub fn uncovered_aspect_facts(&self) -> Option<&UncoveredAspectFacts> {
        match &self.kind {
            BindingKind::Fact(fb) if !self.is_fallback => Some(&fb.uncovered),
            _ => None,
        }
    }

    /// Replaces the iteration domain with the partition of the candidate facts.
    pub fn partition(&mut self, variable: &Variable, partitioner: &Partitioner<'_>) {
        let BindingKind::Fact(fb) = &self.kind else {
            return;
        };
        let keys = fb.uncovered_aspect_keys();
        let covers_any = !fb.aspects_covered.is_empty();
        self.values = partitioner.partition(&fb.facts, &keys, variable, covers_any);
        self.cursor = None;
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        if let BindingKind::Fact(fb) = &mut self.kind {
            fb.uncovered = UncoveredAspectFacts::new();
        }
    }

    /// Moves to the next value; returns `false` once the domain is exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.values.len() {
            self.cursor = Some(self.values.len());
            return false;
        }
        self.cursor = Some(next);
        let representative = self.representative_fact();
        if let BindingKind::Fact(fb) = &mut self.kind {
            fb.uncovered = match representative {
                Some(fact) if !self.is_fallback => {
                    UncoveredAspectFacts::for_fact(&fb.aspects_defined, &fb.aspects_covered, fact)
                }
                _ => UncoveredAspectFacts::new(),
            };
        }
        true
    }

    pub fn current(&self) -> Option<&BoundValue> {
        self.cursor.and_then(|c| self.values.get(c))
    }

    /// Facts of the current value, in order.
    pub fn current_facts(&self) -> Vec<FactId> {
        match self.current() {
            Some(BoundValue::Fact(f)) => vec![*f],
            Some(BoundValue::Group(g)) => g.clone(),
            Some(BoundValue::Item(Item::Fact(f))) => vec![*f],
            _ => Vec::new(),
        }
    }

    /// Fact whose aspect values stand for the current value.
    pub fn representative_fact(&self) -> Option<FactId> {
        match self.current()? {
            BoundValue::Fact(f) | BoundValue::Item(Item::Fact(f)) => Some(*f),
            BoundValue::Group(g) => g.first().copied(),
            _ => None,
        }
    }

    pub fn current_sequence(&self) -> Sequence {
        match self.current() {
            Some(BoundValue::Fact(f)) => vec![Item::Fact(*f)],
            Some(BoundValue::Group(g)) => g.iter().copied().map(Item::Fact).collect(),
            Some(BoundValue::Item(i)) => vec![i.clone()],
            Some(BoundValue::Sequence(s)) => s.clone(),
            Some(BoundValue::Evaluation(i)) => self.current_evaluation(*i).map(|e| e.value.clone()).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn current_evaluation(&self, index: usize) -> Option<&ScopeEvaluation> {
        match &self.kind {
            BindingKind::Scope(sb) => sb.evaluations.get(index),
            _ => None,
        }
    }

    /// Variables exposed by the replayed scope evaluation at the cursor.
    pub fn current_imports(&self) -> &[(QName, Sequence)] {
        match self.current() {
            Some(BoundValue::Evaluation(i)) => self.current_evaluation(*i).map_or(&[], |e| e.variables.as_slice()),
            _ => &[],
        }
    }

    /// Ambient map for deeper frames, or `None` when the parent map passes
    /// through unchanged (general, scope and fallback bindings).
    pub fn propagate_ambient(&self, ambient: Option<&UncoveredAspectFacts>) -> Option<UncoveredAspectFacts> {
        self.uncovered_aspect_facts().map(|own| own.propagate(ambient))
    }

    /// Substitutes the variable's fallback value.
    ///
    /// Succeeds only when the variable declares a fallback and either nothing
    /// was found or `force` is set. Previously bound values are discarded and
    /// the binding leaves aspect covering.
    pub fn try_fallback(
        &mut self,
        variable: &Variable,
        ctx: &ExpressionContext<'_>,
        force: bool,
    ) -> Result<bool, ExpressionError> {
        let Some(expr) = &variable.fallback else {
            return Ok(false);
        };
        if self.values_found && !force {
            return Ok(false);
        }
        let value = expr.evaluate(ctx)?;
        if let BindingKind::Fact(fb) = &mut self.kind {
            fb.facts.clear();
            fb.aspects_covered.clear();
            fb.uncovered = UncoveredAspectFacts::new();
        }
        self.values = vec![BoundValue::Sequence(value)];
        self.cursor = None;
        self.is_fallback = true;
        Ok(true)
    }

    /// Environment entry for the current value.
    pub fn snapshot(&self) -> BoundVariable {
        BoundVariable {
            class: self.class(),
            value: self.current_sequence(),
            is_fallback: self.is_fallback,
            aspects_covered: self.aspects_covered(),
            uncovered: self.uncovered_aspect_facts().cloned().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::expression::Constant;
    use crate::value::AtomicValue;
    use crate::variable::FactVariable;
    use rstest::rstest;
    use xformula_model::{Aspect, InstanceBuilder};

    fn fact_ids(n: usize) -> (xformula_model::Instance, Vec<FactId>) {
        let mut b = InstanceBuilder::new();
        let ids = (0..n).map(|i| b.begin_tuple(QName::local(format!("t{i}")))).collect::<Vec<_>>();
        for _ in 0..n {
            b.end_tuple().expect("open tuple");
        }
        (b.build().expect("instance"), ids)
    }

    fn variable_with_fallback() -> Variable {
        Variable::fact(QName::local("v"), FactVariable::new())
            .fallback(Constant(vec![Item::Atomic(AtomicValue::Integer(0))]))
    }

    #[test]
    fn advance_walks_values_and_rebuilds_uncovered_map() {
        let (_inst, ids) = fact_ids(2);
        let var = Variable::fact(QName::local("v"), FactVariable::new());
        let defined: AspectSet = [Aspect::Concept, Aspect::Location].into_iter().collect();
        let covered: AspectSet = [Aspect::Concept].into_iter().collect();
        let mut b = Binding::fact(&var, ids.clone(), defined, covered);
        assert!(b.advance());
        assert_eq!(b.current(), Some(&BoundValue::Fact(ids[0])));
        let map = b.uncovered_aspect_facts().expect("fact binding");
        assert_eq!(map.get(&Aspect::Location), Some(ids[0]));
        assert_eq!(map.get(&Aspect::Concept), None);
        assert!(b.advance());
        assert_eq!(b.uncovered_aspect_facts().and_then(|m| m.get(&Aspect::Location)), Some(ids[1]));
        assert!(!b.advance());
        assert_eq!(b.current(), None);
        b.reset();
        assert!(b.advance());
        assert_eq!(b.representative_fact(), Some(ids[0]));
    }

    #[rstest]
    #[case::unforced(false, false)]
    #[case::forced(true, true)]
    fn fallback_respects_existing_facts(#[case] force: bool, #[case] expected: bool) {
        let (inst, ids) = fact_ids(1);
        let var = variable_with_fallback();
        let mut b = Binding::fact(&var, ids, AspectSet::new(), [Aspect::Concept].into_iter().collect());
        let env = Environment::default();
        let ctx = ExpressionContext { instance: &inst, environment: &env };
        assert_eq!(b.try_fallback(&var, &ctx, force), Ok(expected));
        assert_eq!(b.is_fallback(), expected);
        if expected {
            assert!(b.aspects_covered().is_empty());
            assert!(b.advance());
            assert_eq!(b.current_sequence(), vec![Item::Atomic(AtomicValue::Integer(0))]);
            assert_eq!(b.uncovered_aspect_facts(), None);
        }
    }

    #[test]
    fn empty_binding_accepts_fallback_without_force() {
        let (inst, _) = fact_ids(0);
        let var = variable_with_fallback();
        let mut b = Binding::fact(&var, Vec::new(), AspectSet::new(), AspectSet::new());
        let env = Environment::default();
        let ctx = ExpressionContext { instance: &inst, environment: &env };
        assert_eq!(b.try_fallback(&var, &ctx, false), Ok(true));
        assert!(b.is_fallback());
        assert_eq!(b.values().len(), 1);
    }

    #[test]
    fn no_fallback_declared_never_substitutes() {
        let (inst, _) = fact_ids(0);
        let var = Variable::fact(QName::local("v"), FactVariable::new());
        let mut b = Binding::fact(&var, Vec::new(), AspectSet::new(), AspectSet::new());
        let env = Environment::default();
        let ctx = ExpressionContext { instance: &inst, environment: &env };
        assert_eq!(b.try_fallback(&var, &ctx, true), Ok(false));
        assert!(!b.has_values());
    }

    #[test]
    fn general_binding_as_sequence_binds_once() {
        let items = vec![Item::Atomic(AtomicValue::Integer(1)), Item::Atomic(AtomicValue::Integer(2))];
        let seq_var = Variable::general(QName::local("g"), Constant(items.clone())).bind_as_sequence(true);
        assert_eq!(Binding::general(&seq_var, items.clone()).values().len(), 1);
        let item_var = Variable::general(QName::local("g"), Constant(items.clone()));
        assert_eq!(Binding::general(&item_var, items).values().len(), 2);
        assert!(!Binding::general(&seq_var, Vec::new()).has_values());
    }
}
