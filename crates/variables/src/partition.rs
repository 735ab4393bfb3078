//! Grouping of sequence-bound candidates by uncovered aspect values.
use crate::aspect_facts::UncoveredAspectFacts;
use crate::binding::BoundValue;
use crate::diagnostics::{self, Diagnostic, DiagnosticsSink};
use crate::matcher::AspectMatcher;
use crate::variable::Variable;
use std::collections::VecDeque;
use tracing::trace;
use xformula_model::{AspectSet, FactId, Instance};

pub struct Partitioner<'a> {
    instance: &'a Instance,
    matcher: &'a dyn AspectMatcher,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl<'a> Partitioner<'a> {
    pub fn new(instance: &'a Instance, matcher: &'a dyn AspectMatcher, diagnostics: &'a dyn DiagnosticsSink) -> Self {
        Self { instance, matcher, diagnostics }
    }

    /// Splits `candidates` into groups of facts that agree on every key.
    ///
    /// With matches mode on, each group becomes one [`BoundValue::Group`].
    /// Otherwise the facts of a group are emitted one by one, after dropping
    /// duplicates when the variable covers at least one aspect. Output keeps
    /// discovery order.
    pub fn partition(
        &self,
        candidates: &[FactId],
        keys: &AspectSet,
        variable: &Variable,
        covers_any: bool,
    ) -> Vec<BoundValue> {
        if keys.is_empty() {
            return candidates.iter().copied().map(BoundValue::Fact).collect();
        }
        let matches = variable.matches();
        let mut remaining: VecDeque<FactId> = candidates.iter().copied().collect();
        let mut out = Vec::with_capacity(candidates.len());

        'worklist: loop {
            let Some(first) = remaining.pop_front() else {
                break 'worklist;
            };
            if !self.instance.contains(first) {
                self.diagnostics.report(
                    Diagnostic::warning(
                        diagnostics::IDENTITY_FAILURE,
                        "partition candidate is not a fact of the instance",
                    )
                    .with_detail("variable", &variable.name)
                        .with_detail("fact", first),
                );
                out.push(BoundValue::Fact(first));
                continue 'worklist;
            }
            let seed = UncoveredAspectFacts::seeded(keys, first);
            let mut group = vec![first];
            remaining.retain(|&candidate| {
                let member = self.instance.contains(candidate)
                    && self.matcher.aspects_match(variable, candidate, &seed, self.instance);
                if member {
                    group.push(candidate);
                }
                !member
            });
            trace!(variable = %variable.name, first = %first, size = group.len(), "partition group");

            if matches {
                out.push(BoundValue::Group(group));
            } else {
                if covers_any {
                    group = self.drop_duplicates(group, variable);
                }
                out.extend(group.into_iter().map(BoundValue::Fact));
            }
        }
        out
    }

    fn drop_duplicates(&self, group: Vec<FactId>, variable: &Variable) -> Vec<FactId> {
        let mut kept: Vec<FactId> = Vec::with_capacity(group.len());
        for fact in group {
            match kept.iter().find(|&&k| self.instance.duplicates(k, fact)) {
                Some(&original) => self.diagnostics.report(
                    Diagnostic::debug(diagnostics::DUPLICATE_FACT, "duplicate fact dropped from partition")
                        .with_detail("variable", &variable.name)
                        .with_detail("fact", fact)
                        .with_detail("duplicate_of", original),
                ),
                None => kept.push(fact),
            }
        }
        kept
    }
}
