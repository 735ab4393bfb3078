//! Aspect matching between candidate facts and uncovered-aspect facts.
use crate::aspect_facts::UncoveredAspectFacts;
use crate::binding::Binding;
use crate::variable::Variable;
use xformula_model::{Aspect, AspectModel, AspectSet, FactId, Instance};

pub trait AspectMatcher {
    /// Whether `candidate` has the same value as the seed fact for every
    /// non-empty slot of `seed`.
    fn aspects_match(
        &self,
        variable: &Variable,
        candidate: FactId,
        seed: &UncoveredAspectFacts,
        instance: &Instance,
    ) -> bool;

    /// Whether the binding's current value agrees with the ambient facts on
    /// every aspect the binding leaves uncovered.
    fn match_uncovered_aspects(
        &self,
        variable: &Variable,
        ambient: Option<&UncoveredAspectFacts>,
        binding: &Binding,
        instance: &Instance,
    ) -> bool;
}

/// Aspect matching over [`Instance::aspect_equal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardAspectMatcher {
    model: AspectModel,
}

impl StandardAspectMatcher {
    pub fn new(model: AspectModel) -> Self {
        Self { model }
    }

    /// Implicit-filter test for one candidate.
    ///
    /// Aspects in `covered` are skipped. Other ambient aspects are compared
    /// when the candidate defines them; dimensions are always compared since
    /// a missing dimension only equals another missing dimension.
    pub fn compatible(
        &self,
        candidate: FactId,
        ambient: &UncoveredAspectFacts,
        covered: &AspectSet,
        instance: &Instance,
    ) -> bool {
        let defined = instance.aspects_defined(candidate, self.model);
        ambient.facts().all(|(aspect, fact)| {
            if covered.contains(aspect) {
                return true;
            }
            if !defined.contains(aspect) && !matches!(aspect, Aspect::Dimension(_)) {
                return true;
            }
            instance.aspect_equal(candidate, fact, aspect)
        })
    }
}

impl AspectMatcher for StandardAspectMatcher {
    fn aspects_match(
        &self,
        _variable: &Variable,
        candidate: FactId,
        seed: &UncoveredAspectFacts,
        instance: &Instance,
    ) -> bool {
        seed.facts().all(|(aspect, fact)| instance.aspect_equal(candidate, fact, aspect))
    }

    fn match_uncovered_aspects(
        &self,
        variable: &Variable,
        ambient: Option<&UncoveredAspectFacts>,
        binding: &Binding,
        instance: &Instance,
    ) -> bool {
        let Some(ambient) = ambient else {
            return true;
        };
        if binding.uncovered_aspect_facts().is_none() {
            return true;
        }
        if !variable.as_fact().is_some_and(|f| f.implicit_filtering) {
            return true;
        }
        let covered = binding.aspects_covered();
        binding.current_facts().into_iter().all(|fact| self.compatible(fact, ambient, &covered, instance))
    }
}
