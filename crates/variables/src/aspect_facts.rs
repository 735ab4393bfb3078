use std::collections::BTreeMap;
use xformula_model::{Aspect, AspectSet, FactId};

/// Representative fact per aspect for one binding's current value.
///
/// Covered aspects hold an empty slot; defined-but-uncovered aspects hold the
/// current fact. The map drives partitioning and implicit filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncoveredAspectFacts(BTreeMap<Aspect, Option<FactId>>);

impl UncoveredAspectFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map for `fact` as the current value of a binding.
    pub fn for_fact(defined: &AspectSet, covered: &AspectSet, fact: FactId) -> Self {
        let mut map = BTreeMap::new();
        for aspect in covered {
            map.insert(aspect.clone(), None);
        }
        for aspect in defined {
            if !covered.contains(aspect) {
                map.insert(aspect.clone(), Some(fact));
            }
        }
        Self(map)
    }

    /// Map seeded with `fact` for every key, as used when forming a partition group.
    pub fn seeded(keys: &AspectSet, fact: FactId) -> Self {
        Self(keys.iter().map(|a| (a.clone(), Some(fact))).collect())
    }

    pub fn insert(&mut self, aspect: Aspect, fact: Option<FactId>) {
        self.0.insert(aspect, fact);
    }

    /// Representative fact; `None` for both absent and empty slots.
    pub fn get(&self, aspect: &Aspect) -> Option<FactId> {
        self.0.get(aspect).copied().flatten()
    }

    pub fn contains_key(&self, aspect: &Aspect) -> bool {
        self.0.contains_key(aspect)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Aspect, Option<FactId>)> {
        self.0.iter().map(|(a, f)| (a, *f))
    }

    /// Slots that hold a fact.
    pub fn facts(&self) -> impl Iterator<Item = (&Aspect, FactId)> {
        self.0.iter().filter_map(|(a, f)| f.map(|f| (a, f)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Map handed to deeper frames: this binding's slots, with empty slots
    /// filled from `ambient`. Slots holding a fact are never replaced and no
    /// keys are added.
    pub fn propagate(&self, ambient: Option<&UncoveredAspectFacts>) -> UncoveredAspectFacts {
        let mut out = self.clone();
        let Some(ambient) = ambient else {
            return out;
        };
        for (aspect, slot) in &mut out.0 {
            if slot.is_none()
                && let Some(fact) = ambient.get(aspect)
            {
                *slot = Some(fact);
            }
        }
        out
    }
}

impl FromIterator<(Aspect, Option<FactId>)> for UncoveredAspectFacts {
    fn from_iter<I: IntoIterator<Item = (Aspect, Option<FactId>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
