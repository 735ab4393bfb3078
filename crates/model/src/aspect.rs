use crate::context::{Context, ContextContainer};
use crate::instance::{ElementKind, FactId, Instance};
use crate::qname::QName;
use core::fmt;
use smallvec::SmallVec;

/// One component of a fact's identity used for aspect matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Aspect {
    Location,
    Concept,
    EntityIdentifier,
    Period,
    Unit,
    CompleteSegment,
    NonXdtSegment,
    CompleteScenario,
    NonXdtScenario,
    Dimension(QName),
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aspect::Location => f.write_str("location"),
            Aspect::Concept => f.write_str("concept"),
            Aspect::EntityIdentifier => f.write_str("entity-identifier"),
            Aspect::Period => f.write_str("period"),
            Aspect::Unit => f.write_str("unit"),
            Aspect::CompleteSegment => f.write_str("complete-segment"),
            Aspect::NonXdtSegment => f.write_str("non-XDT-segment"),
            Aspect::CompleteScenario => f.write_str("complete-scenario"),
            Aspect::NonXdtScenario => f.write_str("non-XDT-scenario"),
            Aspect::Dimension(d) => write!(f, "dimension({d})"),
        }
    }
}

/// Which aspect vocabulary applies to segment and scenario content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AspectModel {
    #[default]
    Dimensional,
    NonDimensional,
}

/// Small ordered set of aspects; most facts define fewer than a dozen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AspectSet(SmallVec<[Aspect; 8]>);

impl AspectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the aspect was not present yet.
    pub fn insert(&mut self, aspect: Aspect) -> bool {
        match self.0.binary_search(&aspect) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, aspect);
                true
            }
        }
    }

    pub fn contains(&self, aspect: &Aspect) -> bool {
        self.0.binary_search(aspect).is_ok()
    }

    pub fn remove(&mut self, aspect: &Aspect) -> bool {
        match self.0.binary_search(aspect) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn extend<I: IntoIterator<Item = Aspect>>(&mut self, aspects: I) {
        for a in aspects {
            self.insert(a);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aspect> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Aspects of `self` not contained in `other`.
    pub fn difference(&self, other: &AspectSet) -> AspectSet {
        AspectSet(self.0.iter().filter(|a| !other.contains(a)).cloned().collect())
    }
}

impl FromIterator<Aspect> for AspectSet {
    fn from_iter<I: IntoIterator<Item = Aspect>>(iter: I) -> Self {
        let mut set = AspectSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for AspectSet {
    type Item = Aspect;
    type IntoIter = smallvec::IntoIter<[Aspect; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AspectSet {
    type Item = &'a Aspect;
    type IntoIter = core::slice::Iter<'a, Aspect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Instance {
    /// Aspects a fact carries under the given aspect model.
    pub fn aspects_defined(&self, fact: FactId, model: AspectModel) -> AspectSet {
        let mut set = AspectSet::new();
        let Some(element) = self.element(fact) else {
            return set;
        };
        match element.kind {
            ElementKind::Root => return set,
            ElementKind::Tuple => {
                set.insert(Aspect::Location);
                set.insert(Aspect::Concept);
                return set;
            }
            ElementKind::Item => {}
        }
        set.extend([Aspect::Location, Aspect::Concept, Aspect::EntityIdentifier, Aspect::Period]);
        if element.unit_ref.is_some() {
            set.insert(Aspect::Unit);
        }
        match model {
            AspectModel::Dimensional => {
                set.insert(Aspect::NonXdtSegment);
                set.insert(Aspect::NonXdtScenario);
                if let Some(ctx) = self.context_of(fact) {
                    set.extend(ctx.dimension_names().cloned().map(Aspect::Dimension));
                }
            }
            AspectModel::NonDimensional => {
                set.insert(Aspect::CompleteSegment);
                set.insert(Aspect::CompleteScenario);
            }
        }
        set
    }

    /// Whether two facts have equal values for one aspect.
    ///
    /// Facts that both lack the aspect (no unit, no value for a dimension)
    /// compare equal; a fact lacking it never equals one carrying it.
    pub fn aspect_equal(&self, a: FactId, b: FactId, aspect: &Aspect) -> bool {
        if a == b {
            return true;
        }
        match aspect {
            Aspect::Location => self.parent(a) == self.parent(b),
            Aspect::Concept => self.name(a) == self.name(b),
            Aspect::Unit => match (self.unit_of(a), self.unit_of(b)) {
                (Some(ua), Some(ub)) => ua.s_equal(ub),
                (None, None) => true,
                _ => false,
            },
            _ => match (self.context_of(a), self.context_of(b)) {
                (Some(ca), Some(cb)) => context_aspect_equal(ca, cb, aspect),
                (None, None) => true,
                _ => false,
            },
        }
    }

    /// Duplicate items: same parent element, same local name, equal units when
    /// both carry a unit reference, and s-equal contexts.
    pub fn duplicates(&self, a: FactId, b: FactId) -> bool {
        let (Some(ea), Some(eb)) = (self.element(a), self.element(b)) else {
            return false;
        };
        if ea.parent != eb.parent || ea.name.local != eb.name.local {
            return false;
        }
        if ea.unit_ref.is_some() && eb.unit_ref.is_some() {
            match (self.unit_of(a), self.unit_of(b)) {
                (Some(ua), Some(ub)) if ua.s_equal(ub) => {}
                _ => return false,
            }
        }
        match (self.context_of(a), self.context_of(b)) {
            (Some(ca), Some(cb)) => ca.s_equal(cb),
            (None, None) => true,
            _ => false,
        }
    }
}

fn context_aspect_equal(a: &Context, b: &Context, aspect: &Aspect) -> bool {
    fn non_xdt(c: &ContextContainer) -> &[String] {
        &c.other
    }
    match aspect {
        Aspect::EntityIdentifier => a.entity.scheme == b.entity.scheme && a.entity.identifier == b.entity.identifier,
        Aspect::Period => a.period == b.period,
        Aspect::CompleteSegment => a.entity.segment == b.entity.segment,
        Aspect::CompleteScenario => a.scenario == b.scenario,
        Aspect::NonXdtSegment => non_xdt(&a.entity.segment) == non_xdt(&b.entity.segment),
        Aspect::NonXdtScenario => non_xdt(&a.scenario) == non_xdt(&b.scenario),
        Aspect::Dimension(d) => a.dimension(d) == b.dimension(d),
        Aspect::Location | Aspect::Concept | Aspect::Unit => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_set_is_ordered_and_deduplicated() {
        let mut set: AspectSet = [Aspect::Unit, Aspect::Concept, Aspect::Unit].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next(), Some(&Aspect::Concept));
        assert!(set.remove(&Aspect::Unit));
        assert!(!set.contains(&Aspect::Unit));
    }

    #[test]
    fn difference_keeps_only_missing_aspects() {
        let defined: AspectSet = [Aspect::Concept, Aspect::Period, Aspect::Unit].into_iter().collect();
        let covered: AspectSet = [Aspect::Concept].into_iter().collect();
        let uncovered = defined.difference(&covered);
        assert_eq!(uncovered.iter().cloned().collect::<Vec<_>>(), vec![Aspect::Period, Aspect::Unit]);
    }

    #[test]
    fn extend_merges_owned_sets() {
        let mut merged: AspectSet = [Aspect::Concept].into_iter().collect();
        merged.extend([Aspect::Period, Aspect::Concept].into_iter().collect::<AspectSet>());
        merged.extend(AspectSet::new());
        assert_eq!(merged.into_iter().collect::<Vec<_>>(), vec![Aspect::Concept, Aspect::Period]);
    }
}
