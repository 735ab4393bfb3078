//! Fact filters attached to fact variables.
//!
//! A filter accepts or rejects one candidate fact and declares which aspects
//! it covers. Only filters attached with `cover = true` contribute to a
//! binding's covered aspects.
use crate::expression::{ExpressionContext, ExpressionError};
use chrono::NaiveDate;
use core::fmt;
use std::sync::Arc;
use xformula_model::{Aspect, DimensionValue, FactId, Instance, QName};

pub trait Filter: fmt::Debug + Send + Sync {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError>;
    fn aspects_covered(&self, instance: &Instance) -> Vec<Aspect>;
}

/// A filter as attached to one variable.
#[derive(Debug, Clone)]
pub struct FilterUse {
    pub filter: Arc<dyn Filter>,
    pub complement: bool,
    pub cover: bool,
}

impl FilterUse {
    pub fn new(filter: impl Filter + 'static) -> Self {
        Self { filter: Arc::new(filter), complement: false, cover: true }
    }

    pub fn complemented(mut self) -> Self {
        self.complement = true;
        self
    }

    pub fn uncovering(mut self) -> Self {
        self.cover = false;
        self
    }

    pub fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        Ok(self.filter.accepts(ctx, fact)? != self.complement)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptNameFilter {
    pub names: Vec<QName>,
}

impl ConceptNameFilter {
    pub fn new<I: IntoIterator<Item = QName>>(names: I) -> Self {
        Self { names: names.into_iter().collect() }
    }
}

impl Filter for ConceptNameFilter {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        Ok(ctx.instance.name(fact).is_some_and(|n| self.names.contains(n)))
    }

    fn aspects_covered(&self, _instance: &Instance) -> Vec<Aspect> {
        vec![Aspect::Concept]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    Instant,
    Duration,
    Forever,
    /// Instant period on the given date.
    InstantOn(NaiveDate),
    /// Duration period ending on the given date.
    DurationEnding(NaiveDate),
}

impl Filter for PeriodFilter {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        use xformula_model::Period;
        let Some(period) = ctx.instance.context_of(fact).map(|c| &c.period) else {
            return Ok(false);
        };
        Ok(match self {
            PeriodFilter::Instant => period.is_instant(),
            PeriodFilter::Duration => period.is_duration(),
            PeriodFilter::Forever => matches!(period, Period::Forever),
            PeriodFilter::InstantOn(d) => period.is_instant() && period.end_date() == Some(*d),
            PeriodFilter::DurationEnding(d) => period.is_duration() && period.end_date() == Some(*d),
        })
    }

    fn aspects_covered(&self, _instance: &Instance) -> Vec<Aspect> {
        vec![Aspect::Period]
    }
}

/// Accepts facts whose context reports `dimension`, optionally restricted to members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitDimensionFilter {
    pub dimension: QName,
    pub members: Vec<QName>,
}

impl ExplicitDimensionFilter {
    pub fn new(dimension: QName) -> Self {
        Self { dimension, members: Vec::new() }
    }

    pub fn member(mut self, member: QName) -> Self {
        self.members.push(member);
        self
    }
}

impl Filter for ExplicitDimensionFilter {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        let value = ctx.instance.context_of(fact).and_then(|c| c.dimension(&self.dimension));
        Ok(match value {
            Some(DimensionValue::Explicit(m)) => self.members.is_empty() || self.members.contains(m),
            Some(DimensionValue::Typed(_)) | None => false,
        })
    }

    fn aspects_covered(&self, _instance: &Instance) -> Vec<Aspect> {
        vec![Aspect::Dimension(self.dimension.clone())]
    }
}

/// Accepts facts whose unit is exactly one numerator measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFilter {
    pub measure: QName,
}

impl Filter for UnitFilter {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        Ok(ctx.instance.unit_of(fact).and_then(|u| u.single_measure()) == Some(&self.measure))
    }

    fn aspects_covered(&self, _instance: &Instance) -> Vec<Aspect> {
        vec![Aspect::Unit]
    }
}

type Predicate = dyn Fn(&ExpressionContext<'_>, FactId) -> Result<bool, ExpressionError> + Send + Sync;

/// Arbitrary predicate; covers no aspect.
#[derive(Clone)]
pub struct GeneralFilter {
    label: String,
    predicate: Arc<Predicate>,
}

impl GeneralFilter {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ExpressionContext<'_>, FactId) -> Result<bool, ExpressionError> + Send + Sync + 'static,
    {
        Self { label: label.into(), predicate: Arc::new(predicate) }
    }
}

impl fmt::Debug for GeneralFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GeneralFilter").field(&self.label).finish()
    }
}

impl Filter for GeneralFilter {
    fn accepts(&self, ctx: &ExpressionContext<'_>, fact: FactId) -> Result<bool, ExpressionError> {
        (self.predicate)(ctx, fact)
    }

    fn aspects_covered(&self, _instance: &Instance) -> Vec<Aspect> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use rstest::{fixture, rstest};
    use xformula_model::{Context, ContextContainer, ISO4217_NS, InstanceBuilder, Period, Unit};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn usd() -> QName {
        QName::new(Some(ISO4217_NS), "USD")
    }

    struct Facts {
        instance: Instance,
        instant: FactId,
        duration: FactId,
        forever: FactId,
        europe: FactId,
        typed: FactId,
        per_share: FactId,
    }

    #[fixture]
    fn facts() -> Facts {
        let region = QName::local("Region");
        let mut b = InstanceBuilder::new();
        b.add_context(Context::new("i", "s", "E", Period::Instant(date(2020, 12, 31))))
            .add_context(Context::new(
                "d",
                "s",
                "E",
                Period::Duration { start: date(2020, 1, 1), end: date(2020, 12, 31) },
            ))
            .add_context(Context::new("f", "s", "E", Period::Forever))
            .add_context(
                Context::new("eu", "s", "E", Period::Instant(date(2020, 12, 31)))
                    .with_segment(ContextContainer::default().with_explicit(region.clone(), QName::local("Europe"))),
            )
            .add_context(
                Context::new("t", "s", "E", Period::Instant(date(2020, 12, 31)))
                    .with_scenario(ContextContainer::default().with_typed(region, "<eg:code>EU</eg:code>")),
            )
            .add_unit(Unit::new("usd", usd()))
            .add_unit(Unit::divide("usd-per-share", vec![usd()], vec![QName::local("shares")]));
        let instant = b.item(QName::local("A"), "i", Some("usd"), "1");
        let duration = b.item(QName::local("A"), "d", None, "2");
        let forever = b.item(QName::local("A"), "f", None, "3");
        let europe = b.item(QName::local("A"), "eu", None, "4");
        let typed = b.item(QName::local("A"), "t", None, "5");
        let per_share = b.item(QName::local("A"), "i", Some("usd-per-share"), "6");
        Facts { instance: b.build().expect("instance"), instant, duration, forever, europe, typed, per_share }
    }

    /// Facts among `ids` the filter accepts.
    fn accepted(facts: &Facts, filter: &dyn Filter, ids: &[FactId]) -> Vec<FactId> {
        let environment = Environment::default();
        let ctx = ExpressionContext { instance: &facts.instance, environment: &environment };
        ids.iter().copied().filter(|&id| filter.accepts(&ctx, id).expect("filter")).collect()
    }

    fn all(facts: &Facts) -> Vec<FactId> {
        vec![facts.instant, facts.duration, facts.forever, facts.europe, facts.typed, facts.per_share]
    }

    #[rstest]
    #[case::instant(PeriodFilter::Instant, &["instant", "europe", "typed", "per_share"])]
    #[case::duration(PeriodFilter::Duration, &["duration"])]
    #[case::forever(PeriodFilter::Forever, &["forever"])]
    #[case::instant_on_year_end(
        PeriodFilter::InstantOn(date(2020, 12, 31)),
        &["instant", "europe", "typed", "per_share"]
    )]
    #[case::instant_on_other_day(PeriodFilter::InstantOn(date(2020, 6, 30)), &[])]
    #[case::duration_ending(PeriodFilter::DurationEnding(date(2020, 12, 31)), &["duration"])]
    #[case::duration_ending_elsewhere(PeriodFilter::DurationEnding(date(2021, 12, 31)), &[])]
    fn period_filters_select_by_period(facts: Facts, #[case] filter: PeriodFilter, #[case] expected: &[&str]) {
        let by_name = |name: &str| match name {
            "instant" => facts.instant,
            "duration" => facts.duration,
            "forever" => facts.forever,
            "europe" => facts.europe,
            "typed" => facts.typed,
            _ => facts.per_share,
        };
        let expected: Vec<FactId> = expected.iter().map(|&n| by_name(n)).collect();
        assert_eq!(accepted(&facts, &filter, &all(&facts)), expected);
        assert_eq!(filter.aspects_covered(&facts.instance), vec![Aspect::Period]);
    }

    #[rstest]
    #[case::any_member(ExplicitDimensionFilter::new(QName::local("Region")), true)]
    #[case::listed_member(ExplicitDimensionFilter::new(QName::local("Region")).member(QName::local("Europe")), true)]
    #[case::other_member(ExplicitDimensionFilter::new(QName::local("Region")).member(QName::local("Asia")), false)]
    #[case::other_dimension(ExplicitDimensionFilter::new(QName::local("Product")), false)]
    fn explicit_dimension_filter_ignores_typed_values(
        facts: Facts,
        #[case] filter: ExplicitDimensionFilter,
        #[case] europe_accepted: bool,
    ) {
        let expected = if europe_accepted { vec![facts.europe] } else { Vec::new() };
        assert_eq!(accepted(&facts, &filter, &all(&facts)), expected);
        assert_eq!(filter.aspects_covered(&facts.instance), vec![Aspect::Dimension(filter.dimension.clone())]);
    }

    #[rstest]
    #[case::usd(usd(), true)]
    #[case::eur(QName::new(Some(ISO4217_NS), "EUR"), false)]
    fn unit_filter_needs_a_single_measure(facts: Facts, #[case] measure: QName, #[case] instant_accepted: bool) {
        let filter = UnitFilter { measure };
        let expected = if instant_accepted { vec![facts.instant] } else { Vec::new() };
        assert_eq!(accepted(&facts, &filter, &all(&facts)), expected);
        assert_eq!(filter.aspects_covered(&facts.instance), vec![Aspect::Unit]);
    }

    #[rstest]
    fn complement_inverts_acceptance(facts: Facts) {
        let environment = Environment::default();
        let ctx = ExpressionContext { instance: &facts.instance, environment: &environment };
        let complemented = FilterUse::new(PeriodFilter::Forever).complemented();
        assert!(!complemented.accepts(&ctx, facts.forever).expect("filter"));
        assert!(complemented.accepts(&ctx, facts.duration).expect("filter"));
    }
}
