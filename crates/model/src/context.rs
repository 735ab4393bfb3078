use crate::qname::QName;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Reporting period of a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
    Forever,
}

impl Period {
    pub fn is_instant(&self) -> bool {
        matches!(self, Period::Instant(_))
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Period::Duration { .. })
    }

    /// Instant date, or the end date of a bounded duration.
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Instant(d) | Period::Duration { end: d, .. } => Some(*d),
            Period::Forever => None,
        }
    }
}

/// Value of one dimension in a segment or scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DimensionValue {
    Explicit(QName),
    /// Serialized content of a typed member.
    Typed(String),
}

/// Segment or scenario content, split into XDT dimensions and everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextContainer {
    pub dimensions: BTreeMap<QName, DimensionValue>,
    /// Non-dimensional children, serialized.
    pub other: Vec<String>,
}

impl ContextContainer {
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.other.is_empty()
    }

    pub fn with_explicit(mut self, dimension: QName, member: QName) -> Self {
        self.dimensions.insert(dimension, DimensionValue::Explicit(member));
        self
    }

    pub fn with_typed(mut self, dimension: QName, value: impl Into<String>) -> Self {
        self.dimensions.insert(dimension, DimensionValue::Typed(value.into()));
        self
    }

    pub fn with_other(mut self, content: impl Into<String>) -> Self {
        self.other.push(content.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub scheme: String,
    pub identifier: String,
    pub segment: ContextContainer,
}

#[derive(Debug, Clone)]
pub struct Context {
    pub id: String,
    pub entity: Entity,
    pub period: Period,
    pub scenario: ContextContainer,
}

impl Context {
    pub fn new(
        id: impl Into<String>,
        scheme: impl Into<String>,
        identifier: impl Into<String>,
        period: Period,
    ) -> Self {
        Self {
            id: id.into(),
            entity: Entity {
                scheme: scheme.into(),
                identifier: identifier.into(),
                segment: ContextContainer::default(),
            },
            period,
            scenario: ContextContainer::default(),
        }
    }

    pub fn with_segment(mut self, segment: ContextContainer) -> Self {
        self.entity.segment = segment;
        self
    }

    pub fn with_scenario(mut self, scenario: ContextContainer) -> Self {
        self.scenario = scenario;
        self
    }

    /// Structural equality ignoring the id.
    pub fn s_equal(&self, other: &Context) -> bool {
        self.entity == other.entity && self.period == other.period && self.scenario == other.scenario
    }

    /// Dimension value from the segment, then the scenario.
    pub fn dimension(&self, dimension: &QName) -> Option<&DimensionValue> {
        self.entity.segment.dimensions.get(dimension).or_else(|| self.scenario.dimensions.get(dimension))
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &QName> {
        self.entity.segment.dimensions.keys().chain(self.scenario.dimensions.keys())
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: String,
    pub numerators: Vec<QName>,
    pub denominators: Vec<QName>,
}

impl Unit {
    pub fn new(id: impl Into<String>, measure: QName) -> Self {
        Self { id: id.into(), numerators: vec![measure], denominators: Vec::new() }
    }

    pub fn divide(id: impl Into<String>, numerators: Vec<QName>, denominators: Vec<QName>) -> Self {
        Self { id: id.into(), numerators, denominators }
    }

    /// Equality of measure multisets, ignoring order and id.
    pub fn s_equal(&self, other: &Unit) -> bool {
        fn sorted(measures: &[QName]) -> Vec<&QName> {
            let mut v: Vec<&QName> = measures.iter().collect();
            v.sort();
            v
        }
        sorted(&self.numerators) == sorted(&other.numerators)
            && sorted(&self.denominators) == sorted(&other.denominators)
    }

    /// Single numerator measure without denominator, if that is the shape.
    pub fn single_measure(&self) -> Option<&QName> {
        match (self.numerators.as_slice(), self.denominators.is_empty()) {
            ([m], true) => Some(m),
            _ => None,
        }
    }
}
