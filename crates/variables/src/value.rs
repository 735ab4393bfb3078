use chrono::NaiveDate;
use core::fmt;
use xformula_model::{FactId, QName};

/// Atomic values produced by general variables, parameters and fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    Boolean(bool),
    String(String),
    Integer(i64),
    Decimal(f64),
    Double(f64),
    Date(NaiveDate),
    QName(QName),
}

pub type Sequence = Vec<Item>;

/// One item of a variable value: a fact from the instance or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Fact(FactId),
    Atomic(AtomicValue),
}

impl Item {
    pub fn as_fact(&self) -> Option<FactId> {
        match self {
            Item::Fact(f) => Some(*f),
            Item::Atomic(_) => None,
        }
    }
}

impl From<FactId> for Item {
    fn from(f: FactId) -> Self {
        Item::Fact(f)
    }
}

impl From<AtomicValue> for Item {
    fn from(a: AtomicValue) -> Self {
        Item::Atomic(a)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Fact(id) => write!(f, "fact{id}"),
            Item::Atomic(a) => write!(f, "{a:?}"),
        }
    }
}

/// Fact items of a sequence, in order.
pub fn facts_of(seq: &[Item]) -> impl Iterator<Item = FactId> + '_ {
    seq.iter().filter_map(Item::as_fact)
}
