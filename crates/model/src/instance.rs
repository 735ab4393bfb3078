//! Arena representation of an XBRL instance document.
//!
//! Every element of interest (the `xbrli:xbrl` root, tuples and items) is
//! stored once and addressed by a [`FactId`]. Ids are assigned in document
//! order while the instance is built, so comparing ids compares document
//! position, and the id stays stable for the lifetime of the [`Instance`].
//!
//! ```
//! use xformula_model::{Context, InstanceBuilder, Period, QName};
//! use chrono::NaiveDate;
//!
//! let mut b = InstanceBuilder::new();
//! let date = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//! b.add_context(Context::new("c1", "http://www.sec.gov/CIK", "0001", Period::Instant(date)));
//! let fact = b.item(QName::local("Assets"), "c1", None, "100");
//! let instance = b.build().unwrap();
//! assert_eq!(instance.name(fact).unwrap().local, "Assets");
//! assert_eq!(instance.facts().count(), 1);
//! ```
use crate::context::{Context, Unit};
use crate::error::ModelError;
use crate::qname::{QName, XBRLI_NS};
use core::fmt;
use std::collections::HashMap;

/// Stable arena index of an element; equal ids mean the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactId(u32);

impl FactId {
    pub const ROOT: FactId = FactId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id for an arena position, `None` once positions exceed the id space.
    fn from_index(index: usize) -> Option<FactId> {
        u32::try_from(index).ok().map(FactId)
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Root,
    Tuple,
    Item,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    pub kind: ElementKind,
    pub parent: Option<FactId>,
    pub context_ref: Option<String>,
    pub unit_ref: Option<String>,
    pub value: String,
    pub nil: bool,
}

impl Element {
    pub fn is_fact(&self) -> bool {
        matches!(self.kind, ElementKind::Item | ElementKind::Tuple)
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    elements: Vec<Element>,
    contexts: HashMap<String, Context>,
    units: HashMap<String, Unit>,
}

impl Instance {
    pub fn element(&self, id: FactId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    pub fn contains(&self, id: FactId) -> bool {
        self.elements.get(id.index()).is_some_and(Element::is_fact)
    }

    /// Items and tuples in document order.
    pub fn facts(&self) -> impl Iterator<Item = FactId> + '_ {
        self.ids().filter(|id| self.elements[id.index()].is_fact())
    }

    pub fn items(&self) -> impl Iterator<Item = FactId> + '_ {
        self.ids().filter(|id| self.elements[id.index()].kind == ElementKind::Item)
    }

    pub fn name(&self, id: FactId) -> Option<&QName> {
        self.element(id).map(|e| &e.name)
    }

    pub fn parent(&self, id: FactId) -> Option<FactId> {
        self.element(id).and_then(|e| e.parent)
    }

    pub fn value(&self, id: FactId) -> Option<&str> {
        self.element(id).map(|e| e.value.as_str())
    }

    pub fn is_nil(&self, id: FactId) -> bool {
        self.element(id).is_some_and(|e| e.nil)
    }

    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn context_of(&self, fact: FactId) -> Option<&Context> {
        self.element(fact)?.context_ref.as_deref().and_then(|c| self.contexts.get(c))
    }

    pub fn unit_of(&self, fact: FactId) -> Option<&Unit> {
        self.element(fact)?.unit_ref.as_deref().and_then(|u| self.units.get(u))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    fn ids(&self) -> impl Iterator<Item = FactId> + '_ {
        (0..self.elements.len()).filter_map(FactId::from_index)
    }
}

/// Incremental builder; elements are appended in document order.
#[derive(Debug)]
pub struct InstanceBuilder {
    elements: Vec<Element>,
    contexts: Vec<Context>,
    units: Vec<Unit>,
    open: Vec<FactId>,
    overflow: bool,
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceBuilder {
    pub fn new() -> Self {
        let root = Element {
            name: QName::prefixed("xbrli", XBRLI_NS, "xbrl"),
            kind: ElementKind::Root,
            parent: None,
            context_ref: None,
            unit_ref: None,
            value: String::new(),
            nil: false,
        };
        Self { elements: vec![root], contexts: Vec::new(), units: Vec::new(), open: Vec::new(), overflow: false }
    }

    pub fn add_context(&mut self, context: Context) -> &mut Self {
        self.contexts.push(context);
        self
    }

    pub fn add_unit(&mut self, unit: Unit) -> &mut Self {
        self.units.push(unit);
        self
    }

    pub fn item(&mut self, concept: QName, context: &str, unit: Option<&str>, value: &str) -> FactId {
        self.push(Element {
            name: concept,
            kind: ElementKind::Item,
            parent: None,
            context_ref: Some(context.to_string()),
            unit_ref: unit.map(str::to_string),
            value: value.to_string(),
            nil: false,
        })
    }

    pub fn nil_item(&mut self, concept: QName, context: &str, unit: Option<&str>) -> FactId {
        self.push(Element {
            name: concept,
            kind: ElementKind::Item,
            parent: None,
            context_ref: Some(context.to_string()),
            unit_ref: unit.map(str::to_string),
            value: String::new(),
            nil: true,
        })
    }

    /// Opens a tuple; subsequent elements become its children until [`end_tuple`](Self::end_tuple).
    pub fn begin_tuple(&mut self, name: QName) -> FactId {
        let id = self.push(Element {
            name,
            kind: ElementKind::Tuple,
            parent: None,
            context_ref: None,
            unit_ref: None,
            value: String::new(),
            nil: false,
        });
        self.open.push(id);
        id
    }

    pub fn end_tuple(&mut self) -> Result<FactId, ModelError> {
        self.open.pop().ok_or(ModelError::NoOpenTuple)
    }

    /// Appends an element. Past the id space nothing is stored and
    /// [`build`](Self::build) fails with [`ModelError::TooManyElements`].
    fn push(&mut self, mut element: Element) -> FactId {
        let Some(id) = FactId::from_index(self.elements.len()) else {
            self.overflow = true;
            return FactId(u32::MAX);
        };
        element.parent = Some(self.open.last().copied().unwrap_or(FactId::ROOT));
        self.elements.push(element);
        id
    }

    pub fn build(self) -> Result<Instance, ModelError> {
        if self.overflow {
            return Err(ModelError::TooManyElements { max: u64::from(u32::MAX) + 1 });
        }
        if !self.open.is_empty() {
            return Err(ModelError::UnclosedTuple { open: self.open.len() });
        }
        let mut contexts = HashMap::with_capacity(self.contexts.len());
        for c in self.contexts {
            if contexts.contains_key(&c.id) {
                return Err(ModelError::DuplicateContext(c.id));
            }
            contexts.insert(c.id.clone(), c);
        }
        let mut units = HashMap::with_capacity(self.units.len());
        for u in self.units {
            if units.contains_key(&u.id) {
                return Err(ModelError::DuplicateUnit(u.id));
            }
            units.insert(u.id.clone(), u);
        }
        for e in &self.elements {
            if let Some(c) = &e.context_ref
                && !contexts.contains_key(c)
            {
                return Err(ModelError::UnknownContext { fact: e.name.to_string(), context: c.clone() });
            }
            if let Some(u) = &e.unit_ref
                && !units.contains_key(u)
            {
                return Err(ModelError::UnknownUnit { fact: e.name.to_string(), unit: u.clone() });
            }
        }
        Ok(Instance { elements: self.elements, contexts, units })
    }
}
