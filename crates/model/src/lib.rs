pub mod aspect;
pub mod context;
pub mod error;
pub mod instance;
pub mod qname;

pub use aspect::{Aspect, AspectModel, AspectSet};
pub use context::{Context, ContextContainer, DimensionValue, Entity, Period, Unit};
pub use error::ModelError;
pub use instance::{Element, ElementKind, FactId, Instance, InstanceBuilder};
pub use qname::{ISO4217_NS, QName, XBRLI_NS};
