use thiserror::Error;

/// Errors detected while assembling an [`Instance`](crate::Instance).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("fact '{fact}' references unknown context '{context}'")]
    UnknownContext { fact: String, context: String },
    #[error("fact '{fact}' references unknown unit '{unit}'")]
    UnknownUnit { fact: String, unit: String },
    #[error("duplicate context id '{0}'")]
    DuplicateContext(String),
    #[error("duplicate unit id '{0}'")]
    DuplicateUnit(String),
    #[error("unbalanced tuple nesting: {open} tuple(s) left open")]
    UnclosedTuple { open: usize },
    #[error("end_tuple called without an open tuple")]
    NoOpenTuple,
    #[error("instance holds more than {max} elements")]
    TooManyElements { max: u64 },
}
