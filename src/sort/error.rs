use thiserror::Error;

use super::registry::FieldKey;

/// Failures raised by the sort engine. None of them are applied partially:
/// whenever an operation returns an error the draft and field order are left
/// exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("unknown sort field `{0}`")]
    UnknownField(FieldKey),
    #[error("unrecognized sort direction `{0}`")]
    UnrecognizedDirection(String),
    #[error("sort field `{0}` is registered more than once")]
    DuplicateField(FieldKey),
    #[error("the sort field registry is empty")]
    EmptyRegistry,
    #[error("sort field `{field}` declares {count} direction(s); at least two are required")]
    TooFewDirections { field: FieldKey, count: usize },
    #[error("sort field `{0}` lists the same direction twice")]
    DuplicateDirection(FieldKey),
    #[error("rule set contains more than one rule for `{0}`")]
    DuplicateRule(FieldKey),
    #[error("field order does not cover the registry (missing or extra `{0}`)")]
    FieldOrderMismatch(FieldKey),
    #[error("the sort dropdown is not open")]
    SessionClosed,
}
