//! Multi-field sort engine: field registry, drag-reorderable field order,
//! draft rule editing, and the comparator that applies committed rules.

mod comparator;
mod configurator;
mod error;
mod field_order;
pub mod registry;
mod rule;

pub use comparator::{
    parse_instant, DataQualityIssue, FieldValue, MultiKeyComparator, SortRecord, Sorted,
};
pub use configurator::{
    AppliedSort, FieldView, OptionView, Session, SessionState, SortConfigurator,
};
pub use error::SortError;
pub use field_order::{DropPosition, FieldOrder};
pub use registry::{
    client_fields, Direction, DirectionOption, FieldKey, FieldRegistry, SortFieldDescriptor,
    ValueKind,
};
pub use rule::{RuleSet, SortRule};
