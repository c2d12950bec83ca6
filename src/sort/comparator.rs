//! Stable multi-key ordering derived from a committed rule set.
//!
//! Values that cannot be interpreted for their field's [`ValueKind`] (a date
//! that does not parse, a non-numeric id) are never an error here. They sort
//! after every readable value, in both directions, and are reported back as
//! [`DataQualityIssue`]s so the host can surface them.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::SortError;
use super::registry::{Direction, FieldKey, FieldRegistry, ValueKind};
use super::rule::RuleSet;

/// Raw value a record exposes for a sortable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
}

/// Implemented by anything that can be ordered by the comparator.
pub trait SortRecord {
    /// `None` when the record has no value for `field`; such records sort
    /// last for that rule.
    fn field_value(&self, field: FieldKey) -> Option<FieldValue<'_>>;
}

/// A record value that could not be read as its field's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityIssue {
    /// Position of the record in the input passed to [`MultiKeyComparator::sort`].
    pub row: usize,
    pub field: FieldKey,
    pub value: String,
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: `{}` is not a valid {} value",
            self.row, self.value, self.field
        )
    }
}

/// Output of [`MultiKeyComparator::sort`].
#[derive(Debug)]
pub struct Sorted<T> {
    pub records: Vec<T>,
    pub issues: Vec<DataQualityIssue>,
}

/// Parse the timestamp shapes used by the client dataset: RFC 3339,
/// `YYYY-MM-DDTHH:MM[:SS]`, or a bare `YYYY-MM-DD` (taken as midnight).
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Comparable form of one field value.
#[derive(Debug, Clone, PartialEq)]
enum Key {
    Text(String),
    Integer(i64),
    Float(f64),
    Instant(NaiveDateTime),
    /// Present but unreadable for the field's kind.
    Invalid,
    Missing,
}

impl Key {
    fn extract(kind: ValueKind, value: Option<FieldValue<'_>>) -> Self {
        let Some(value) = value else {
            return Key::Missing;
        };
        match (kind, value) {
            (ValueKind::Text, FieldValue::Text(text)) => Key::Text(text.to_string()),
            (ValueKind::Text, FieldValue::Integer(n)) => Key::Text(n.to_string()),
            (ValueKind::Text, FieldValue::Float(n)) => Key::Text(n.to_string()),
            (ValueKind::Temporal, FieldValue::Text(text)) => {
                parse_instant(text).map_or(Key::Invalid, Key::Instant)
            }
            (ValueKind::Temporal, _) => Key::Invalid,
            (ValueKind::Numeric, FieldValue::Integer(n)) => Key::Integer(n),
            (ValueKind::Numeric, FieldValue::Float(n)) if !n.is_nan() => Key::Float(n),
            (ValueKind::Numeric, FieldValue::Float(_)) => Key::Invalid,
            (ValueKind::Numeric, FieldValue::Text(text)) => {
                let trimmed = text.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    Key::Integer(n)
                } else {
                    match trimmed.parse::<f64>() {
                        Ok(n) if !n.is_nan() => Key::Float(n),
                        _ => Key::Invalid,
                    }
                }
            }
        }
    }

    fn is_readable(&self) -> bool {
        !matches!(self, Key::Invalid | Key::Missing)
    }

    /// Compare two keys of the same field. Unreadable keys go last no matter
    /// the direction, which keeps the ordering total.
    fn compare(&self, other: &Key, direction: Direction) -> Ordering {
        match (self.is_readable(), other.is_readable()) {
            (false, false) => return Ordering::Equal,
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            (true, true) => {}
        }

        let natural = match (self, other) {
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::Instant(a), Key::Instant(b)) => a.cmp(b),
            (Key::Float(a), Key::Float(b)) => a.total_cmp(b),
            (Key::Integer(a), Key::Float(b)) => compare_int_float(*a, *b),
            (Key::Float(a), Key::Integer(b)) => compare_int_float(*b, *a).reverse(),
            // Keys of one field always share a kind; fall back to Equal.
            _ => Ordering::Equal,
        };

        match direction {
            Direction::Ascending => natural,
            Direction::Descending => natural.reverse(),
        }
    }
}

/// Exact `int` vs `float` ordering. Casting the integer to `f64` rounds
/// above 2^53, so the float's integer part and fraction are compared
/// instead. `float` is never NaN here.
fn compare_int_float(int: i64, float: f64) -> Ordering {
    // 2^63 is exact as f64; everything in [-2^63, 2^63) truncates into i64.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float >= BOUND {
        return Ordering::Less;
    }
    if float < -BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => (float - whole)
            .partial_cmp(&0.0)
            .map_or(Ordering::Equal, Ordering::reverse),
        unequal => unequal,
    }
}

#[derive(Debug, Clone, Copy)]
struct ResolvedRule {
    field: FieldKey,
    kind: ValueKind,
    direction: Direction,
}

/// Comparator for a committed [`RuleSet`]. An empty rule set compares every
/// pair as equal, so [`MultiKeyComparator::sort`] returns the input order.
#[derive(Debug, Clone)]
pub struct MultiKeyComparator {
    rules: Vec<ResolvedRule>,
}

impl MultiKeyComparator {
    pub fn new(registry: &FieldRegistry, rules: &RuleSet) -> Result<Self, SortError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let descriptor = registry.require(rule.field)?;
                Ok(ResolvedRule {
                    field: rule.field,
                    kind: descriptor.kind,
                    direction: rule.direction,
                })
            })
            .collect::<Result<Vec<_>, SortError>>()?;
        Ok(Self { rules })
    }

    pub fn is_identity(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn compare<T: SortRecord>(&self, a: &T, b: &T) -> Ordering {
        for rule in &self.rules {
            let left = Key::extract(rule.kind, a.field_value(rule.field));
            let right = Key::extract(rule.kind, b.field_value(rule.field));
            let ordering = left.compare(&right, rule.direction);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort of `records`. Each value is read once; unreadable ones are
    /// collected into [`Sorted::issues`] in input order.
    pub fn sort<T: SortRecord>(&self, records: Vec<T>) -> Sorted<T> {
        if self.rules.is_empty() {
            return Sorted {
                records,
                issues: Vec::new(),
            };
        }

        let mut issues = Vec::new();
        let mut decorated: Vec<(Vec<Key>, T)> = records
            .into_iter()
            .enumerate()
            .map(|(row, record)| {
                let keys = self
                    .rules
                    .iter()
                    .map(|rule| {
                        let value = record.field_value(rule.field);
                        let key = Key::extract(rule.kind, value);
                        if key == Key::Invalid {
                            issues.push(DataQualityIssue {
                                row,
                                field: rule.field,
                                value: describe(value),
                            });
                        }
                        key
                    })
                    .collect();
                (keys, record)
            })
            .collect();

        decorated.sort_by(|(left, _), (right, _)| {
            self.rules
                .iter()
                .zip(left.iter().zip(right.iter()))
                .map(|(rule, (a, b))| a.compare(b, rule.direction))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        Sorted {
            records: decorated.into_iter().map(|(_, record)| record).collect(),
            issues,
        }
    }
}

fn describe(value: Option<FieldValue<'_>>) -> String {
    match value {
        Some(FieldValue::Text(text)) => text.to_string(),
        Some(FieldValue::Integer(n)) => n.to_string(),
        Some(FieldValue::Float(n)) => n.to_string(),
        None => String::new(),
    }
}
