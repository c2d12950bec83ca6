use std::collections::HashSet;

use super::error::SortError;
use super::field_order::FieldOrder;
use super::registry::{Direction, FieldKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortRule {
    pub field: FieldKey,
    pub direction: Direction,
}

impl SortRule {
    pub const fn new(field: FieldKey, direction: Direction) -> Self {
        Self { field, direction }
    }

    pub const fn asc(field: FieldKey) -> Self {
        Self::new(field, Direction::Ascending)
    }

    pub const fn desc(field: FieldKey) -> Self {
        Self::new(field, Direction::Descending)
    }
}

/// Ordered sort rules; the first rule is the primary key. Holds at most one
/// rule per field.
///
/// The draft and committed sets are separate values. Handing one to the
/// other is always an explicit clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<SortRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<SortRule>) -> Result<Self, SortError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.field) {
                return Err(SortError::DuplicateRule(rule.field));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[SortRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SortRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn direction_of(&self, field: FieldKey) -> Option<Direction> {
        self.rules
            .iter()
            .find(|rule| rule.field == field)
            .map(|rule| rule.direction)
    }

    pub fn contains(&self, field: FieldKey) -> bool {
        self.direction_of(field).is_some()
    }

    /// Replace the direction of an existing rule in place, or append a new
    /// rule at the end.
    pub fn set_direction(&mut self, field: FieldKey, direction: Direction) {
        match self.rules.iter_mut().find(|rule| rule.field == field) {
            Some(rule) => rule.direction = direction,
            None => self.rules.push(SortRule::new(field, direction)),
        }
    }

    /// Returns whether a rule was removed.
    pub fn clear_field(&mut self, field: FieldKey) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.field != field);
        self.rules.len() != before
    }

    pub fn clear_all(&mut self) {
        self.rules.clear();
    }

    /// Re-sort the rules to follow `order`. Rules whose field is missing from
    /// the order keep their relative position after the ordered ones.
    pub fn reconcile_order(&mut self, order: &FieldOrder) {
        self.rules
            .sort_by_key(|rule| order.position(rule.field).unwrap_or(usize::MAX));
    }

    /// Copy of this set sorted by `order`.
    pub fn ordered_by(&self, order: &FieldOrder) -> RuleSet {
        let mut ordered = self.clone();
        ordered.reconcile_order(order);
        ordered
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a SortRule;
    type IntoIter = std::slice::Iter<'a, SortRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::sort::field_order::DropPosition;
    use crate::sort::registry::{client_fields, CREATED_AT, ID, NAME, UPDATED_AT};

    #[test]
    fn set_direction_replaces_instead_of_appending() {
        let mut draft = RuleSet::new();
        draft.set_direction(NAME, Direction::Ascending);
        draft.set_direction(ID, Direction::Descending);
        draft.set_direction(NAME, Direction::Descending);
        assert_eq!(draft.rules(), &[SortRule::desc(NAME), SortRule::desc(ID)]);
    }

    #[test]
    fn clear_field_reports_removal() {
        let mut draft = RuleSet::from_rules(vec![SortRule::asc(NAME), SortRule::desc(ID)]).unwrap();
        assert!(draft.clear_field(NAME));
        assert!(!draft.clear_field(NAME));
        assert_eq!(draft.rules(), &[SortRule::desc(ID)]);
        draft.clear_all();
        assert!(draft.is_empty());
    }

    #[test]
    fn from_rules_rejects_duplicates() {
        let err = RuleSet::from_rules(vec![SortRule::asc(NAME), SortRule::desc(NAME)]).unwrap_err();
        assert_eq!(err, SortError::DuplicateRule(NAME));
    }

    #[test]
    fn reconcile_follows_field_order() {
        let registry = client_fields().unwrap();
        let mut order = registry.default_order();
        let mut draft = RuleSet::new();
        draft.set_direction(ID, Direction::Ascending);
        draft.set_direction(CREATED_AT, Direction::Descending);
        draft.set_direction(NAME, Direction::Ascending);

        draft.reconcile_order(&order);
        assert_eq!(
            draft.rules(),
            &[SortRule::asc(NAME), SortRule::desc(CREATED_AT), SortRule::asc(ID)]
        );

        order.reorder(ID, NAME, DropPosition::Before).unwrap();
        order.reorder(UPDATED_AT, ID, DropPosition::Before).unwrap();
        draft.reconcile_order(&order);
        assert_eq!(
            draft.rules(),
            &[SortRule::asc(ID), SortRule::asc(NAME), SortRule::desc(CREATED_AT)]
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(usize, bool),
        Clear(usize),
        ClearAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0usize..4, any::<bool>()).prop_map(|(k, asc)| Op::Set(k, asc)),
            2 => (0usize..4).prop_map(Op::Clear),
            1 => Just(Op::ClearAll),
        ]
    }

    proptest! {
        #[test]
        fn draft_never_holds_two_rules_for_one_field(ops in proptest::collection::vec(op(), 0..60)) {
            let keys = [NAME, CREATED_AT, UPDATED_AT, ID];
            let mut draft = RuleSet::new();
            for op in ops {
                match op {
                    Op::Set(k, asc) => {
                        let direction = if asc { Direction::Ascending } else { Direction::Descending };
                        draft.set_direction(keys[k], direction);
                    }
                    Op::Clear(k) => { draft.clear_field(keys[k]); }
                    Op::ClearAll => draft.clear_all(),
                }
                let fields: Vec<FieldKey> = draft.iter().map(|rule| rule.field).collect();
                prop_assert!(RuleSet::from_rules(draft.rules().to_vec()).is_ok(), "duplicates in {:?}", fields);
            }
        }
    }
}
