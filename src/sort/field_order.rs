use super::error::SortError;
use super::registry::{FieldKey, FieldRegistry};

/// Where the dragged field lands relative to the field it was dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    After,
}

/// Canonical precedence of every sortable field. Always a permutation of the
/// registry keys; selecting or clearing rules never adds or removes entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOrder {
    keys: Vec<FieldKey>,
}

impl FieldOrder {
    pub fn from_registry(registry: &FieldRegistry) -> Self {
        Self {
            keys: registry.iter().map(|field| field.key).collect(),
        }
    }

    /// Accept a previously stored order if it still covers the registry
    /// exactly once per key.
    pub fn from_keys(registry: &FieldRegistry, keys: Vec<FieldKey>) -> Result<Self, SortError> {
        let order = Self { keys };
        order.validate(registry)?;
        Ok(order)
    }

    pub(crate) fn validate(&self, registry: &FieldRegistry) -> Result<(), SortError> {
        for (idx, key) in self.keys.iter().enumerate() {
            if !registry.contains(*key) || self.keys[..idx].contains(key) {
                return Err(SortError::FieldOrderMismatch(*key));
            }
        }
        if let Some(missing) = registry
            .iter()
            .map(|field| field.key)
            .find(|key| !self.keys.contains(key))
        {
            return Err(SortError::FieldOrderMismatch(missing));
        }
        Ok(())
    }

    pub fn keys(&self) -> &[FieldKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: FieldKey) -> Option<usize> {
        self.keys.iter().position(|candidate| *candidate == key)
    }

    pub fn get(&self, index: usize) -> Option<FieldKey> {
        self.keys.get(index).copied()
    }

    /// Move `source` so that it sits directly before or after `target`.
    ///
    /// Returns `Ok(false)` when nothing moved, either because both keys are
    /// the same or because `source` already occupies the requested slot.
    pub fn reorder(
        &mut self,
        source: FieldKey,
        target: FieldKey,
        position: DropPosition,
    ) -> Result<bool, SortError> {
        let from = self.position(source).ok_or(SortError::UnknownField(source))?;
        if self.position(target).is_none() {
            return Err(SortError::UnknownField(target));
        }
        if source == target {
            return Ok(false);
        }

        let moved = self.keys.remove(from);
        // `target` is still present, so the lookup cannot miss.
        let anchor = self
            .position(target)
            .ok_or(SortError::UnknownField(target))?;
        let insert_at = match position {
            DropPosition::Before => anchor,
            DropPosition::After => anchor + 1,
        };
        self.keys.insert(insert_at, moved);
        Ok(insert_at != from)
    }

    /// Keyboard step: swap `key` with the neighbour above it.
    pub fn move_up(&mut self, key: FieldKey) -> Result<bool, SortError> {
        let idx = self.position(key).ok_or(SortError::UnknownField(key))?;
        match idx.checked_sub(1).and_then(|above| self.get(above)) {
            Some(neighbour) => self.reorder(key, neighbour, DropPosition::Before),
            None => Ok(false),
        }
    }

    /// Keyboard step: swap `key` with the neighbour below it.
    pub fn move_down(&mut self, key: FieldKey) -> Result<bool, SortError> {
        let idx = self.position(key).ok_or(SortError::UnknownField(key))?;
        match self.get(idx + 1) {
            Some(neighbour) => self.reorder(key, neighbour, DropPosition::After),
            None => Ok(false),
        }
    }
}
