//! Draft/commit state machine behind the sort dropdown.
//!
//! A session starts from a copy of the host's committed rules. Every edit
//! lands in the session's draft; only [`SortConfigurator::apply`] hands a new
//! rule set back to the host, and [`SortConfigurator::dismiss`] throws the
//! draft away.

use tracing::debug;

use super::error::SortError;
use super::field_order::{DropPosition, FieldOrder};
use super::registry::{Direction, FieldKey, FieldRegistry};
use super::rule::RuleSet;

/// State of one open dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    draft: RuleSet,
    field_order: FieldOrder,
}

impl Session {
    pub fn draft(&self) -> &RuleSet {
        &self.draft
    }

    pub fn field_order(&self) -> &FieldOrder {
        &self.field_order
    }

    /// Draft rules ordered by the session's field order.
    pub fn ordered_rules(&self) -> RuleSet {
        self.draft.ordered_by(&self.field_order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open(Session),
}

/// Payload handed to the host when a session is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSort {
    /// New committed rule set, in field-order precedence.
    pub rules: RuleSet,
    /// Field order at the time of applying, for seeding the next session.
    pub field_order: FieldOrder,
}

/// Presentation state of one direction button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: &'static str,
    pub direction: Direction,
    pub selected: bool,
}

/// Presentation state of one field row, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub key: FieldKey,
    pub label: &'static str,
    pub icon: &'static str,
    pub active: Option<Direction>,
    pub options: Vec<OptionView>,
}

impl FieldView {
    pub fn is_selected(&self) -> bool {
        self.active.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SortConfigurator {
    registry: FieldRegistry,
    state: SessionState,
}

impl SortConfigurator {
    pub fn new(registry: FieldRegistry) -> Self {
        Self {
            registry,
            state: SessionState::Closed,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Open(session) => Some(session),
            SessionState::Closed => None,
        }
    }

    /// Start a session seeded from the committed rules and the last-known
    /// field order. Returns `Ok(false)` if a session is already open; the
    /// running session is left alone.
    pub fn open(&mut self, committed: &RuleSet, field_order: &FieldOrder) -> Result<bool, SortError> {
        if self.is_open() {
            return Ok(false);
        }
        field_order.validate(&self.registry)?;
        if let Some(rule) = committed.iter().find(|rule| !self.registry.contains(rule.field)) {
            return Err(SortError::UnknownField(rule.field));
        }

        let session = Session {
            draft: committed.ordered_by(field_order),
            field_order: field_order.clone(),
        };
        debug!(rules = session.draft.len(), "sort session opened");
        self.state = SessionState::Open(session);
        Ok(true)
    }

    /// Set the draft direction for `field`.
    pub fn toggle_field(&mut self, field: FieldKey, direction: Direction) -> Result<(), SortError> {
        let descriptor = self.registry.require(field)?;
        if !descriptor.allows(direction) {
            return Err(SortError::UnrecognizedDirection(direction.token().to_string()));
        }
        let session = self.session_mut()?;
        session.draft.set_direction(field, direction);
        Ok(())
    }

    /// Like [`Self::toggle_field`], but from a token or option label.
    pub fn toggle_field_token(&mut self, field: FieldKey, token: &str) -> Result<(), SortError> {
        let direction = self.registry.resolve_direction(field, token)?;
        self.toggle_field(field, direction)
    }

    /// Returns whether a rule was removed.
    pub fn clear_field(&mut self, field: FieldKey) -> Result<bool, SortError> {
        self.registry.require(field)?;
        let session = self.session_mut()?;
        Ok(session.draft.clear_field(field))
    }

    pub fn clear_all(&mut self) -> Result<(), SortError> {
        let session = self.session_mut()?;
        session.draft.clear_all();
        Ok(())
    }

    /// Move `source` next to `target` and re-sort the draft to match.
    pub fn drag_reorder(
        &mut self,
        source: FieldKey,
        target: FieldKey,
        position: DropPosition,
    ) -> Result<bool, SortError> {
        let session = self.session_mut()?;
        let moved = session.field_order.reorder(source, target, position)?;
        if moved {
            session.draft.reconcile_order(&session.field_order);
        }
        Ok(moved)
    }

    /// Keyboard step; swaps `field` with the neighbour above.
    pub fn step_up(&mut self, field: FieldKey) -> Result<bool, SortError> {
        let session = self.session_mut()?;
        let moved = session.field_order.move_up(field)?;
        if moved {
            session.draft.reconcile_order(&session.field_order);
        }
        Ok(moved)
    }

    /// Keyboard step; swaps `field` with the neighbour below.
    pub fn step_down(&mut self, field: FieldKey) -> Result<bool, SortError> {
        let session = self.session_mut()?;
        let moved = session.field_order.move_down(field)?;
        if moved {
            session.draft.reconcile_order(&session.field_order);
        }
        Ok(moved)
    }

    /// Close the session and return the rules to commit. `None` when no
    /// session was open, so a stale second call can never commit twice.
    pub fn apply(&mut self) -> Option<AppliedSort> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Open(session) => {
                let rules = session.ordered_rules();
                debug!(rules = rules.len(), "sort session applied");
                Some(AppliedSort {
                    rules,
                    field_order: session.field_order,
                })
            }
            SessionState::Closed => None,
        }
    }

    /// Discard the session's draft. The field order survives: any reorder
    /// steps already taken are handed back so the host can seed the next
    /// session with them. `None` when already closed.
    pub fn dismiss(&mut self) -> Option<FieldOrder> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Open(session) => {
                debug!(dropped = session.draft.len(), "sort session dismissed");
                Some(session.field_order)
            }
            SessionState::Closed => None,
        }
    }

    /// Per-field presentation state in the session's field order. Empty
    /// while closed.
    pub fn field_views(&self) -> Vec<FieldView> {
        let Some(session) = self.session() else {
            return Vec::new();
        };
        session
            .field_order
            .keys()
            .iter()
            .filter_map(|key| self.registry.get(*key))
            .map(|descriptor| {
                let active = session.draft.direction_of(descriptor.key);
                FieldView {
                    key: descriptor.key,
                    label: descriptor.label,
                    icon: descriptor.icon,
                    active,
                    options: descriptor
                        .directions
                        .iter()
                        .map(|opt| OptionView {
                            label: opt.label,
                            direction: opt.direction,
                            selected: active == Some(opt.direction),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    fn session_mut(&mut self) -> Result<&mut Session, SortError> {
        match &mut self.state {
            SessionState::Open(session) => Ok(session),
            SessionState::Closed => Err(SortError::SessionClosed),
        }
    }
}
