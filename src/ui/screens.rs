use std::collections::HashSet;

use tracing::warn;

use crate::models::{Client, ClientTab};
use crate::sort::{
    AppliedSort, DataQualityIssue, FieldOrder, FieldRegistry, MultiKeyComparator, RuleSet,
    SortError,
};

/// Host table state: the dataset plus everything derived from it (tab,
/// search, committed sort, row selection).
pub(crate) struct ClientTableScreen {
    pub(crate) registry: FieldRegistry,
    pub(crate) clients: Vec<Client>,
    pub(crate) visible: Vec<Client>,
    pub(crate) tab: ClientTab,
    pub(crate) filter: Option<String>,
    committed: RuleSet,
    comparator: MultiKeyComparator,
    field_order: FieldOrder,
    pub(crate) checked: HashSet<i64>,
    pub(crate) selected: usize,
    pub(crate) issues: Vec<DataQualityIssue>,
}

impl ClientTableScreen {
    pub(crate) fn new(registry: FieldRegistry, clients: Vec<Client>) -> Result<Self, SortError> {
        let committed = RuleSet::new();
        let comparator = MultiKeyComparator::new(&registry, &committed)?;
        let mut screen = Self {
            field_order: registry.default_order(),
            registry,
            clients,
            visible: Vec::new(),
            tab: ClientTab::All,
            filter: None,
            committed,
            comparator,
            checked: HashSet::new(),
            selected: 0,
            issues: Vec::new(),
        };
        screen.apply_filter();
        Ok(screen)
    }

    pub(crate) fn committed(&self) -> &RuleSet {
        &self.committed
    }

    pub(crate) fn field_order(&self) -> &FieldOrder {
        &self.field_order
    }

    /// Recompute the visible rows: tab, then search, then the committed sort.
    pub(crate) fn apply_filter(&mut self) {
        let query = self
            .filter
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let rows: Vec<Client> = self
            .clients
            .iter()
            .filter(|c| self.tab.admits(c))
            .filter(|c| query.as_deref().map_or(true, |q| c.matches_query(q)))
            .cloned()
            .collect();

        let sorted = self.comparator.sort(rows);
        for issue in &sorted.issues {
            warn!(%issue, "unreadable value while sorting clients");
        }
        self.visible = sorted.records;
        self.issues = sorted.issues;
        self.ensure_in_bounds();
    }

    /// Store a rule set emitted by the sort dropdown. This is the only place
    /// the committed rules change.
    pub(crate) fn commit_sort(&mut self, applied: AppliedSort) -> Result<(), SortError> {
        let comparator = MultiKeyComparator::new(&self.registry, &applied.rules)?;
        self.comparator = comparator;
        self.committed = applied.rules;
        self.field_order = applied.field_order;
        self.apply_filter();
        Ok(())
    }

    /// Keep the field order from a dismissed session. The committed rules
    /// stay as they are.
    pub(crate) fn remember_order(&mut self, order: FieldOrder) -> Result<(), SortError> {
        order.validate(&self.registry)?;
        self.field_order = order;
        Ok(())
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
        self.apply_filter();
    }

    pub(crate) fn set_tab(&mut self, tab: ClientTab) {
        self.tab = tab;
        self.selected = 0;
        self.apply_filter();
    }

    pub(crate) fn cycle_tab(&mut self, offset: isize) {
        self.set_tab(self.tab.cycle(offset));
    }

    pub(crate) fn set_clients(&mut self, clients: Vec<Client>) {
        let ids: HashSet<i64> = clients.iter().map(|c| c.id).collect();
        self.checked.retain(|id| ids.contains(id));
        self.clients = clients;
        self.apply_filter();
    }

    pub(crate) fn current_client(&self) -> Option<&Client> {
        self.visible.get(self.selected)
    }

    pub(crate) fn is_checked(&self, id: i64) -> bool {
        self.checked.contains(&id)
    }

    pub(crate) fn toggle_current(&mut self) {
        if let Some(id) = self.current_client().map(|c| c.id) {
            if !self.checked.remove(&id) {
                self.checked.insert(id);
            }
        }
    }

    /// True when there is at least one visible row and every one is checked.
    pub(crate) fn all_checked(&self) -> bool {
        !self.visible.is_empty() && self.visible.iter().all(|c| self.checked.contains(&c.id))
    }

    /// Uncheck everything if all visible rows are checked, otherwise check
    /// exactly the visible rows.
    pub(crate) fn toggle_all(&mut self) {
        if self.all_checked() {
            self.checked.clear();
        } else {
            self.checked = self.visible.iter().map(|c| c.id).collect();
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.visible.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.visible.is_empty() {
            self.selected = self.visible.len() - 1;
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}
