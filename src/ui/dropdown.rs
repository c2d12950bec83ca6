use std::mem;

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use tracing::debug;

use crate::sort::{
    AppliedSort, FieldKey, FieldOrder, FieldRegistry, FieldView, RuleSet, SortConfigurator,
    SortError,
};

use super::gesture::{
    option_text, DropdownLayout, Hit, KeyboardGrip, PointerDrag, APPLY_LABEL,
    CLEAR_ALL_LABEL, FIELD_ROWS, OPTION_GAP, OPTION_INDENT,
};

/// What the host should do after the dropdown handled an event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DropdownOutcome {
    Stay,
    Applied(AppliedSort),
    /// Closed without applying; carries the field order as the user left it.
    Dismissed(FieldOrder),
}

/// Terminal front end of the sort configurator. Owns the cursor, any drag in
/// progress and the outside-click listener; all rule state lives in the
/// configurator.
///
/// The listener is bound in [`SortDropdown::open`] and released before any
/// apply or dismiss outcome is returned, so a press arriving after the
/// session closed can never dismiss a second time.
pub(crate) struct SortDropdown {
    configurator: SortConfigurator,
    cursor: usize,
    option: usize,
    grip: Option<KeyboardGrip>,
    drag: Option<PointerDrag>,
    listening: bool,
    sessions: u64,
}

impl SortDropdown {
    pub(crate) fn new(registry: FieldRegistry) -> Self {
        Self {
            configurator: SortConfigurator::new(registry),
            cursor: 0,
            option: 0,
            grip: None,
            drag: None,
            listening: false,
            sessions: 0,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.configurator.is_open()
    }

    pub(crate) fn views(&self) -> Vec<FieldView> {
        self.configurator.field_views()
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening
    }

    pub(crate) fn open(&mut self, committed: &RuleSet, order: &FieldOrder) -> Result<bool, SortError> {
        if !self.configurator.open(committed, order)? {
            return Ok(false);
        }
        self.sessions += 1;
        self.listening = true;
        self.cursor = 0;
        self.sync_option();
        debug!(session = self.sessions, "outside-click listener bound");
        Ok(true)
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Result<DropdownOutcome, SortError> {
        if !self.is_open() {
            return Ok(DropdownOutcome::Stay);
        }

        if let Some(grip) = self.grip {
            match code {
                KeyCode::Up => {
                    self.configurator.step_up(grip.field)?;
                    self.follow(grip.field);
                }
                KeyCode::Down => {
                    self.configurator.step_down(grip.field)?;
                    self.follow(grip.field);
                }
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Esc => self.grip = None,
                _ => {}
            }
            return Ok(DropdownOutcome::Stay);
        }

        match code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('S') => {
                return Ok(self.dismiss());
            }
            KeyCode::Char('a') | KeyCode::Char('A') => return Ok(self.apply()),
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.sync_option();
            }
            KeyCode::Down => {
                let last = self.views().len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(last);
                self.sync_option();
            }
            KeyCode::Left => self.option = self.option.saturating_sub(1),
            KeyCode::Right => {
                if let Some(view) = self.current_view() {
                    self.option = (self.option + 1).min(view.options.len().saturating_sub(1));
                }
            }
            KeyCode::Enter => {
                if let Some(view) = self.current_view() {
                    if let Some(opt) = view.options.get(self.option) {
                        self.configurator.toggle_field(view.key, opt.direction)?;
                    }
                }
            }
            KeyCode::Char(' ') => {
                if let Some(view) = self.current_view() {
                    self.grip = Some(KeyboardGrip { field: view.key });
                }
            }
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                if let Some(view) = self.current_view() {
                    self.configurator.clear_field(view.key)?;
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => self.configurator.clear_all()?,
            _ => {}
        }
        Ok(DropdownOutcome::Stay)
    }

    pub(crate) fn handle_mouse(
        &mut self,
        event: MouseEvent,
        frame: Rect,
    ) -> Result<DropdownOutcome, SortError> {
        if !self.is_open() {
            return Ok(DropdownOutcome::Stay);
        }
        let layout = DropdownLayout::compute(frame, &self.views());

        match event.kind {
            MouseEventKind::Down(button) => {
                if self.listening && layout.hit(event.column, event.row) == Hit::Outside {
                    return Ok(self.dismiss());
                }
                if button != MouseButton::Left {
                    return Ok(DropdownOutcome::Stay);
                }
                match layout.hit(event.column, event.row) {
                    Hit::Handle(key) => {
                        self.grip = None;
                        self.drag = Some(PointerDrag { source: key });
                        self.follow(key);
                    }
                    Hit::Option(key, direction) => {
                        self.configurator.toggle_field(key, direction)?;
                        self.follow(key);
                    }
                    Hit::Clear(key) => {
                        self.configurator.clear_field(key)?;
                    }
                    Hit::ClearAll => self.configurator.clear_all()?,
                    Hit::Apply => return Ok(self.apply()),
                    Hit::Inside | Hit::Outside => {}
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(drag) = self.drag {
                    if let Some((source, target, position)) = drag.step(&layout, event.row) {
                        self.configurator.drag_reorder(source, target, position)?;
                        self.follow(source);
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag = None,
            _ => {}
        }
        Ok(DropdownOutcome::Stay)
    }

    /// Close through apply. Releases the listener before returning.
    fn apply(&mut self) -> DropdownOutcome {
        self.release();
        match self.configurator.apply() {
            Some(applied) => DropdownOutcome::Applied(applied),
            None => DropdownOutcome::Stay,
        }
    }

    /// Close through cancel or an outside press.
    fn dismiss(&mut self) -> DropdownOutcome {
        self.release();
        match self.configurator.dismiss() {
            Some(order) => DropdownOutcome::Dismissed(order),
            None => DropdownOutcome::Stay,
        }
    }

    fn release(&mut self) {
        if mem::take(&mut self.listening) {
            debug!(session = self.sessions, "outside-click listener released");
        }
        self.grip = None;
        self.drag = None;
    }

    fn current_view(&self) -> Option<FieldView> {
        self.views().into_iter().nth(self.cursor)
    }

    /// Point the cursor at `key` wherever it now sits.
    fn follow(&mut self, key: FieldKey) {
        if let Some(idx) = self.views().iter().position(|view| view.key == key) {
            self.cursor = idx;
            self.sync_option();
        }
    }

    /// Put the option cursor on the active direction, or the first option.
    fn sync_option(&mut self) {
        self.option = self
            .current_view()
            .and_then(|view| {
                view.options
                    .iter()
                    .position(|opt| Some(opt.direction) == view.active)
            })
            .unwrap_or(0);
    }

    pub(crate) fn draw(&self, frame: &mut Frame, area: Rect) {
        if !self.is_open() {
            return;
        }
        let views = self.views();
        let layout = DropdownLayout::compute(area, &views);
        frame.render_widget(Clear, layout.region);

        let inner_width = layout.inner.width as usize;
        let mut lines: Vec<Line<'static>> = Vec::with_capacity(views.len() * FIELD_ROWS as usize + 2);

        for (idx, view) in views.iter().enumerate() {
            let focused = idx == self.cursor;
            let gripped = self.grip.is_some_and(|grip| grip.field == view.key)
                || self.drag.is_some_and(|drag| drag.source == view.key);

            let handle = if gripped { "↕  " } else { "≡  " };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let left = format!("{} {}", view.icon, view.label);
            let mut header = vec![
                Span::styled(handle, Style::default().fg(Color::DarkGray)),
                Span::styled(left.clone(), label_style),
            ];
            if view.is_selected() {
                let used = 3 + left.chars().count();
                let pad = inner_width.saturating_sub(used + 2);
                header.push(Span::raw(" ".repeat(pad)));
                header.push(Span::styled("× ", Style::default().fg(Color::Gray)));
            }
            lines.push(Line::from(header));

            let mut options = vec![Span::raw(" ".repeat(OPTION_INDENT as usize))];
            for (opt_idx, opt) in view.options.iter().enumerate() {
                let mut style = if opt.selected {
                    Style::default()
                        .bg(Color::Gray)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                if focused && opt_idx == self.option {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                options.push(Span::styled(option_text(opt.label, opt.selected), style));
                options.push(Span::raw(" ".repeat(OPTION_GAP as usize)));
            }
            lines.push(Line::from(options));
        }

        lines.push(Line::from(Span::styled(
            "─".repeat(inner_width),
            Style::default().fg(Color::DarkGray),
        )));
        let pad = inner_width.saturating_sub(1 + CLEAR_ALL_LABEL.len() + APPLY_LABEL.len() + 1);
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(CLEAR_ALL_LABEL, Style::default().fg(Color::Gray)),
            Span::raw(" ".repeat(pad)),
            Span::styled(
                APPLY_LABEL,
                Style::default()
                    .bg(Color::White)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));

        let block = Block::default().borders(Borders::ALL).title(" Sort By ");
        frame.render_widget(Paragraph::new(lines).block(block), layout.region);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::sort::registry::{CREATED_AT, ID, NAME, UPDATED_AT};
    use crate::sort::{client_fields, Direction, SortRule};

    const FRAME: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    fn open_dropdown() -> (SortDropdown, FieldOrder) {
        let registry = client_fields().unwrap();
        let order = registry.default_order();
        let mut dropdown = SortDropdown::new(registry);
        assert!(dropdown.open(&RuleSet::new(), &order).unwrap());
        (dropdown, order)
    }

    fn press(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn layout(dropdown: &SortDropdown) -> DropdownLayout {
        DropdownLayout::compute(FRAME, &dropdown.views())
    }

    #[test]
    fn keyboard_session_applies_in_field_order() {
        let (mut dropdown, _) = open_dropdown();
        // Created At: Right -> "Oldest to Newest", Enter.
        dropdown.handle_key(KeyCode::Down).unwrap();
        dropdown.handle_key(KeyCode::Right).unwrap();
        dropdown.handle_key(KeyCode::Enter).unwrap();
        // Client Name: default option "A-Z".
        dropdown.handle_key(KeyCode::Up).unwrap();
        dropdown.handle_key(KeyCode::Enter).unwrap();

        match dropdown.handle_key(KeyCode::Char('a')).unwrap() {
            DropdownOutcome::Applied(applied) => assert_eq!(
                applied.rules.rules(),
                &[SortRule::asc(NAME), SortRule::asc(CREATED_AT)]
            ),
            other => panic!("expected apply, got {other:?}"),
        }
        assert!(!dropdown.is_open());
        assert!(!dropdown.is_listening());
    }

    #[test]
    fn keyboard_grip_steps_the_field() {
        let (mut dropdown, _) = open_dropdown();
        dropdown.handle_key(KeyCode::Enter).unwrap();
        dropdown.handle_key(KeyCode::Char(' ')).unwrap();
        dropdown.handle_key(KeyCode::Down).unwrap();
        dropdown.handle_key(KeyCode::Down).unwrap();
        // Esc only releases the grip while dragging.
        dropdown.handle_key(KeyCode::Esc).unwrap();
        assert!(dropdown.is_open());

        let keys: Vec<_> = dropdown.views().iter().map(|v| v.key).collect();
        assert_eq!(keys[2], NAME);
        assert_eq!(dropdown.cursor, 2);
    }

    #[test]
    fn outside_press_dismisses_once() {
        let (mut dropdown, order) = open_dropdown();
        dropdown.handle_key(KeyCode::Enter).unwrap();
        let outcome = dropdown
            .handle_mouse(press(MouseEventKind::Down(MouseButton::Left), 0, 0), FRAME)
            .unwrap();
        assert_eq!(outcome, DropdownOutcome::Dismissed(order));
        assert!(!dropdown.is_listening());

        let again = dropdown
            .handle_mouse(press(MouseEventKind::Down(MouseButton::Left), 0, 0), FRAME)
            .unwrap();
        assert_eq!(again, DropdownOutcome::Stay);
    }

    #[test]
    fn pointer_clicks_and_drag_build_the_rules() {
        let (mut dropdown, _) = open_dropdown();
        let down = MouseEventKind::Down(MouseButton::Left);

        let (_, newest) = layout(&dropdown).fields[1].options[0];
        dropdown.handle_mouse(press(down, newest.x, newest.y), FRAME).unwrap();
        let (_, za) = layout(&dropdown).fields[3].options[1];
        dropdown.handle_mouse(press(down, za.x, za.y), FRAME).unwrap();

        // Drag Client ID onto the upper half of Client Name.
        let handle = layout(&dropdown).fields[3].handle;
        dropdown.handle_mouse(press(down, handle.x, handle.y), FRAME).unwrap();
        let name_top = layout(&dropdown).fields[0].block.y;
        dropdown
            .handle_mouse(press(MouseEventKind::Drag(MouseButton::Left), handle.x, name_top), FRAME)
            .unwrap();
        dropdown
            .handle_mouse(press(MouseEventKind::Up(MouseButton::Left), handle.x, name_top), FRAME)
            .unwrap();

        let apply = layout(&dropdown).apply;
        match dropdown.handle_mouse(press(down, apply.x, apply.y), FRAME).unwrap() {
            DropdownOutcome::Applied(applied) => {
                assert_eq!(
                    applied.rules.rules(),
                    &[SortRule::desc(ID), SortRule::desc(CREATED_AT)]
                );
                assert_eq!(applied.field_order.keys()[0], ID);
            }
            other => panic!("expected apply, got {other:?}"),
        }
    }

    #[test]
    fn clear_button_removes_the_rule() {
        let (mut dropdown, _) = open_dropdown();
        dropdown.handle_key(KeyCode::Enter).unwrap();
        let clear = layout(&dropdown).fields[0].clear.unwrap();
        dropdown
            .handle_mouse(press(MouseEventKind::Down(MouseButton::Left), clear.x, clear.y), FRAME)
            .unwrap();
        assert!(dropdown.views().iter().all(|v| v.active.is_none()));
    }

    #[test]
    fn reopening_binds_a_fresh_listener() {
        let (mut dropdown, order) = open_dropdown();
        assert!(!dropdown.open(&RuleSet::new(), &order).unwrap());
        assert_eq!(dropdown.sessions, 1);
        dropdown.handle_key(KeyCode::Esc).unwrap();
        assert!(!dropdown.is_open());

        let committed = RuleSet::from_rules(vec![SortRule::new(ID, Direction::Descending)]).unwrap();
        assert!(dropdown.open(&committed, &order).unwrap());
        assert!(dropdown.is_listening());
        assert_eq!(dropdown.sessions, 2);
        assert_eq!(dropdown.views()[3].active, Some(Direction::Descending));
    }

    #[test]
    fn presses_inside_keep_the_listener_bound() {
        let (mut dropdown, _) = open_dropdown();
        let region = layout(&dropdown).region;
        let outcome = dropdown
            .handle_mouse(press(MouseEventKind::Down(MouseButton::Left), region.x, region.y), FRAME)
            .unwrap();
        assert_eq!(outcome, DropdownOutcome::Stay);
        assert!(dropdown.is_listening());
    }

    #[test]
    fn cancelling_mid_grip_hands_back_the_completed_steps() {
        let (mut dropdown, _) = open_dropdown();
        dropdown.handle_key(KeyCode::Char(' ')).unwrap();
        dropdown.handle_key(KeyCode::Down).unwrap();
        dropdown.handle_key(KeyCode::Down).unwrap();
        // First Esc drops the grip, second one closes the dropdown.
        dropdown.handle_key(KeyCode::Esc).unwrap();
        match dropdown.handle_key(KeyCode::Esc).unwrap() {
            DropdownOutcome::Dismissed(order) => {
                assert_eq!(order.keys(), &[CREATED_AT, UPDATED_AT, NAME, ID]);
            }
            other => panic!("expected dismissal, got {other:?}"),
        }
        assert!(!dropdown.is_listening());
    }
}
