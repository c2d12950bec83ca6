//! Terminal adapters for the sort dropdown: where everything sits on screen,
//! pointer hit-testing, and the transient drag state.
//!
//! None of this touches the rule engine directly. A gesture only ever
//! resolves to a `(source, target, position)` triple or a key step, which
//! the dropdown forwards to the configurator.

use ratatui::layout::Rect;

use crate::sort::{Direction, DropPosition, FieldKey, FieldView};

use super::helpers::rect_contains;

/// Rows per field: label line plus option line.
pub(crate) const FIELD_ROWS: u16 = 2;
/// Inner width of the dropdown, wide enough for the longest option pair.
pub(crate) const DROPDOWN_INNER_WIDTH: u16 = 44;
/// Columns before the first option button.
pub(crate) const OPTION_INDENT: u16 = 4;
pub(crate) const OPTION_GAP: u16 = 2;
pub(crate) const CHECK_MARK: &str = " ✓";
pub(crate) const CLEAR_ALL_LABEL: &str = "Clear all";
pub(crate) const APPLY_LABEL: &str = "Apply Sort";

/// Text drawn for one option button.
pub(crate) fn option_text(label: &str, selected: bool) -> String {
    if selected {
        format!("[{label}{CHECK_MARK}]")
    } else {
        format!("[{label}]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldSlot {
    pub(crate) key: FieldKey,
    /// Both rows of the field.
    pub(crate) block: Rect,
    pub(crate) handle: Rect,
    pub(crate) clear: Option<Rect>,
    pub(crate) options: Vec<(Direction, Rect)>,
}

/// Screen geometry of an open dropdown, derived from the frame area and the
/// current field views. Drawing and hit-testing both read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DropdownLayout {
    pub(crate) region: Rect,
    pub(crate) inner: Rect,
    pub(crate) fields: Vec<FieldSlot>,
    pub(crate) separator_row: u16,
    pub(crate) clear_all: Rect,
    pub(crate) apply: Rect,
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hit {
    Handle(FieldKey),
    Option(FieldKey, Direction),
    Clear(FieldKey),
    ClearAll,
    Apply,
    /// Inside the dropdown but on nothing interactive.
    Inside,
    Outside,
}

impl DropdownLayout {
    /// Anchor the dropdown to the top-right corner of `frame`, below the
    /// header and tab rows.
    pub(crate) fn compute(frame: Rect, views: &[FieldView]) -> Self {
        let field_rows = views.len() as u16 * FIELD_ROWS;
        let width = (DROPDOWN_INNER_WIDTH + 2).min(frame.width);
        let height = (field_rows + 4).min(frame.height.saturating_sub(2));
        let x = frame.x + frame.width.saturating_sub(width + 1);
        let y = frame.y + 2;
        let region = Rect::new(x, y, width, height);
        let inner = Rect::new(
            x + 1,
            y + 1,
            width.saturating_sub(2),
            height.saturating_sub(2),
        );

        let fields = views
            .iter()
            .enumerate()
            .map(|(idx, view)| {
                let top = inner.y + idx as u16 * FIELD_ROWS;
                let mut option_x = inner.x + OPTION_INDENT;
                let options = view
                    .options
                    .iter()
                    .map(|opt| {
                        let text_width = option_text(opt.label, opt.selected).chars().count() as u16;
                        let rect = Rect::new(option_x, top + 1, text_width, 1);
                        option_x += text_width + OPTION_GAP;
                        (opt.direction, rect)
                    })
                    .collect();
                FieldSlot {
                    key: view.key,
                    block: Rect::new(inner.x, top, inner.width, FIELD_ROWS),
                    handle: Rect::new(inner.x, top, 3, 1),
                    clear: view
                        .is_selected()
                        .then(|| Rect::new(inner.x + inner.width.saturating_sub(2), top, 2, 1)),
                    options,
                }
            })
            .collect();

        let separator_row = inner.y + field_rows;
        let button_row = separator_row + 1;
        let apply_width = APPLY_LABEL.len() as u16;
        Self {
            region,
            inner,
            fields,
            separator_row,
            clear_all: Rect::new(inner.x + 1, button_row, CLEAR_ALL_LABEL.len() as u16, 1),
            apply: Rect::new(
                inner.x + inner.width.saturating_sub(apply_width + 1),
                button_row,
                apply_width,
                1,
            ),
        }
    }

    pub(crate) fn hit(&self, column: u16, row: u16) -> Hit {
        if !rect_contains(self.region, column, row) {
            return Hit::Outside;
        }
        if rect_contains(self.apply, column, row) {
            return Hit::Apply;
        }
        if rect_contains(self.clear_all, column, row) {
            return Hit::ClearAll;
        }
        for slot in &self.fields {
            if !rect_contains(slot.block, column, row) {
                continue;
            }
            if rect_contains(slot.handle, column, row) {
                return Hit::Handle(slot.key);
            }
            if let Some(clear) = slot.clear {
                if rect_contains(clear, column, row) {
                    return Hit::Clear(slot.key);
                }
            }
            if let Some((direction, _)) = slot
                .options
                .iter()
                .find(|(_, rect)| rect_contains(*rect, column, row))
            {
                return Hit::Option(slot.key, *direction);
            }
        }
        Hit::Inside
    }

    /// Field under `row` and which half of it the pointer is in. The upper
    /// row of a field means "drop before", anything lower "drop after".
    pub(crate) fn drop_target(&self, row: u16) -> Option<(FieldKey, DropPosition)> {
        self.fields.iter().find_map(|slot| {
            let top = slot.block.y;
            if row < top || row >= top + slot.block.height {
                return None;
            }
            let position = if row - top < slot.block.height / 2 {
                DropPosition::Before
            } else {
                DropPosition::After
            };
            Some((slot.key, position))
        })
    }
}

/// Pointer drag in progress, from a press on a handle until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PointerDrag {
    pub(crate) source: FieldKey,
}

impl PointerDrag {
    /// Reorder implied by the pointer being over `row`, if any.
    pub(crate) fn step(
        &self,
        layout: &DropdownLayout,
        row: u16,
    ) -> Option<(FieldKey, FieldKey, DropPosition)> {
        let (target, position) = layout.drop_target(row)?;
        (target != self.source).then_some((self.source, target, position))
    }
}

/// Field picked up with the keyboard; arrow keys step it past neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyboardGrip {
    pub(crate) field: FieldKey,
}
