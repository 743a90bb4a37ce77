//! # Layout Cursor
//!
//! The single source of truth for "where does the next element go" on the
//! current page: a vertical offset (y-up, so it moves DOWN the page by
//! decreasing), which of the two columns is the next placement target, and
//! the height reserved by the left element of a row that has not closed yet.
//!
//! Pure state — the cursor never draws and never decides to break a page; it
//! only answers fit questions and applies placement steps.

use crate::model::PageGeometry;

/// The two column slots of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
}

impl Column {
    pub fn index(&self) -> usize {
        match self {
            Column::Left => 0,
            Column::Right => 1,
        }
    }
}

/// Per-page placement state, reset on every page break.
///
/// Invariant: `column == Left` implies `pending_row_height == 0` — a fresh
/// row has nothing reserved.
#[derive(Debug, Clone)]
pub struct LayoutCursor {
    geometry: PageGeometry,
    current_y: f64,
    column: Column,
    pending_row_height: f64,
}

impl LayoutCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut cursor = Self {
            geometry,
            current_y: 0.0,
            column: Column::Left,
            pending_row_height: 0.0,
        };
        cursor.reset();
        cursor
    }

    /// Back to the content-start offset below the page header, left column,
    /// empty row. Called once per new page.
    pub fn reset(&mut self) {
        self.current_y = self.geometry.content_start_y();
        self.column = Column::Left;
        self.pending_row_height = 0.0;
    }

    /// Top of the next available row (y-up).
    pub fn current_y(&self) -> f64 {
        self.current_y
    }

    /// The next placement target.
    pub fn column(&self) -> Column {
        self.column
    }

    /// True while a row is half-open (left element placed, right slot empty).
    pub fn row_pending(&self) -> bool {
        self.column == Column::Right
    }

    /// Left edge for a column slot.
    pub fn x_for(&self, column: Column) -> f64 {
        match column {
            Column::Left => self.geometry.margin_side,
            Column::Right => {
                self.geometry.margin_side + self.geometry.half_width() + self.geometry.column_gap
            }
        }
    }

    /// Does a body of `element_height` points (title bar added here) fit
    /// above the page floor?
    ///
    /// In the right column the test runs against the row's eventual height,
    /// `max(pending, this element)` — a right sibling taller than its left
    /// partner must still fit, or the whole row belongs on a new page.
    pub fn has_room_for(&self, element_height: f64) -> bool {
        let required = element_height + self.geometry.title_bar_height;
        let row_height = match self.column {
            Column::Left => required,
            Column::Right => self.pending_row_height.max(required),
        };
        self.current_y - row_height >= self.geometry.break_floor()
    }

    /// Apply one placement step.
    ///
    /// Full width closes the row unconditionally. Half width in the left
    /// column reserves the row height and flips to the right slot without
    /// moving y (the row stays open for its partner); half width in the
    /// right column closes the row at the height of its tallest member.
    pub fn advance(&mut self, element_height: f64, full_width: bool) {
        let required = element_height + self.geometry.title_bar_height;

        if full_width {
            debug_assert_eq!(
                self.column,
                Column::Left,
                "full-width advance with a half-open row; close_row() first"
            );
            self.current_y -= required + self.geometry.row_gap;
            self.column = Column::Left;
            self.pending_row_height = 0.0;
            return;
        }

        match self.column {
            Column::Left => {
                self.pending_row_height = required;
                self.column = Column::Right;
            }
            Column::Right => {
                self.current_y -= self.pending_row_height.max(required) + self.geometry.row_gap;
                self.column = Column::Left;
                self.pending_row_height = 0.0;
            }
        }
    }

    /// Force-close a half-open row, treating the empty right slot as zero
    /// height. No-op when the row is already empty. Required before placing
    /// a full-width element so rows never overlap.
    pub fn close_row(&mut self) {
        if self.column == Column::Right {
            self.current_y -= self.pending_row_height + self.geometry.row_gap;
            self.column = Column::Left;
            self.pending_row_height = 0.0;
        }
    }
}
