//! Flow-style auto-placement for grid layouts.
//!
//! Assigns zero-based `(row, column)` positions to grid children that have no
//! manual position, flowing left-to-right and wrapping top-to-bottom.
//! Placement is a pure function over the child list; the host layout calls it
//! once when the panel is ready and reads the assigned positions back.
//!
//! # Example
//!
//! ```
//! use typeahead::grid::{auto_place, GridChild};
//!
//! let mut children = vec![
//!     GridChild::new(),
//!     GridChild::new().with_col_span(2),
//!     GridChild::new(), // does not fit after the span, wraps
//! ];
//! auto_place(&mut children, 3);
//!
//! assert_eq!(children[0].position(), Some((0, 0)));
//! assert_eq!(children[1].position(), Some((0, 1)));
//! assert_eq!(children[2].position(), Some((1, 0)));
//! ```

/// A child participating in grid auto-placement.
#[derive(Debug, Clone, Default)]
pub struct GridChild {
    /// Number of columns this child spans (clamped to the column count).
    pub col_span: usize,
    /// Forces this child onto a fresh row even if the current one has room.
    pub force_row_break: bool,
    /// Manually assigned row, if any. A child with a manual row or column is
    /// left alone and does not advance the placement cursor.
    pub row: Option<usize>,
    /// Manually assigned column, if any.
    pub col: Option<usize>,
}

impl GridChild {
    /// Creates an auto-placed child spanning one column.
    pub fn new() -> Self {
        Self {
            col_span: 1,
            ..Self::default()
        }
    }

    /// Set the column span using the builder pattern.
    pub fn with_col_span(mut self, span: usize) -> Self {
        self.col_span = span;
        self
    }

    /// Request a row break before this child using the builder pattern.
    pub fn with_row_break(mut self) -> Self {
        self.force_row_break = true;
        self
    }

    /// Pin the child to a fixed cell using the builder pattern.
    pub fn at(mut self, row: usize, col: usize) -> Self {
        self.row = Some(row);
        self.col = Some(col);
        self
    }

    /// The assigned `(row, column)`, once both are known.
    pub fn position(&self) -> Option<(usize, usize)> {
        Some((self.row?, self.col?))
    }

    fn is_manually_placed(&self) -> bool {
        self.row.is_some() || self.col.is_some()
    }
}

/// Assigns positions to every auto-placed child in `children`.
///
/// The cursor flows left-to-right, wrapping when a child's span does not fit
/// in the remaining columns or when its `force_row_break` flag is set (a
/// break at the start of a row is a no-op). Spans wider than the grid are
/// clamped rather than rejected. Manually placed children are skipped and do
/// not advance the cursor; overlap with them is the caller's responsibility.
pub fn auto_place(children: &mut [GridChild], column_count: usize) {
    let column_count = column_count.max(1);
    let mut row = 0usize;
    let mut col = 0usize;

    for child in children.iter_mut() {
        if child.is_manually_placed() {
            continue;
        }
        let span = child.col_span.clamp(1, column_count);

        if col > 0 && (child.force_row_break || col + span > column_count) {
            row += 1;
            col = 0;
        }

        child.row = Some(row);
        child.col = Some(col);
        col += span;
        if col >= column_count {
            row += 1;
            col = 0;
        }
    }

    tracing::trace!(
        target: "typeahead::grid",
        children = children.len(),
        columns = column_count,
        rows = row + usize::from(col > 0),
        "auto-placement complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(children: &[GridChild]) -> Vec<Option<(usize, usize)>> {
        children.iter().map(GridChild::position).collect()
    }

    #[test]
    fn test_simple_flow_wraps_at_column_count() {
        let mut children = vec![GridChild::new(); 5];
        auto_place(&mut children, 2);
        assert_eq!(
            positions(&children),
            vec![
                Some((0, 0)),
                Some((0, 1)),
                Some((1, 0)),
                Some((1, 1)),
                Some((2, 0)),
            ]
        );
    }

    #[test]
    fn test_span_wraps_when_it_does_not_fit() {
        let mut children = vec![
            GridChild::new(),
            GridChild::new(),
            GridChild::new().with_col_span(2), // only 1 column left on row 0
            GridChild::new(),
        ];
        auto_place(&mut children, 3);
        assert_eq!(
            positions(&children),
            vec![Some((0, 0)), Some((0, 1)), Some((1, 0)), Some((1, 2))]
        );
    }

    #[test]
    fn test_forced_row_break() {
        let mut children = vec![
            GridChild::new(),
            GridChild::new().with_row_break(),
            GridChild::new(),
        ];
        auto_place(&mut children, 4);
        assert_eq!(children[0].position(), Some((0, 0)));
        assert_eq!(children[1].position(), Some((1, 0)));
        assert_eq!(children[2].position(), Some((1, 1)));
    }

    #[test]
    fn test_row_break_at_start_of_row_is_a_no_op() {
        let mut children = vec![GridChild::new(), GridChild::new().with_row_break()];
        auto_place(&mut children, 1);
        // The wrap already put the cursor at column 0; no blank row appears.
        assert_eq!(children[0].position(), Some((0, 0)));
        assert_eq!(children[1].position(), Some((1, 0)));
    }

    #[test]
    fn test_manually_placed_children_are_skipped() {
        let mut children = vec![
            GridChild::new(),
            GridChild::new().at(5, 5),
            GridChild::new(),
        ];
        auto_place(&mut children, 3);
        // The pinned child kept its cell and did not advance the cursor.
        assert_eq!(children[1].position(), Some((5, 5)));
        assert_eq!(children[0].position(), Some((0, 0)));
        assert_eq!(children[2].position(), Some((0, 1)));
    }

    #[test]
    fn test_oversized_span_is_clamped() {
        let mut children = vec![GridChild::new().with_col_span(10), GridChild::new()];
        auto_place(&mut children, 2);
        assert_eq!(children[0].position(), Some((0, 0)));
        assert_eq!(children[1].position(), Some((1, 0)));
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let mut children = vec![GridChild::new(), GridChild::new()];
        auto_place(&mut children, 0);
        assert_eq!(children[0].position(), Some((0, 0)));
        assert_eq!(children[1].position(), Some((1, 0)));
    }
}
