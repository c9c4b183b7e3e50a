//! Core trait for flat item models.

use crate::signal::Signal;

use super::data::ItemData;

/// The trait for flat (list-shaped) item sources.
///
/// Views query models through this interface without knowing the underlying
/// data structure, and subscribe to [`ModelSignals`] for change notification.
/// The widget never mutates the collection behind a model; ownership stays
/// with the host application.
///
/// # Example
///
/// ```
/// use typeahead::{ItemData, ItemModel, ModelSignals};
///
/// struct Weekdays {
///     signals: ModelSignals,
/// }
///
/// impl ItemModel for Weekdays {
///     fn row_count(&self) -> usize {
///         5
///     }
///
///     fn item(&self, row: usize) -> ItemData {
///         ["Mon", "Tue", "Wed", "Thu", "Fri"]
///             .get(row)
///             .map(|d| ItemData::from(*d))
///             .unwrap_or(ItemData::None)
///     }
///
///     fn signals(&self) -> &ModelSignals {
///         &self.signals
///     }
/// }
/// ```
pub trait ItemModel: Send + Sync {
    /// Returns the number of rows in the model.
    fn row_count(&self) -> usize;

    /// Returns the value for the item at `row`.
    ///
    /// Returns `ItemData::None` for out-of-bounds rows.
    fn item(&self, row: usize) -> ItemData;

    /// Returns the signals for this model.
    ///
    /// Views connect to these to receive notifications about insertions,
    /// removals and data changes.
    fn signals(&self) -> &ModelSignals;
}

/// Change-notification signals emitted by item models.
///
/// Row arguments are inclusive `(first, last)` ranges.
#[derive(Debug, Default)]
pub struct ModelSignals {
    /// Emitted after rows have been inserted. Args: (first row, last row).
    pub rows_inserted: Signal<(usize, usize)>,

    /// Emitted after rows have been removed. Args: (first row, last row).
    pub rows_removed: Signal<(usize, usize)>,

    /// Emitted when data in existing rows changes. Args: (first row, last row).
    pub data_changed: Signal<(usize, usize)>,

    /// Emitted after a wholesale change: reset, re-filter or reorder.
    /// Consumers should drop cached row mappings and re-query.
    pub layout_changed: Signal<()>,
}

impl ModelSignals {
    /// Creates a new set of disconnected signals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `mutate` and then emits `rows_inserted` for the range.
    pub fn emit_rows_inserted<F: FnOnce()>(&self, first: usize, last: usize, mutate: F) {
        mutate();
        self.rows_inserted.emit((first, last));
    }

    /// Runs `mutate` and then emits `rows_removed` for the range.
    pub fn emit_rows_removed<F: FnOnce()>(&self, first: usize, last: usize, mutate: F) {
        mutate();
        self.rows_removed.emit((first, last));
    }

    /// Runs `mutate` and then emits `layout_changed`.
    pub fn emit_layout_changed<F: FnOnce()>(&self, mutate: F) {
        mutate();
        self.layout_changed.emit(());
    }
}
