//! Filtering view over an item model.
//!
//! `FilterView` wraps a source model and maintains the subset of rows that
//! pass an optional predicate. It is the live projection the combo box
//! installs its filter on: the wrapped source is never mutated, and the view
//! keeps its own identity so that one consumer's filter cannot leak into
//! another consumer of the same source.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use typeahead::{FilterView, ItemModel, ListModel};
//!
//! let source: Arc<dyn ItemModel> = Arc::new(ListModel::new(vec![
//!     "Alice".to_string(),
//!     "Bob".to_string(),
//!     "Carol".to_string(),
//! ]));
//!
//! let view = FilterView::new(source);
//! let visible = view
//!     .set_filter(Arc::new(|model, row| {
//!         Ok(model.item(row).as_string().is_some_and(|s| s.contains('o')))
//!     }))
//!     .unwrap();
//!
//! assert_eq!(visible, 2); // Bob, Carol
//! view.clear_filter();
//! assert_eq!(view.row_count(), 3);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::Result;
use crate::signal::ConnectionId;

use super::data::ItemData;
use super::traits::{ItemModel, ModelSignals};

/// Type alias for a row filter predicate.
///
/// Receives the source model and a source row index. Returns `Ok(true)` to
/// keep the row, `Ok(false)` to hide it, or a [`crate::ConfigError`] when the
/// row's display text cannot be resolved.
pub type FilterPredicate = Arc<dyn Fn(&dyn ItemModel, usize) -> Result<bool> + Send + Sync>;

/// Row mapping between the view and its source.
#[derive(Default)]
struct RowMapping {
    /// Mapping from visible row index to source row index.
    visible_to_source: Vec<usize>,
    /// Mapping from source row index to visible row index (None if hidden).
    source_to_visible: Vec<Option<usize>>,
}

impl RowMapping {
    fn unfiltered(source_count: usize) -> Self {
        Self {
            visible_to_source: (0..source_count).collect(),
            source_to_visible: (0..source_count).map(Some).collect(),
        }
    }
}

/// A live, filterable projection over an [`ItemModel`].
///
/// The visible subset is recomputed synchronously whenever the filter changes
/// or [`invalidate`](FilterView::invalidate) runs; callers can inspect
/// [`row_count`](ItemModel::row_count) immediately after either call. Source
/// change notifications are forwarded into an automatic `invalidate`, so
/// external mutation of the underlying collection is tolerated.
pub struct FilterView {
    source: Arc<dyn ItemModel>,
    filter: RwLock<Option<FilterPredicate>>,
    mapping: RwLock<RowMapping>,
    signals: ModelSignals,
    /// Subscriptions on the source's signals (inserted, removed, data,
    /// layout), revoked on drop.
    source_connections: [ConnectionId; 4],
}

impl FilterView {
    /// Creates a new, unfiltered view over `source`.
    pub fn new(source: Arc<dyn ItemModel>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<FilterView>| {
            let mapping = RowMapping::unfiltered(source.row_count());

            // Any structural or data change in the source invalidates the
            // current subset.
            let signals = source.signals();
            let w = weak.clone();
            let on_inserted = signals.rows_inserted.connect(move |_| {
                if let Some(view) = w.upgrade() {
                    view.invalidate();
                }
            });
            let w = weak.clone();
            let on_removed = signals.rows_removed.connect(move |_| {
                if let Some(view) = w.upgrade() {
                    view.invalidate();
                }
            });
            let w = weak.clone();
            let on_data = signals.data_changed.connect(move |_| {
                if let Some(view) = w.upgrade() {
                    view.invalidate();
                }
            });
            let w = weak.clone();
            let on_layout = signals.layout_changed.connect(move |_| {
                if let Some(view) = w.upgrade() {
                    view.invalidate();
                }
            });
            let connections = [on_inserted, on_removed, on_data, on_layout];

            Self {
                source: source.clone(),
                filter: RwLock::new(None),
                mapping: RwLock::new(mapping),
                signals: ModelSignals::new(),
                source_connections: connections,
            }
        })
    }

    /// Returns the wrapped source model.
    pub fn source(&self) -> &Arc<dyn ItemModel> {
        &self.source
    }

    /// Returns `true` if a filter predicate is currently installed.
    pub fn has_filter(&self) -> bool {
        self.filter.read().is_some()
    }

    /// Installs `predicate` and synchronously recomputes the visible subset.
    ///
    /// Returns the number of visible rows. If the predicate fails on any row,
    /// the predicate is discarded, the view reverts to the full unfiltered
    /// subset and the error is returned; there is no retry.
    pub fn set_filter(&self, predicate: FilterPredicate) -> Result<usize> {
        match self.build_mapping(Some(&predicate)) {
            Ok(mapping) => {
                let count = mapping.visible_to_source.len();
                tracing::debug!(
                    target: "typeahead::filter_view",
                    visible = count,
                    total = self.source.row_count(),
                    "filter applied"
                );
                *self.filter.write() = Some(predicate);
                self.publish(mapping);
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(target: "typeahead::filter_view", %err, "filter evaluation failed");
                *self.filter.write() = None;
                self.publish(RowMapping::unfiltered(self.source.row_count()));
                Err(err)
            }
        }
    }

    /// Removes any installed predicate, restoring the full subset.
    ///
    /// Idempotent: calling this without an installed filter changes nothing
    /// and emits no notification.
    pub fn clear_filter(&self) {
        if self.filter.write().take().is_none() {
            return;
        }
        tracing::debug!(target: "typeahead::filter_view", "filter cleared");
        self.publish(RowMapping::unfiltered(self.source.row_count()));
    }

    /// Recomputes the visible subset against the current source contents.
    ///
    /// Runs automatically when the source reports a change. If the installed
    /// predicate fails against the new contents, the filter is dropped and
    /// the view reverts to the unfiltered subset.
    pub fn invalidate(&self) {
        let filter = self.filter.read().clone();
        match self.build_mapping(filter.as_ref()) {
            Ok(mapping) => self.publish(mapping),
            Err(err) => {
                tracing::warn!(
                    target: "typeahead::filter_view",
                    %err,
                    "filter invalidated against changed source; clearing"
                );
                *self.filter.write() = None;
                self.publish(RowMapping::unfiltered(self.source.row_count()));
            }
        }
    }

    /// Maps a visible row to its source row.
    pub fn map_to_source(&self, visible_row: usize) -> Option<usize> {
        self.mapping.read().visible_to_source.get(visible_row).copied()
    }

    /// Maps a source row to its visible row, or `None` if it is hidden.
    pub fn map_from_source(&self, source_row: usize) -> Option<usize> {
        self.mapping
            .read()
            .source_to_visible
            .get(source_row)
            .copied()
            .flatten()
    }

    fn build_mapping(&self, predicate: Option<&FilterPredicate>) -> Result<RowMapping> {
        let source_count = self.source.row_count();
        let Some(predicate) = predicate else {
            return Ok(RowMapping::unfiltered(source_count));
        };

        let mut mapping = RowMapping {
            visible_to_source: Vec::new(),
            source_to_visible: vec![None; source_count],
        };
        for source_row in 0..source_count {
            if predicate(self.source.as_ref(), source_row)? {
                mapping.source_to_visible[source_row] = Some(mapping.visible_to_source.len());
                mapping.visible_to_source.push(source_row);
            }
        }
        Ok(mapping)
    }

    fn publish(&self, mapping: RowMapping) {
        self.signals.emit_layout_changed(|| {
            *self.mapping.write() = mapping;
        });
    }
}

impl ItemModel for FilterView {
    fn row_count(&self) -> usize {
        self.mapping.read().visible_to_source.len()
    }

    fn item(&self, row: usize) -> ItemData {
        match self.map_to_source(row) {
            Some(source_row) => self.source.item(source_row),
            None => ItemData::None,
        }
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}

impl Drop for FilterView {
    fn drop(&mut self) {
        // Each id belongs to exactly one of the source's signals.
        let signals = self.source.signals();
        let [on_inserted, on_removed, on_data, on_layout] = self.source_connections;
        signals.rows_inserted.disconnect(on_inserted);
        signals.rows_removed.disconnect(on_removed);
        signals.data_changed.disconnect(on_data);
        signals.layout_changed.disconnect(on_layout);
    }
}
