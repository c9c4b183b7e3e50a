//! Generic in-memory list model.
//!
//! `ListModel<T>` is the default [`ItemModel`] implementation for item lists
//! owned by the host application. Items either implement [`ListItem`] or are
//! adapted through a value extractor closure supplied at construction.

use std::sync::Arc;

use parking_lot::RwLock;

use super::data::ItemData;
use super::traits::{ItemModel, ModelSignals};

/// Trait for items that can provide their own model value.
///
/// # Example
///
/// ```
/// use typeahead::{ItemData, ListItem};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl ListItem for Person {
///     fn value(&self) -> ItemData {
///         ItemData::from(self.name.as_str())
///     }
/// }
/// ```
pub trait ListItem: Send + Sync {
    /// Returns the model value for this item.
    fn value(&self) -> ItemData;
}

impl ListItem for String {
    fn value(&self) -> ItemData {
        ItemData::from(self.as_str())
    }
}

impl ListItem for &'static str {
    fn value(&self) -> ItemData {
        ItemData::from(*self)
    }
}

/// Type alias for a value extractor function.
pub type ValueExtractor<T> = Arc<dyn Fn(&T) -> ItemData + Send + Sync>;

/// A generic list model over a `Vec<T>`.
///
/// Mutation methods emit the matching [`ModelSignals`] so that views (and the
/// combo box's filter view) stay consistent with the data.
///
/// # Example
///
/// ```
/// use typeahead::{ItemData, ItemModel, ListModel};
///
/// let model = ListModel::new(vec!["Apple".to_string(), "Banana".to_string()]);
/// assert_eq!(model.row_count(), 2);
/// assert_eq!(model.item(0).as_string(), Some("Apple"));
///
/// model.push("Cherry".to_string());
/// assert_eq!(model.row_count(), 3);
/// ```
pub struct ListModel<T> {
    items: RwLock<Vec<T>>,
    extractor: ValueExtractor<T>,
    signals: ModelSignals,
}

impl<T: ListItem + 'static> ListModel<T> {
    /// Creates a list model whose items supply their own values.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            extractor: Arc::new(|item: &T| item.value()),
            signals: ModelSignals::new(),
        }
    }
}

impl<T: Send + Sync + 'static> ListModel<T> {
    /// Creates a list model with a value extractor.
    ///
    /// The extractor is called whenever a view queries an item.
    pub fn with_extractor<F>(items: Vec<T>, extractor: F) -> Self
    where
        F: Fn(&T) -> ItemData + Send + Sync + 'static,
    {
        Self {
            items: RwLock::new(items),
            extractor: Arc::new(extractor),
            signals: ModelSignals::new(),
        }
    }

    /// Returns the number of items in the model.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the model is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Appends an item to the end of the list.
    pub fn push(&self, item: T) {
        let row = self.items.read().len();
        self.signals.emit_rows_inserted(row, row, || {
            self.items.write().push(item);
        });
    }

    /// Inserts an item at the specified index.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&self, index: usize, item: T) {
        self.signals.emit_rows_inserted(index, index, || {
            self.items.write().insert(index, item);
        });
    }

    /// Removes and returns the item at the specified index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&self, index: usize) -> T {
        let removed = self.items.write().remove(index);
        self.signals.rows_removed.emit((index, index));
        removed
    }

    /// Replaces all items in the model.
    pub fn set_items(&self, items: Vec<T>) {
        self.signals.emit_layout_changed(|| {
            *self.items.write() = items;
        });
    }

    /// Removes all items from the model.
    pub fn clear(&self) {
        self.signals.emit_layout_changed(|| {
            self.items.write().clear();
        });
    }

    /// Returns read-only access to the items.
    pub fn items(&self) -> impl std::ops::Deref<Target = Vec<T>> + '_ {
        self.items.read()
    }
}

impl<T: Send + Sync + 'static> ItemModel for ListModel<T> {
    fn row_count(&self) -> usize {
        self.items.read().len()
    }

    fn item(&self, row: usize) -> ItemData {
        let items = self.items.read();
        match items.get(row) {
            Some(item) => (self.extractor)(item),
            None => ItemData::None,
        }
    }

    fn signals(&self) -> &ModelSignals {
        &self.signals
    }
}
