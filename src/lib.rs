//! Type-ahead filtering behaviors for declarative desktop UI toolkits.
//!
//! This crate implements the interaction logic of a filterable, editable
//! combo box, decoupled from any rendering or host framework:
//!
//! - **Combo Box Behavior**: Selection, dropdown, and keyboard state machine
//! - **Filter Views**: Live filterable projections over item models
//! - **Matching**: Case- and accent-insensitive substring matching
//! - **Debounce**: Trailing-edge coalescing of rapid text edits
//! - **Signals**: Type-safe change notification
//! - **Grid Auto-Placement**: Flow-style position assignment for grid panels
//!
//! The host framework forwards its text, key, and popup notifications to a
//! [`FilterComboBox`], drives the debounce timer from its event loop, and
//! renders from the state the combo box publishes through its signals.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use typeahead::{FilterComboBox, ItemModel, ItemSource, ListModel};
//!
//! let model: Arc<dyn ItemModel> = Arc::new(ListModel::new(vec![
//!     "Alice".to_string(),
//!     "Bob".to_string(),
//!     "Carol".to_string(),
//! ]));
//!
//! let mut combo = FilterComboBox::new().with_source(ItemSource::from(model));
//! combo.popup_visibility_changed.connect(|&open| {
//!     println!("dropdown {}", if open { "opened" } else { "closed" });
//! });
//!
//! let now = Instant::now();
//! combo.handle_text_changed("a".to_string(), now);
//!
//! // The host sleeps for `combo.time_until_filter(now)` and polls on wake.
//! combo.poll(now + Duration::from_millis(500)).unwrap();
//! assert_eq!(combo.visible_count(), 2); // Alice, Carol
//! ```

pub mod combo;
pub mod debounce;
pub mod error;
pub mod grid;
pub mod matcher;
pub mod model;
pub mod signal;

pub use combo::{
    ComboBoxEvent, ComboState, DisplayExtractor, FilterBinding, FilterComboBox, ItemSource, Key,
};
pub use debounce::{Debouncer, DEFAULT_DELAY};
pub use error::{ConfigError, Result};
pub use matcher::{AsciiCaseFolder, Matcher, TextFold, UnicodeFolder};
pub use model::{
    FilterPredicate, FilterView, ItemData, ItemModel, ListItem, ListModel, ModelSignals,
    ValueExtractor,
};
pub use signal::{ConnectionId, Signal};
