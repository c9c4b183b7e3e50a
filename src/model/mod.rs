//! Data layer for the combo box behaviors.
//!
//! The model types separate data ownership from the widget:
//!
//! - [`ItemModel`]: the trait item sources implement
//! - [`ItemData`]: type-erased container for item values
//! - [`ModelSignals`]: change notifications models emit
//! - [`ListModel`]: default in-memory model over a `Vec<T>`
//! - [`FilterView`]: live filterable projection over any model
//!
//! The widget never owns or mutates an item collection; it only installs and
//! removes a filter predicate on a [`FilterView`] it acquired privately.

mod data;
mod filter_view;
mod list_model;
mod traits;

pub use data::ItemData;
pub use filter_view::{FilterPredicate, FilterView};
pub use list_model::{ListItem, ListModel, ValueExtractor};
pub use traits::{ItemModel, ModelSignals};
