//! Filterable combo box behavior.
//!
//! `FilterComboBox` implements the interaction logic of an editable,
//! type-ahead combo box without any rendering:
//!
//! - Debounced filtering as the user types (trailing edge, default 500 ms)
//! - A private [`FilterView`] over the bound item source
//! - Auto-select and dropdown close when exactly one item remains visible
//! - Keyboard commit (Enter/Tab) and navigation (Down/Up)
//! - Caret and dropdown state restoration across filtering passes
//!
//! The host framework delivers its notifications through the [`ComboBoxEvent`]
//! interface (or the individual `handle_*` methods) and drives the debounce
//! timer by calling [`poll`](FilterComboBox::poll) from its event loop.
//! Outbound state changes are published through signals.
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
//! let mut combo = FilterComboBox::new().with_source(ItemSource::from(model));
//!
//! let now = Instant::now();
//! combo.handle_text_changed("al".to_string(), now);
//! combo.poll(now + Duration::from_millis(500)).unwrap();
//!
//! // Exactly one item matched: it is auto-selected and the dropdown stays shut.
//! assert_eq!(combo.current_index(), 0);
//! assert_eq!(combo.text(), "Alice");
//! assert!(!combo.is_popup_visible());
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

use crate::debounce::Debouncer;
use crate::error::{ConfigError, Result};
use crate::matcher::Matcher;
use crate::model::{FilterPredicate, FilterView, ItemData, ItemModel};
use crate::signal::Signal;

// ============================================================================
// Display resolution
// ============================================================================

/// Type alias for a display extractor function.
///
/// Maps a non-string item value to its display text. This replaces
/// field-name-based display lookup with an explicit accessor resolved once at
/// configuration time.
pub type DisplayExtractor = Arc<dyn Fn(&ItemData) -> Option<String> + Send + Sync>;

/// Resolves the comparison/display text for an item.
///
/// String items resolve directly; anything else goes through the configured
/// extractor. Validation is lazy: errors surface here, on first use, because
/// items may not exist yet when the widget is configured.
fn resolve_display(
    extractor: Option<&DisplayExtractor>,
    item: &ItemData,
    row: usize,
) -> Result<Option<String>> {
    match item {
        ItemData::None => Ok(None),
        ItemData::String(s) => Ok(Some(s.clone())),
        other => match extractor {
            Some(extract) => match extract(other) {
                Some(text) => Ok(Some(text)),
                None => Err(ConfigError::DisplayNotResolvable { row }),
            },
            None => Err(ConfigError::MissingDisplayExtractor { row }),
        },
    }
}

// ============================================================================
// Item source and filter binding
// ============================================================================

/// The item collection a combo box is bound to.
///
/// A plain model gets wrapped in a fresh private [`FilterView`]; a source that
/// already is a view is used directly. The distinction matters because the
/// filter installed on a view is observable by every reader of that view, so
/// a widget must never install its filter on a projection it shares.
#[derive(Clone)]
pub enum ItemSource {
    /// A raw item model. The widget wraps it in its own private view.
    Model(Arc<dyn ItemModel>),
    /// An existing filterable view, used as-is.
    View(Arc<FilterView>),
}

impl From<Arc<dyn ItemModel>> for ItemSource {
    fn from(model: Arc<dyn ItemModel>) -> Self {
        ItemSource::Model(model)
    }
}

impl From<Arc<FilterView>> for ItemSource {
    fn from(view: Arc<FilterView>) -> Self {
        ItemSource::View(view)
    }
}

/// Owns the lifecycle of the filter applied to the bound source.
///
/// The view is acquired lazily, once per binding, and is never shared with
/// another consumer of the same model. Every operation is a quiet no-op when
/// no source is bound; the widget must work before data arrives.
#[derive(Default)]
pub struct FilterBinding {
    source: Option<ItemSource>,
    view: Option<Arc<FilterView>>,
}

impl FilterBinding {
    /// Creates an unbound binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebinds to a new source, clearing any filter on the previous view.
    pub fn set_source(&mut self, source: Option<ItemSource>) {
        self.clear_filter();
        self.view = None;
        self.source = source;
    }

    /// Returns `true` if a source is bound.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Returns the acquired view, creating it on first use.
    ///
    /// Returns `None` when no source is bound.
    pub fn acquire_view(&mut self) -> Option<&Arc<FilterView>> {
        if self.view.is_none() {
            self.view = match &self.source {
                Some(ItemSource::View(view)) => Some(view.clone()),
                Some(ItemSource::Model(model)) => {
                    tracing::debug!(target: "typeahead::combo", "wrapping source in private filter view");
                    Some(FilterView::new(model.clone()))
                }
                None => None,
            };
        }
        self.view.as_ref()
    }

    /// Returns the view if it has already been acquired.
    pub fn view(&self) -> Option<&Arc<FilterView>> {
        self.view.as_ref()
    }

    /// Installs `predicate` on the view, acquiring it if necessary.
    ///
    /// Returns `Ok(None)` when no source is bound, otherwise the visible row
    /// count. The recompute is synchronous; the count is valid immediately.
    pub fn apply_filter(&mut self, predicate: FilterPredicate) -> Result<Option<usize>> {
        match self.acquire_view() {
            Some(view) => view.set_filter(predicate).map(Some),
            None => Ok(None),
        }
    }

    /// Removes any installed filter.
    ///
    /// Idempotent, and a no-op when no view has been acquired.
    pub fn clear_filter(&self) {
        if let Some(view) = &self.view {
            view.clear_filter();
        }
    }

    /// Number of rows in the underlying source (unfiltered).
    fn source_row_count(&self) -> usize {
        match &self.source {
            Some(ItemSource::Model(model)) => model.row_count(),
            Some(ItemSource::View(view)) => view.source().row_count(),
            None => 0,
        }
    }

    /// Item value at a source row.
    fn source_item(&self, row: usize) -> ItemData {
        match &self.source {
            Some(ItemSource::Model(model)) => model.item(row),
            Some(ItemSource::View(view)) => view.source().item(row),
            None => ItemData::None,
        }
    }
}

// ============================================================================
// Host events
// ============================================================================

/// Keys the combo box reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Commit the current selection and close the dropdown.
    Enter,
    /// Commit, like Enter, as focus moves on.
    Tab,
    /// Open the dropdown; select the first visible item if none is selected.
    Down,
    /// Open the dropdown; select the last visible item if none is selected.
    Up,
}

/// Notifications the host framework delivers to the combo box.
#[derive(Debug, Clone)]
pub enum ComboBoxEvent {
    /// The text in the editable surface changed (user or programmatic echo).
    TextChanged(String),
    /// A navigation or commit key was pressed.
    KeyPress(Key),
    /// The user picked a visible row in the dropdown list.
    ItemActivated(usize),
    /// The dropdown was opened by the host.
    PopupOpened,
    /// The dropdown was closed by the host.
    PopupClosed,
    /// The widget was removed from the visual tree.
    Unloaded,
}

// ============================================================================
// State machine
// ============================================================================

/// The interaction state of a [`FilterComboBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComboState {
    /// No interaction in progress.
    #[default]
    Idle,
    /// A text edit is pending its debounce.
    Editing,
    /// A filtering pass is in progress.
    Filtering,
    /// The dropdown is open after a completed pass.
    DropdownOpen,
    /// The dropdown is closed after a completed pass.
    DropdownClosed,
}

/// Filterable, type-ahead selection behavior.
///
/// See the [module docs](self) for an overview and example.
pub struct FilterComboBox {
    binding: FilterBinding,
    matcher: Matcher,
    debouncer: Debouncer,
    display: Option<DisplayExtractor>,

    state: ComboState,
    /// Text in the editable surface.
    edit_text: String,
    /// Caret byte offset into `edit_text`.
    caret: usize,
    /// Anchor of the text highlight, if any.
    selection_anchor: Option<usize>,
    /// Selected source row (-1 means no selection).
    current_index: i32,
    popup_visible: bool,

    /// Set for one notification cycle after an internal selection change, so
    /// the text update it causes does not re-trigger filtering.
    programmatic_change: bool,
    /// Set when the caret must move to end-of-text after the next pass.
    caret_restore_pending: bool,

    // Signals
    /// Emitted when the selected source row changes (-1 for none).
    pub current_index_changed: Signal<i32>,
    /// Emitted when the text in the editable surface changes.
    pub current_text_changed: Signal<String>,
    /// Emitted when the dropdown opens or closes.
    pub popup_visibility_changed: Signal<bool>,
    /// Emitted after each completed filtering pass with the visible count.
    pub filtered: Signal<usize>,
}

impl FilterComboBox {
    /// Creates an unbound combo box with default settings.
    pub fn new() -> Self {
        Self {
            binding: FilterBinding::new(),
            matcher: Matcher::new(),
            debouncer: Debouncer::new(),
            display: None,
            state: ComboState::Idle,
            edit_text: String::new(),
            caret: 0,
            selection_anchor: None,
            current_index: -1,
            popup_visible: false,
            programmatic_change: false,
            caret_restore_pending: false,
            current_index_changed: Signal::new(),
            current_text_changed: Signal::new(),
            popup_visibility_changed: Signal::new(),
            filtered: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Binds an item source, replacing any previous binding.
    ///
    /// Clears the selection; the previous view's filter is removed first.
    pub fn set_source(&mut self, source: Option<ItemSource>) {
        self.binding.set_source(source);
        self.current_index = -1;
    }

    /// Set the source using the builder pattern.
    pub fn with_source(mut self, source: ItemSource) -> Self {
        self.set_source(Some(source));
        self
    }

    /// Sets the debounce quiet period.
    pub fn set_delay(&mut self, delay: Duration) {
        self.debouncer.set_delay(delay);
    }

    /// Set the debounce quiet period using the builder pattern.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    /// Sets the display extractor for non-string items.
    pub fn set_display_extractor(&mut self, extractor: DisplayExtractor) {
        self.display = Some(extractor);
    }

    /// Set the display extractor using the builder pattern.
    pub fn with_display_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&ItemData) -> Option<String> + Send + Sync + 'static,
    {
        self.display = Some(Arc::new(extractor));
        self
    }

    /// Sets the text matching policy.
    pub fn set_matcher(&mut self, matcher: Matcher) {
        self.matcher = matcher;
    }

    /// Set the text matching policy using the builder pattern.
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The current interaction state.
    pub fn state(&self) -> ComboState {
        self.state
    }

    /// The text currently in the editable surface.
    pub fn text(&self) -> &str {
        &self.edit_text
    }

    /// The caret byte offset into the text.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// The selected source row, or -1 when nothing is selected.
    pub fn current_index(&self) -> i32 {
        self.current_index
    }

    /// The value of the selected item, if any.
    pub fn current_item(&self) -> Option<ItemData> {
        if self.current_index < 0 {
            return None;
        }
        Some(self.binding.source_item(self.current_index as usize))
    }

    /// Whether the dropdown is currently open.
    pub fn is_popup_visible(&self) -> bool {
        self.popup_visible
    }

    /// Number of items currently visible (filtered if a filter is installed).
    pub fn visible_count(&self) -> usize {
        match self.binding.view() {
            Some(view) => view.row_count(),
            None => self.binding.source_row_count(),
        }
    }

    /// The acquired filter view, if one exists yet.
    pub fn view(&self) -> Option<&Arc<FilterView>> {
        self.binding.view()
    }

    // =========================================================================
    // Host event interface
    // =========================================================================

    /// Dispatches a host notification.
    ///
    /// `now` anchors debounce scheduling; pass the host's current event time.
    pub fn dispatch(&mut self, event: ComboBoxEvent, now: Instant) -> Result<()> {
        match event {
            ComboBoxEvent::TextChanged(text) => {
                self.handle_text_changed(text, now);
                Ok(())
            }
            ComboBoxEvent::KeyPress(key) => self.handle_key_press(key),
            ComboBoxEvent::ItemActivated(row) => self.handle_item_activated(row),
            ComboBoxEvent::PopupOpened => {
                self.handle_popup_opened();
                Ok(())
            }
            ComboBoxEvent::PopupClosed => {
                self.handle_popup_closed();
                Ok(())
            }
            ComboBoxEvent::Unloaded => {
                self.handle_unloaded();
                Ok(())
            }
        }
    }

    /// Handles a text-change notification from the host.
    ///
    /// A change echoing an internal selection update consumes the suppression
    /// flag and does not schedule filtering; a user edit schedules the
    /// debounced pass.
    pub fn handle_text_changed(&mut self, text: String, now: Instant) {
        if self.programmatic_change {
            self.programmatic_change = false;
            tracing::trace!(target: "typeahead::combo", "programmatic text change, filter suppressed");
            if text != self.edit_text {
                self.edit_text = text;
                self.caret = self.edit_text.len();
            }
            return;
        }

        self.edit_text = text;
        self.caret = self.edit_text.len();
        self.selection_anchor = None;
        self.after_user_edit(now);
    }

    /// Inserts text at the caret as a user edit.
    ///
    /// Convenience for hosts that forward raw key input instead of a text
    /// value; schedules the debounced filtering pass.
    pub fn insert_text(&mut self, text: &str, now: Instant) {
        self.programmatic_change = false;
        if let Some(anchor) = self.selection_anchor.take() {
            let (start, end) = (anchor.min(self.caret), anchor.max(self.caret));
            self.edit_text.replace_range(start..end, "");
            self.caret = start;
        }
        self.edit_text.insert_str(self.caret, text);
        self.caret += text.len();
        self.after_user_edit(now);
    }

    /// Deletes the grapheme before the caret as a user edit.
    ///
    /// Returns `false` if the caret is at the start of the text.
    pub fn delete_backward(&mut self, now: Instant) -> bool {
        self.programmatic_change = false;
        if let Some(anchor) = self.selection_anchor.take() {
            let (start, end) = (anchor.min(self.caret), anchor.max(self.caret));
            self.edit_text.replace_range(start..end, "");
            self.caret = start;
            self.after_user_edit(now);
            return true;
        }
        if self.caret == 0 {
            return false;
        }
        let boundary = self.edit_text[..self.caret]
            .grapheme_indices(true)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.edit_text.replace_range(boundary..self.caret, "");
        self.caret = boundary;
        self.after_user_edit(now);
        true
    }

    /// Handles Enter/Tab/Down/Up.
    pub fn handle_key_press(&mut self, key: Key) -> Result<()> {
        match key {
            Key::Enter | Key::Tab => {
                // Focus is moving on: no stray filter pass may fire afterwards.
                self.debouncer.cancel();
                self.set_popup_visible(false);
                self.commit_selection()?;
                self.state = ComboState::DropdownClosed;
                Ok(())
            }
            Key::Down | Key::Up => {
                self.set_popup_visible(true);
                if self.current_index < 0 {
                    // Immediate, non-debounced pass so there is a visible
                    // subset to navigate.
                    self.run_filtering()?;
                    if self.current_index < 0 {
                        let target = self.binding.view().and_then(|view| {
                            let count = view.row_count();
                            if count == 0 {
                                return None;
                            }
                            let visible_row = if key == Key::Down { 0 } else { count - 1 };
                            view.map_to_source(visible_row)
                        });
                        if let Some(row) = target {
                            self.set_current_index(row as i32)?;
                        }
                    }
                }
                self.state = if self.popup_visible {
                    ComboState::DropdownOpen
                } else {
                    ComboState::DropdownClosed
                };
                Ok(())
            }
        }
    }

    /// Handles the user picking a visible row in the dropdown list.
    pub fn handle_item_activated(&mut self, visible_row: usize) -> Result<()> {
        let Some(row) = self
            .binding
            .view()
            .and_then(|view| view.map_to_source(visible_row))
        else {
            return Ok(());
        };
        self.set_current_index(row as i32)?;
        self.set_popup_visible(false);
        self.state = ComboState::DropdownClosed;
        Ok(())
    }

    /// Handles the dropdown being opened by the host.
    pub fn handle_popup_opened(&mut self) {
        self.set_popup_visible(true);
    }

    /// Handles the dropdown being closed by the host.
    pub fn handle_popup_closed(&mut self) {
        self.set_popup_visible(false);
    }

    /// Handles the widget being removed from the visual tree.
    ///
    /// Cleanup is unconditional: the pending debounce is cancelled and the
    /// filter removed, regardless of state.
    pub fn handle_unloaded(&mut self) {
        tracing::debug!(target: "typeahead::combo", "widget unloaded, clearing filter");
        self.debouncer.cancel();
        // Teardown is silent: the host surface is going away, so the dropdown
        // close must not be announced to it.
        self.popup_visibility_changed.set_blocked(true);
        self.set_popup_visible(false);
        self.popup_visibility_changed.set_blocked(false);
        self.binding.clear_filter();
        self.programmatic_change = false;
        self.caret_restore_pending = false;
        self.state = ComboState::Idle;
    }

    // =========================================================================
    // Debounce driving
    // =========================================================================

    /// Runs the filtering pass if the debounce deadline has passed.
    ///
    /// Returns `true` if a pass ran. Call from the host event loop, using
    /// [`time_until_filter`](Self::time_until_filter) to decide when to wake.
    pub fn poll(&mut self, now: Instant) -> Result<bool> {
        if self.debouncer.poll(now) {
            self.run_filtering()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// How long until the pending filtering pass is due, if one is scheduled.
    pub fn time_until_filter(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_fire(now)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn after_user_edit(&mut self, now: Instant) {
        self.state = ComboState::Editing;
        self.debouncer.schedule(now);
        self.current_text_changed.emit(self.edit_text.clone());
    }

    /// One full filtering pass: save text, clear selection, apply the
    /// predicate, then decide selection and dropdown state from the count.
    fn run_filtering(&mut self) -> Result<()> {
        self.state = ComboState::Filtering;
        tracing::debug!(target: "typeahead::combo", query = %self.edit_text, "filtering");

        // Clearing the selection resets the edit text, so save it and put it
        // back before the predicate is built from it. The suppression flag
        // armed by the clear stays armed for the restore's echo.
        let query = self.edit_text.clone();
        self.set_current_index(-1)?;
        if self.edit_text != query {
            self.edit_text = query.clone();
            self.caret = self.edit_text.len();
            self.current_text_changed.emit(query.clone());
        }

        let predicate = self.build_predicate(query);
        // `None` means nothing is bound yet: the pass still finishes its
        // cleanup below, it just has no subset to reshape.
        let visible = match self.binding.apply_filter(predicate) {
            Ok(visible) => visible,
            Err(err) => {
                self.state = ComboState::Idle;
                return Err(err);
            }
        };

        match visible {
            Some(1) => {
                let source_row = self.binding.view().and_then(|view| view.map_to_source(0));
                if let Some(row) = source_row {
                    self.set_current_index(row as i32)?;
                }
                self.set_popup_visible(false);
            }
            Some(n) => {
                self.set_popup_visible(n > 1);
            }
            None => {}
        }

        if self.caret_restore_pending {
            self.caret = self.edit_text.len();
            self.selection_anchor = None;
            self.caret_restore_pending = false;
        }

        // Should already be stopped at this point.
        self.debouncer.cancel();

        self.state = if self.popup_visible {
            ComboState::DropdownOpen
        } else {
            ComboState::DropdownClosed
        };
        if let Some(visible) = visible {
            self.filtered.emit(visible);
        }
        Ok(())
    }

    fn build_predicate(&self, query: String) -> FilterPredicate {
        let matcher = self.matcher.clone();
        let display = self.display.clone();
        Arc::new(move |model: &dyn ItemModel, row: usize| {
            let item = model.item(row);
            let text = resolve_display(display.as_ref(), &item, row)?;
            Ok(matcher.matches(&query, text.as_deref()))
        })
    }

    /// Changes the selected source row.
    ///
    /// Selecting a row replaces the edit text with the item's display text;
    /// clearing the selection erases it. Any actual change arms the
    /// programmatic-change and caret-restore flags, and removes the filter
    /// when the dropdown is not open.
    fn set_current_index(&mut self, index: i32) -> Result<()> {
        let count = self.binding.source_row_count() as i32;
        let new_index = if index < 0 || index >= count { -1 } else { index };
        if self.current_index == new_index {
            return Ok(());
        }

        let new_text = if new_index >= 0 {
            let row = new_index as usize;
            let item = self.binding.source_item(row);
            resolve_display(self.display.as_ref(), &item, row)?.unwrap_or_default()
        } else {
            String::new()
        };

        self.current_index = new_index;
        self.edit_text = new_text;
        self.caret = self.edit_text.len();
        self.selection_anchor = None;

        self.programmatic_change = true;
        self.caret_restore_pending = true;

        // A selection made outside an active filtering session must not leave
        // a stale filter installed.
        if !self.popup_visible {
            self.binding.clear_filter();
        }

        self.current_index_changed.emit(self.current_index);
        self.current_text_changed.emit(self.edit_text.clone());
        Ok(())
    }

    /// Re-applies the current selection as the committed one.
    fn commit_selection(&mut self) -> Result<()> {
        if self.current_index >= 0 {
            let row = self.current_index as usize;
            let item = self.binding.source_item(row);
            let text = resolve_display(self.display.as_ref(), &item, row)?.unwrap_or_default();
            if text != self.edit_text {
                self.edit_text = text;
                self.caret = self.edit_text.len();
                self.selection_anchor = None;
                self.programmatic_change = true;
                self.current_text_changed.emit(self.edit_text.clone());
            }
        }
        self.current_index_changed.emit(self.current_index);
        Ok(())
    }

    fn set_popup_visible(&mut self, visible: bool) {
        if self.popup_visible == visible {
            return;
        }
        self.popup_visible = visible;
        if visible {
            // Typing while the dropdown is open appends rather than replaces.
            self.selection_anchor = None;
            self.caret = self.edit_text.len();
        } else {
            self.binding.clear_filter();
        }
        tracing::debug!(target: "typeahead::combo", visible, "popup visibility changed");
        self.popup_visibility_changed.emit(visible);
    }
}

impl Default for FilterComboBox {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListModel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DELAY: Duration = Duration::from_millis(500);

    fn names_model() -> Arc<dyn ItemModel> {
        Arc::new(ListModel::new(vec![
            "Alice".to_string(),
            "Bob".to_string(),
            "Carol".to_string(),
        ]))
    }

    fn combo() -> FilterComboBox {
        FilterComboBox::new().with_source(ItemSource::from(names_model()))
    }

    #[test]
    fn test_scenario_a_partial_match_opens_dropdown() {
        let mut combo = combo();
        let t0 = Instant::now();

        combo.handle_text_changed("a".to_string(), t0);
        assert_eq!(combo.state(), ComboState::Editing);

        // Not yet due.
        assert!(!combo.poll(t0 + Duration::from_millis(499)).unwrap());
        assert!(combo.poll(t0 + DELAY).unwrap());

        // Alice and Carol contain "a".
        assert_eq!(combo.visible_count(), 2);
        assert!(combo.is_popup_visible());
        assert_eq!(combo.current_index(), -1);
        assert_eq!(combo.state(), ComboState::DropdownOpen);
    }

    #[test]
    fn test_scenario_b_single_match_autoselects_and_closes() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_text_changed("a".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();

        let counts = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let counts_clone = counts.clone();
        combo.filtered.connect(move |&n| counts_clone.lock().push(n));

        let t1 = t0 + Duration::from_secs(1);
        combo.handle_text_changed("al".to_string(), t1);
        combo.poll(t1 + DELAY).unwrap();

        assert_eq!(*counts.lock(), vec![1]);
        assert_eq!(combo.current_index(), 0);
        assert_eq!(combo.text(), "Alice");
        assert_eq!(combo.caret(), "Alice".len());
        assert!(!combo.is_popup_visible());
        assert_eq!(combo.state(), ComboState::DropdownClosed);
    }

    #[test]
    fn test_scenario_c_closing_dropdown_clears_filter() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_text_changed("a".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();
        assert_eq!(combo.visible_count(), 2);

        combo.handle_popup_closed();
        assert_eq!(combo.visible_count(), 3);
        assert!(!combo.view().unwrap().has_filter());
    }

    #[test]
    fn test_scenario_d_down_selects_first_without_debounce() {
        let mut combo = combo();

        combo.handle_key_press(Key::Down).unwrap();

        assert!(combo.is_popup_visible());
        assert_eq!(combo.visible_count(), 3);
        assert_eq!(combo.current_index(), 0);
        assert_eq!(combo.text(), "Alice");
    }

    #[test]
    fn test_up_selects_last_visible() {
        let mut combo = combo();
        combo.handle_key_press(Key::Up).unwrap();
        assert_eq!(combo.current_index(), 2);
        assert_eq!(combo.text(), "Carol");
    }

    #[test]
    fn test_scenario_e_unload_cancels_pending_pass() {
        let mut combo = combo();
        let t0 = Instant::now();

        combo.handle_text_changed("a".to_string(), t0);
        combo.handle_unloaded();

        // The pending timer must not fire after teardown.
        assert!(!combo.poll(t0 + DELAY * 4).unwrap());
        assert_eq!(combo.visible_count(), 3);
        assert_eq!(combo.state(), ComboState::Idle);
    }

    #[test]
    fn test_unload_closes_dropdown_silently() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_text_changed("a".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();
        assert!(combo.is_popup_visible());

        let closes = Arc::new(AtomicUsize::new(0));
        let closes_clone = closes.clone();
        combo.popup_visibility_changed.connect(move |_| {
            closes_clone.fetch_add(1, Ordering::SeqCst);
        });

        combo.handle_unloaded();

        assert!(!combo.is_popup_visible());
        assert_eq!(combo.visible_count(), 3);
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        // Blocking is scoped to the teardown only.
        assert!(!combo.popup_visibility_changed.is_blocked());
    }

    #[test]
    fn test_unbound_pass_still_restores_caret_and_timer() {
        let mut combo = combo();
        let t0 = Instant::now();

        // Arm the caret-restore flag through a real selection, then unbind.
        combo.handle_key_press(Key::Down).unwrap();
        combo.handle_text_changed("Alice".to_string(), t0); // host echo
        combo.set_source(None);

        combo.insert_text("x", t0);
        combo.caret = 2; // host moved the caret back
        assert!(combo.caret_restore_pending);

        assert!(combo.poll(t0 + DELAY).unwrap());

        // The pass finished its cleanup even with nothing bound.
        assert_eq!(combo.caret(), combo.text().len());
        assert!(!combo.caret_restore_pending);
        assert!(!combo.debouncer.is_pending());
        assert_eq!(combo.state(), ComboState::DropdownOpen);
    }

    #[test]
    fn test_rapid_edits_filter_once_after_last() {
        let mut combo = combo();
        let t0 = Instant::now();

        let passes = Arc::new(AtomicUsize::new(0));
        let passes_clone = passes.clone();
        combo.filtered.connect(move |_| {
            passes_clone.fetch_add(1, Ordering::SeqCst);
        });

        combo.handle_text_changed("a".to_string(), t0);
        combo.handle_text_changed("al".to_string(), t0 + Duration::from_millis(200));
        combo.handle_text_changed("ali".to_string(), t0 + Duration::from_millis(400));

        // 500ms after the *first* edit: nothing yet.
        assert!(!combo.poll(t0 + Duration::from_millis(500)).unwrap());
        // 500ms after the last edit: exactly one pass.
        assert!(combo.poll(t0 + Duration::from_millis(900)).unwrap());
        assert!(!combo.poll(t0 + Duration::from_millis(2000)).unwrap());
        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enter_cancels_debounce_and_commits() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_key_press(Key::Down).unwrap(); // selects Alice

        let commits = Arc::new(AtomicUsize::new(0));
        let commits_clone = commits.clone();
        combo.current_index_changed.connect(move |_| {
            commits_clone.fetch_add(1, Ordering::SeqCst);
        });

        combo.insert_text("x", t0);
        combo.handle_key_press(Key::Enter).unwrap();

        assert!(!combo.is_popup_visible());
        assert_eq!(commits.load(Ordering::SeqCst), 1);
        // The cancelled debounce never fires.
        assert!(!combo.poll(t0 + DELAY * 2).unwrap());
        assert_eq!(combo.state(), ComboState::DropdownClosed);
    }

    #[test]
    fn test_programmatic_echo_does_not_refilter() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_text_changed("al".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();
        assert_eq!(combo.text(), "Alice");

        // Host echoes the programmatic text update.
        let t1 = t0 + Duration::from_secs(1);
        combo.handle_text_changed("Alice".to_string(), t1);

        assert!(combo.time_until_filter(t1).is_none());
        assert!(!combo.poll(t1 + DELAY * 2).unwrap());
    }

    #[test]
    fn test_item_activated_selects_and_clears_filter() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.handle_text_changed("a".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();
        assert_eq!(combo.visible_count(), 2);

        // Visible row 1 is Carol (source row 2).
        combo.handle_item_activated(1).unwrap();
        assert_eq!(combo.current_index(), 2);
        assert_eq!(combo.text(), "Carol");
        assert!(!combo.is_popup_visible());
        assert_eq!(combo.visible_count(), 3);
    }

    #[test]
    fn test_unbound_combo_is_a_no_op() {
        let mut combo = FilterComboBox::new();
        let t0 = Instant::now();

        combo.handle_text_changed("a".to_string(), t0);
        assert!(combo.poll(t0 + DELAY).unwrap());
        combo.handle_popup_closed();
        combo.handle_unloaded();

        assert_eq!(combo.visible_count(), 0);
        assert_eq!(combo.current_index(), -1);
    }

    #[test]
    fn test_missing_display_extractor_errors_lazily() {
        let model: Arc<dyn ItemModel> = Arc::new(ListModel::with_extractor(
            vec![17i64, 42],
            |n: &i64| ItemData::from(*n),
        ));
        // Construction succeeds; validation is deferred to the first pass.
        let mut combo = FilterComboBox::new().with_source(ItemSource::from(model));
        let t0 = Instant::now();

        combo.handle_text_changed("4".to_string(), t0);
        let err = combo.poll(t0 + DELAY).unwrap_err();
        assert_eq!(err, ConfigError::MissingDisplayExtractor { row: 0 });
        // The failed pass leaves the view unfiltered.
        assert_eq!(combo.visible_count(), 2);
    }

    #[test]
    fn test_display_extractor_resolves_non_string_items() {
        let model: Arc<dyn ItemModel> = Arc::new(ListModel::with_extractor(
            vec![17i64, 42],
            |n: &i64| ItemData::from(*n),
        ));
        let mut combo = FilterComboBox::new()
            .with_source(ItemSource::from(model))
            .with_display_extractor(|data| data.as_int().map(|n| n.to_string()));
        let t0 = Instant::now();

        combo.handle_text_changed("4".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();

        assert_eq!(combo.current_index(), 1);
        assert_eq!(combo.text(), "42");
    }

    #[test]
    fn test_widgets_on_shared_model_filter_independently() {
        let model = names_model();
        let mut a = FilterComboBox::new().with_source(ItemSource::from(model.clone()));
        let mut b = FilterComboBox::new().with_source(ItemSource::from(model));
        let t0 = Instant::now();

        a.handle_text_changed("bob".to_string(), t0);
        a.poll(t0 + DELAY).unwrap();
        b.handle_key_press(Key::Down).unwrap();

        assert_eq!(a.current_index(), 1);
        assert_eq!(b.visible_count(), 3);
    }

    #[test]
    fn test_bound_view_is_used_directly() {
        let view = FilterView::new(names_model());
        let mut combo =
            FilterComboBox::new().with_source(ItemSource::from(view.clone()));
        let t0 = Instant::now();

        combo.handle_text_changed("bob".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();

        // The filter landed on the very view the host supplied.
        assert_eq!(view.row_count(), 3); // cleared when the selection closed it
        assert_eq!(combo.current_index(), 1);
    }

    #[test]
    fn test_zero_matches_keeps_dropdown_closed() {
        let mut combo = combo();
        let t0 = Instant::now();

        combo.handle_text_changed("zz".to_string(), t0);
        combo.poll(t0 + DELAY).unwrap();

        assert_eq!(combo.visible_count(), 0);
        assert!(!combo.is_popup_visible());
        assert_eq!(combo.current_index(), -1);
        assert_eq!(combo.state(), ComboState::DropdownClosed);
    }

    #[test]
    fn test_popup_open_moves_caret_to_end() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.insert_text("car", t0);
        combo.caret = 1; // host moved the caret back

        combo.handle_popup_opened();
        assert_eq!(combo.caret(), 3);
    }

    #[test]
    fn test_delete_backward_refilters() {
        let mut combo = combo();
        let t0 = Instant::now();
        combo.insert_text("café", t0);
        assert!(combo.delete_backward(t0 + Duration::from_millis(100)));
        assert_eq!(combo.text(), "caf");

        combo.poll(t0 + Duration::from_millis(100) + DELAY).unwrap();
        // No item contains "caf".
        assert_eq!(combo.visible_count(), 0);

        let mut empty = FilterComboBox::new();
        assert!(!empty.delete_backward(t0));
    }

    #[test]
    fn test_filter_restored_text_after_selection_clear() {
        let mut combo = combo();
        let t0 = Instant::now();

        // Select something first so the next pass has a selection to clear.
        combo.handle_key_press(Key::Down).unwrap();
        assert_eq!(combo.current_index(), 0);
        // Host echo of the programmatic text update.
        combo.handle_text_changed("Alice".to_string(), t0);

        let t1 = t0 + Duration::from_secs(1);
        combo.handle_text_changed("bob".to_string(), t1);
        combo.poll(t1 + DELAY).unwrap();

        // Clearing the selection wiped the text mid-pass; it was reapplied,
        // matched Bob, and the auto-select replaced it with the full item.
        assert_eq!(combo.current_index(), 1);
        assert_eq!(combo.text(), "Bob");
        assert_eq!(combo.caret(), 3);
    }
}
