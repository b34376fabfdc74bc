//! Rendering surface interface.
//!
//! Views never talk to a concrete toolkit. Each view owns exactly one rendered element implementing
//! [`Widget`]; container views additionally drive the primitive operations below. See
//! [`crate::headless`] for in-memory implementations.
use crate::ElementId;
use std::fmt;

/// A rendered element owned by a view.
pub trait Widget: 'static {
    /// Returns the ID of this element in the host toolkit.
    fn element_id(&self) -> ElementId;
}

/// A native list: an ordered sequence of child elements with an optional current row.
pub trait ListSurface: Widget {
    /// Inserts a child element at the given position.
    fn insert_item(&mut self, index: usize, element: ElementId);

    /// Removes the child element at the given position and returns it.
    fn take_item(&mut self, index: usize) -> Option<ElementId>;

    /// Returns the current row, if any.
    fn current_row(&self) -> Option<usize>;

    /// Sets the current row (`None` clears the selection).
    fn set_current_row(&mut self, row: Option<usize>);

    /// Returns whether a selection-changed notification is pending, and clears it.
    ///
    /// Notifications raised by programmatic changes are delivered the same way as user-originated
    /// ones; the list view uses its `in_refresh` flag to tell them apart.
    fn take_selection_changed(&mut self) -> bool;
}

/// A native form layout: labeled rows.
pub trait FormSurface: Widget {
    fn add_row(&mut self, label: &str, element: ElementId);
}

/// A native top-level window showing one element.
pub trait DialogSurface: Widget {
    fn set_content(&mut self, element: ElementId);
}

/// A native multi-column tree.
pub trait TreeSurface: Widget {
    type Item: Copy + Eq + fmt::Debug + 'static;

    /// Adds an item under `parent` (top-level if `None`).
    fn add_item(&mut self, parent: Option<Self::Item>) -> Self::Item;

    /// Removes an item and all its descendants.
    fn remove_item(&mut self, item: Self::Item);

    fn set_text(&mut self, item: Self::Item, column: usize, text: &str);
}
