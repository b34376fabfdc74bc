//! In-memory rendering surface.
//!
//! Implements the [`surface`](crate::surface) traits without a native toolkit. The elements keep their
//! state inspectable, for tests and for hosts that only need the data side of the tree.
use crate::{
    surface::{DialogSurface, FormSurface, ListSurface, TreeSurface, Widget},
    ChangeFlags, ElementId, SubmitFn, View, ViewBase, ViewRef,
};
use slotmap::{new_key_type, SlotMap};
use std::{cell::RefCell, rc::Rc};
use tracing::warn;

/// A leaf element displaying some text.
#[derive(Debug)]
pub struct HeadlessWidget {
    id: ElementId,
    text: String,
}

impl Default for HeadlessWidget {
    fn default() -> Self {
        HeadlessWidget::new()
    }
}

impl HeadlessWidget {
    pub fn new() -> HeadlessWidget {
        HeadlessWidget {
            id: ElementId::next(),
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for HeadlessWidget {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A list element.
///
/// Like native lists, the current row follows its item when rows are inserted or removed before it,
/// and is cleared (with a selection-changed notification) when its item is removed.
#[derive(Debug)]
pub struct HeadlessList {
    id: ElementId,
    items: Vec<ElementId>,
    current_row: Option<usize>,
    selection_changed: bool,
}

impl Default for HeadlessList {
    fn default() -> Self {
        HeadlessList::new()
    }
}

impl HeadlessList {
    pub fn new() -> HeadlessList {
        HeadlessList {
            id: ElementId::next(),
            items: Vec::new(),
            current_row: None,
            selection_changed: false,
        }
    }

    pub fn items(&self) -> &[ElementId] {
        &self.items
    }

    /// Simulates the user clicking on a row.
    pub fn click_row(&mut self, row: usize) {
        if row < self.items.len() {
            self.set_current_row(Some(row));
        }
    }
}

impl Widget for HeadlessList {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

impl ListSurface for HeadlessList {
    fn insert_item(&mut self, index: usize, element: ElementId) {
        self.items.insert(index, element);
        if let Some(row) = self.current_row.as_mut() {
            if *row >= index {
                *row += 1;
            }
        }
    }

    fn take_item(&mut self, index: usize) -> Option<ElementId> {
        if index >= self.items.len() {
            return None;
        }
        match self.current_row {
            Some(row) if row == index => {
                self.current_row = None;
                self.selection_changed = true;
            }
            Some(row) if row > index => self.current_row = Some(row - 1),
            _ => {}
        }
        Some(self.items.remove(index))
    }

    fn current_row(&self) -> Option<usize> {
        self.current_row
    }

    fn set_current_row(&mut self, row: Option<usize>) {
        let row = row.filter(|&row| row < self.items.len());
        if row != self.current_row {
            self.current_row = row;
            self.selection_changed = true;
        }
    }

    fn take_selection_changed(&mut self) -> bool {
        std::mem::take(&mut self.selection_changed)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A form element: a list of labeled rows.
#[derive(Debug)]
pub struct HeadlessForm {
    id: ElementId,
    rows: Vec<(String, ElementId)>,
}

impl Default for HeadlessForm {
    fn default() -> Self {
        HeadlessForm::new()
    }
}

impl HeadlessForm {
    pub fn new() -> HeadlessForm {
        HeadlessForm {
            id: ElementId::next(),
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[(String, ElementId)] {
        &self.rows
    }
}

impl Widget for HeadlessForm {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

impl FormSurface for HeadlessForm {
    fn add_row(&mut self, label: &str, element: ElementId) {
        self.rows.push((label.to_string(), element));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A dialog element.
#[derive(Debug)]
pub struct HeadlessDialog {
    id: ElementId,
    content: Option<ElementId>,
}

impl Default for HeadlessDialog {
    fn default() -> Self {
        HeadlessDialog::new()
    }
}

impl HeadlessDialog {
    pub fn new() -> HeadlessDialog {
        HeadlessDialog {
            id: ElementId::next(),
            content: None,
        }
    }

    pub fn content(&self) -> Option<ElementId> {
        self.content
    }
}

impl Widget for HeadlessDialog {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

impl DialogSurface for HeadlessDialog {
    fn set_content(&mut self, element: ElementId) {
        self.content = Some(element);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

new_key_type! {
    /// Item of a [`HeadlessTree`].
    pub struct TreeItemKey;
}

#[derive(Debug, Default)]
pub struct TreeItem {
    pub parent: Option<TreeItemKey>,
    pub children: Vec<TreeItemKey>,
    pub columns: Vec<String>,
}

/// A tree element with text columns.
#[derive(Debug)]
pub struct HeadlessTree {
    id: ElementId,
    items: SlotMap<TreeItemKey, TreeItem>,
    top_level: Vec<TreeItemKey>,
}

impl Default for HeadlessTree {
    fn default() -> Self {
        HeadlessTree::new()
    }
}

impl HeadlessTree {
    pub fn new() -> HeadlessTree {
        HeadlessTree {
            id: ElementId::next(),
            items: SlotMap::with_key(),
            top_level: Vec::new(),
        }
    }

    pub fn item(&self, key: TreeItemKey) -> Option<&TreeItem> {
        self.items.get(key)
    }

    pub fn top_level_items(&self) -> &[TreeItemKey] {
        &self.top_level
    }

    /// Number of items, at any depth.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Text of a column, or the empty string.
    pub fn text(&self, key: TreeItemKey, column: usize) -> &str {
        self.items
            .get(key)
            .and_then(|item| item.columns.get(column))
            .map_or("", String::as_str)
    }

    fn remove_rec(&mut self, key: TreeItemKey) {
        if let Some(item) = self.items.remove(key) {
            for child in item.children {
                self.remove_rec(child);
            }
        }
    }
}

impl Widget for HeadlessTree {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

impl TreeSurface for HeadlessTree {
    type Item = TreeItemKey;

    fn add_item(&mut self, parent: Option<TreeItemKey>) -> TreeItemKey {
        let key = self.items.insert(TreeItem {
            parent,
            ..Default::default()
        });
        match parent.and_then(|parent| self.items.get_mut(parent)) {
            Some(parent) => parent.children.push(key),
            None => self.top_level.push(key),
        }
        key
    }

    fn remove_item(&mut self, key: TreeItemKey) {
        let Some(parent) = self.items.get(key).map(|item| item.parent) else {
            warn!("HeadlessTree: removing unknown item {:?}", key);
            return;
        };
        match parent.and_then(|parent| self.items.get_mut(parent)) {
            Some(parent) => parent.children.retain(|&child| child != key),
            None => self.top_level.retain(|&item| item != key),
        }
        self.remove_rec(key);
    }

    fn set_text(&mut self, key: TreeItemKey, column: usize, text: &str) {
        if let Some(item) = self.items.get_mut(key) {
            if item.columns.len() <= column {
                item.columns.resize(column + 1, String::new());
            }
            item.columns[column] = text.to_string();
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Editable single-line text.
pub struct LineEditView {
    base: ViewBase<String, HeadlessWidget>,
}

impl LineEditView {
    pub fn new(submit_data_callback: SubmitFn<String>) -> ViewRef<LineEditView> {
        Rc::new(RefCell::new(LineEditView {
            base: ViewBase::new(HeadlessWidget::new(), Some(submit_data_callback)),
        }))
    }

    /// Simulates the user typing `text`.
    ///
    /// Returns whether the edit was submitted.
    pub fn edit(&self, text: impl Into<String>) -> bool {
        if self.base.in_refresh() {
            return false;
        }
        self.submit_data(text.into(), true)
    }
}

impl View for LineEditView {
    type Data = String;
    type Widget = HeadlessWidget;

    fn base(&self) -> &ViewBase<String, HeadlessWidget> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase<String, HeadlessWidget> {
        &mut self.base
    }

    fn refresh(&mut self, new_data: &String) -> ChangeFlags {
        self.base.widget_mut().set_text(new_data.as_str());
        ChangeFlags::NONE
    }
}
