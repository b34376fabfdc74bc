//! Views over keyed collections.
use crate::{
    diff::{diff_keys, Operation},
    refresh_view,
    surface::{ListSurface, Widget},
    ChangeFlags, Error, NodeRef, SubmitFn, View, ViewBase, ViewId, ViewRef,
};
use fanix_common::Data;
use smallvec::SmallVec;
use std::{collections::HashMap, fmt, hash::Hash};
use tracing::{error, trace, warn};

/// Describes how a collection maps to the rows of a [`ListView`].
pub trait ListModel: 'static {
    /// The collection snapshot.
    type Collection: Data + fmt::Debug;
    /// Identifies an element of the collection across refreshes.
    type Key: Clone + Eq + Hash + fmt::Debug + 'static;
    /// The view displaying one element.
    type ElementView: View;

    /// Returns the keys of the elements of `collection`, in display order.
    fn generate_key_list(&self, collection: &Self::Collection) -> Vec<Self::Key>;

    /// Returns the data of the element at `index`, whose key is `key`.
    fn get_data_at(
        &self,
        index: usize,
        key: &Self::Key,
        collection: &Self::Collection,
    ) -> <Self::ElementView as View>::Data;

    /// Called when the user changes the current row.
    fn on_selection_changed(&mut self, _row: Option<usize>) {}
}

type ElementData<M> = <<M as ListModel>::ElementView as View>::Data;

/// A view displaying a keyed collection, one child view per element.
///
/// On refresh, the keys of the new collection are diffed against the displayed ones, and the edit script
/// is applied to the child views and the list surface in lockstep. Child views of relocated keys are
/// reused rather than recreated, so their internal state survives reordering.
pub struct ListView<M: ListModel, S: ListSurface> {
    base: ViewBase<M::Collection, S>,
    model: M,
    element_view_factory: Box<dyn FnMut() -> ViewRef<M::ElementView>>,
    current_key_list: Vec<M::Key>,
    current_element_view_list: Vec<ViewRef<M::ElementView>>,
    current_element_view_index: HashMap<ViewId, usize>,
    current_element_view_data: Vec<ElementData<M>>,
    selected_key: Option<M::Key>,
}

impl<M: ListModel, S: ListSurface> ListView<M, S> {
    /// Creates a list view rendering into `surface`.
    ///
    /// `element_view_factory` is called whenever a row needs a child view and none can be reused.
    pub fn new(
        surface: S,
        model: M,
        element_view_factory: impl FnMut() -> ViewRef<M::ElementView> + 'static,
        submit_data_callback: Option<SubmitFn<M::Collection>>,
    ) -> ListView<M, S> {
        ListView {
            base: ViewBase::new(surface, submit_data_callback),
            model,
            element_view_factory: Box::new(element_view_factory),
            current_key_list: Vec::new(),
            current_element_view_list: Vec::new(),
            current_element_view_index: HashMap::new(),
            current_element_view_data: Vec::new(),
            selected_key: None,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn current_key_list(&self) -> &[M::Key] {
        &self.current_key_list
    }

    /// The child views, in display order.
    pub fn element_views(&self) -> &[ViewRef<M::ElementView>] {
        &self.current_element_view_list
    }

    /// Returns the row of the child view with the given ID.
    pub fn element_view_index(&self, id: ViewId) -> Option<usize> {
        self.current_element_view_index.get(&id).copied()
    }

    /// The key selected by the last call to `try_refresh_with_selection`, if it hasn't been reset by a
    /// refresh since.
    pub fn selected_key(&self) -> Option<&M::Key> {
        self.selected_key.as_ref()
    }

    /// Returns the data of the element in the current row, if any.
    pub fn get_selected_data(&self) -> Option<ElementData<M>> {
        let row = self.base.widget().current_row()?;
        let key = self.current_key_list.get(row)?;
        let collection = self.base.current_data().as_data()?;
        Some(self.model.get_data_at(row, key, collection))
    }

    /// Refreshes the list, then selects the row with `selected_key`.
    ///
    /// Does nothing if the list is already refreshing. The selection is only touched if the list isn't
    /// empty and `selected_key` differs from the previously requested key: a key that isn't displayed
    /// (or `None`) clears the selection.
    pub fn try_refresh_with_selection(
        &mut self,
        new_data: M::Collection,
        selected_key: Option<M::Key>,
    ) -> ChangeFlags {
        if self.base.in_refresh {
            trace!("ListView: ignoring reentrant refresh");
            return ChangeFlags::NONE;
        }
        self.base.in_refresh = true;

        let mut flags = refresh_view(self, new_data);
        flags |= self.refresh_children();

        if !self.current_key_list.is_empty() && self.selected_key != selected_key {
            let row = selected_key
                .as_ref()
                .and_then(|key| self.current_key_list.iter().position(|k| k == key));
            match row {
                Some(row) => self.set_current_row(row),
                None => self.clear_selection(),
            }
            self.selected_key = selected_key;
            flags |= ChangeFlags::SELECTION;
        }

        // drain notifications caused by our own changes
        self.handle_surface_events();
        self.base.in_refresh = false;
        flags
    }

    /// Refreshes every child view with its cached data.
    pub fn refresh_children(&mut self) -> ChangeFlags {
        let mut flags = ChangeFlags::NONE;
        for (view, data) in self
            .current_element_view_list
            .iter()
            .zip(self.current_element_view_data.iter())
        {
            flags |= view.borrow_mut().try_refresh(data.clone()).as_child();
        }
        flags
    }

    /// Delivers the pending notifications of the list surface.
    ///
    /// Hosts call this after dispatching user input to the surface.
    pub fn handle_surface_events(&mut self) {
        if self.base.widget_mut().take_selection_changed() {
            self.on_item_selection_changed();
        }
    }

    /// Handles a change of the current row of the surface.
    ///
    /// Changes made while the list is refreshing are not user-originated and are ignored.
    pub fn on_item_selection_changed(&mut self) {
        if !self.base.in_refresh {
            let row = self.base.widget().current_row();
            self.model.on_selection_changed(row);
        }
    }

    fn set_current_row(&mut self, row: usize) {
        let surface = self.base.widget_mut();
        if surface.current_row() != Some(row) {
            surface.set_current_row(Some(row));
        }
    }

    fn clear_selection(&mut self) {
        self.base.widget_mut().set_current_row(None);
    }

    /// Applies the diff between the displayed keys and the keys of `new_data`.
    fn reconcile(&mut self, new_data: &M::Collection) -> ChangeFlags {
        self.selected_key = None;
        let new_keys = self.model.generate_key_list(new_data);
        let edits = diff_keys(&self.current_key_list, &new_keys);
        trace!("ListView: {} edits", edits.len());

        // released views, by key; duplicate keys are matched last-in first-out
        let mut view_cache: HashMap<M::Key, SmallVec<[ViewRef<M::ElementView>; 1]>> = HashMap::new();
        let mut keys = std::mem::take(&mut self.current_key_list);
        let mut views = std::mem::take(&mut self.current_element_view_list);

        for edit in edits.iter() {
            match edit.op {
                Operation::Remove => {
                    keys.remove(edit.index);
                    let view = views.remove(edit.index);
                    let element = view.borrow().widget().element_id();
                    match self.base.widget_mut().take_item(edit.index) {
                        Some(taken) if taken == element => {}
                        taken => warn!(
                            "ListView: surface returned {:?} at row {}, expected {:?}",
                            taken, edit.index, element
                        ),
                    }
                    view_cache.entry(edit.item.clone()).or_default().push(view);
                }
                Operation::Insert => {
                    keys.insert(edit.index, edit.item.clone());
                    let view = match view_cache.get_mut(&edit.item).and_then(SmallVec::pop) {
                        Some(view) => view,
                        None => (self.element_view_factory)(),
                    };
                    let element = view.borrow().widget().element_id();
                    views.insert(edit.index, view);
                    self.base.widget_mut().insert_item(edit.index, element);
                }
            }
        }

        if keys != new_keys || views.len() != new_keys.len() {
            let err = Error::KeyListMismatch {
                expected: format!("{new_keys:?}"),
                actual: format!("{keys:?} ({} views)", views.len()),
            };
            error!("ListView: {err}");
            panic!("{err}");
        }

        // views still in the cache were removed for good
        drop(view_cache);

        self.current_key_list = new_keys;
        self.current_element_view_list = views;
        self.current_element_view_index.clear();
        self.current_element_view_data.clear();
        for (i, (view, key)) in self
            .current_element_view_list
            .iter()
            .zip(self.current_key_list.iter())
            .enumerate()
        {
            self.current_element_view_index.insert(view.borrow().base().id(), i);
            self.current_element_view_data
                .push(self.model.get_data_at(i, key, new_data));
        }

        if edits.is_empty() {
            ChangeFlags::NONE
        } else {
            ChangeFlags::STRUCTURE
        }
    }
}

impl<M: ListModel, S: ListSurface> View for ListView<M, S> {
    type Data = M::Collection;
    type Widget = S;

    fn base(&self) -> &ViewBase<M::Collection, S> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase<M::Collection, S> {
        &mut self.base
    }

    fn refresh(&mut self, new_data: &M::Collection) -> ChangeFlags {
        self.reconcile(new_data)
    }

    fn try_refresh(&mut self, new_data: M::Collection) -> ChangeFlags {
        self.try_refresh_with_selection(new_data, None)
    }

    fn iter_child_view(&self) -> Box<dyn Iterator<Item = NodeRef> + '_> {
        Box::new(
            self.current_element_view_list
                .iter()
                .map(|view| -> NodeRef { view.clone() }),
        )
    }
}
