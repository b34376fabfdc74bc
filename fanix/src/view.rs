//! View tree: binding data snapshots to rendered elements.
//!
//! A view holds the last snapshot it was refreshed with, one rendered element, and a list of child
//! bindings. Data flows down through [`View::try_refresh`]: the view re-renders itself if the snapshot
//! is not the *same* as the one it holds (see [`Data::same`]), then derives each child's data with the
//! binding's converter and refreshes the child. Edits flow up through the submission callback as new
//! snapshots; nothing in a view mutates the data it holds.
use crate::{debug_tree::base_type_name, surface::Widget, ViewId};
use bitflags::bitflags;
use fanix_common::Data;
use std::{any, cell::RefCell, fmt, mem, rc::Rc};
use tracing::trace;

/// Upward channel: receives a proposed snapshot and whether it should be recorded in the history.
pub type SubmitFn<T> = Rc<dyn Fn(T, bool)>;

/// Shared handle to a view.
pub type ViewRef<V> = Rc<RefCell<V>>;

/// Type-erased handle to a view, for traversal.
pub type NodeRef = Rc<RefCell<dyn ViewNode>>;

/// Data held by a view.
#[derive(Clone, Debug, Default)]
pub enum DataSlot<T> {
    /// The view hasn't been refreshed yet.
    #[default]
    Uninitialized,
    Data(T),
}

impl<T> DataSlot<T> {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, DataSlot::Uninitialized)
    }

    pub fn as_data(&self) -> Option<&T> {
        match self {
            DataSlot::Data(data) => Some(data),
            DataSlot::Uninitialized => None,
        }
    }
}

bitflags! {
    /// What happened during a refresh.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ChangeFlags: u32 {
        const NONE = 0;
        /// The view's own `refresh` hook ran.
        const REFRESH = 1 << 0;
        /// A descendant reported a change.
        const CHILDREN = 1 << 1;
        /// Child views were inserted or removed.
        const STRUCTURE = 1 << 2;
        /// The selection was updated.
        const SELECTION = 1 << 3;
    }
}

impl ChangeFlags {
    /// The flags a parent reports for a child that returned `self`.
    pub fn as_child(self) -> ChangeFlags {
        if self.is_empty() {
            ChangeFlags::NONE
        } else {
            ChangeFlags::CHILDREN | (self & ChangeFlags::STRUCTURE)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A child view with the converter deriving its data from the parent's.
trait AnyBinding<T> {
    fn node(&self) -> NodeRef;
    fn is_view(&self, view: *const ()) -> bool;
    /// Recomputes and caches the child data.
    fn convert(&mut self, data: &T);
    /// Refreshes the child with the cached data.
    fn refresh_child(&mut self) -> ChangeFlags;
}

struct Binding<T, V: View> {
    view: ViewRef<V>,
    data_converter: Box<dyn Fn(&T) -> V::Data>,
    data: Option<V::Data>,
}

impl<T: 'static, V: View> AnyBinding<T> for Binding<T, V> {
    fn node(&self) -> NodeRef {
        self.view.clone()
    }

    fn is_view(&self, view: *const ()) -> bool {
        Rc::as_ptr(&self.view) as *const () == view
    }

    fn convert(&mut self, data: &T) {
        self.data = Some((self.data_converter)(data));
    }

    fn refresh_child(&mut self) -> ChangeFlags {
        match &self.data {
            Some(data) => self.view.borrow_mut().try_refresh(data.clone()).as_child(),
            None => ChangeFlags::NONE,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// State shared by all views.
///
/// Concrete views embed one and expose it through [`View::base`].
pub struct ViewBase<T, W> {
    id: ViewId,
    widget: W,
    current_data: DataSlot<T>,
    old_data: DataSlot<T>,
    submit_data_callback: Option<SubmitFn<T>>,
    children: Vec<Box<dyn AnyBinding<T>>>,
    pub(crate) in_refresh: bool,
    should_refresh_internally: bool,
}

impl<T: Data, W: Widget> ViewBase<T, W> {
    /// Creates the base state of a view owning `widget`.
    ///
    /// The widget is created once, before the view is ever refreshed, and is never replaced.
    pub fn new(widget: W, submit_data_callback: Option<SubmitFn<T>>) -> ViewBase<T, W> {
        ViewBase {
            id: ViewId::next(),
            widget,
            current_data: DataSlot::Uninitialized,
            old_data: DataSlot::Uninitialized,
            submit_data_callback,
            children: Vec::new(),
            in_refresh: false,
            should_refresh_internally: false,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn current_data(&self) -> &DataSlot<T> {
        &self.current_data
    }

    pub fn old_data(&self) -> &DataSlot<T> {
        &self.old_data
    }

    /// Replaces the current data, remembering the previous one as the old data.
    pub fn set_current_data(&mut self, data: T) {
        self.old_data = mem::replace(&mut self.current_data, DataSlot::Data(data));
    }

    pub fn submit_data_callback(&self) -> Option<&SubmitFn<T>> {
        self.submit_data_callback.as_ref()
    }

    /// Returns whether the view is currently running its refresh hook.
    ///
    /// Handlers of notifications raised by the rendering surface check this to ignore changes made
    /// programmatically during the refresh.
    pub fn in_refresh(&self) -> bool {
        self.in_refresh
    }

    pub fn should_refresh_internally(&self) -> bool {
        self.should_refresh_internally
    }

    /// Forces (or cancels) a refresh on the next `try_refresh`, even if the data is the same.
    pub fn mark_should_refresh_internally(&mut self, flag: bool) {
        self.should_refresh_internally = flag;
    }

    /// Binds a child view: on every refresh, `data_converter` derives the child's data from this
    /// view's data. Returns the child.
    ///
    /// Rebinding a bound child replaces its converter and keeps its position.
    pub fn bind_child_view<V, F>(&mut self, view: ViewRef<V>, data_converter: F) -> ViewRef<V>
    where
        V: View,
        F: Fn(&T) -> V::Data + 'static,
    {
        let binding: Box<dyn AnyBinding<T>> = Box::new(Binding {
            view: view.clone(),
            data_converter: Box::new(data_converter),
            data: None,
        });
        let ptr = Rc::as_ptr(&view) as *const ();
        match self.children.iter_mut().find(|bound| bound.is_view(ptr)) {
            Some(bound) => *bound = binding,
            None => self.children.push(binding),
        }
        view
    }

    /// Removes the binding of `view`, along with its cached data. Returns whether it was bound.
    pub fn unbind_child_view<V: View>(&mut self, view: &ViewRef<V>) -> bool {
        let ptr = Rc::as_ptr(view) as *const ();
        let len = self.children.len();
        self.children.retain(|binding| !binding.is_view(ptr));
        self.children.len() != len
    }

    /// Iterates over the bound child views, in binding order.
    pub fn bound_children(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.children.iter().map(|binding| binding.node())
    }

    /// Derives the data of every bound child, then refreshes them in binding order.
    fn refresh_bindings(&mut self, data: &T) -> ChangeFlags {
        for binding in self.children.iter_mut() {
            binding.convert(data);
        }
        let mut flags = ChangeFlags::NONE;
        for binding in self.children.iter_mut() {
            flags |= binding.refresh_child();
        }
        flags
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A node of the view tree.
pub trait View: 'static {
    /// Snapshot type this view is bound to.
    type Data: Data + fmt::Debug;
    /// Rendered element owned by the view.
    type Widget: Widget;

    fn base(&self) -> &ViewBase<Self::Data, Self::Widget>;
    fn base_mut(&mut self) -> &mut ViewBase<Self::Data, Self::Widget>;

    fn widget(&self) -> &Self::Widget {
        self.base().widget()
    }

    /// Renders `new_data` into the widget. Called only when the data changed (or a refresh was forced).
    ///
    /// Returns flags to report in addition to [`ChangeFlags::REFRESH`].
    fn refresh(&mut self, _new_data: &Self::Data) -> ChangeFlags {
        ChangeFlags::NONE
    }

    /// Returns whether `new_data` should be rendered given the currently held data.
    fn should_refresh(&self, new_data: &Self::Data, current_data: &DataSlot<Self::Data>) -> bool {
        match current_data {
            DataSlot::Data(current_data) => !new_data.same(current_data),
            DataSlot::Uninitialized => true,
        }
    }

    fn should_refresh_children(&self) -> bool {
        true
    }

    /// Validates a snapshot before it is submitted. Invalid snapshots are silently dropped.
    fn data_valid(&self, _new_data: &Self::Data) -> bool {
        true
    }

    /// Refreshes the view and its children with `new_data`.
    fn try_refresh(&mut self, new_data: Self::Data) -> ChangeFlags {
        refresh_view(self, new_data)
    }

    /// Proposes a new snapshot to the owner of this view.
    ///
    /// Does not touch the current data: the owner is expected to re-enter the snapshot through
    /// `try_refresh`. Returns whether the submission callback was invoked.
    fn submit_data(&self, new_data: Self::Data, record_in_history: bool) -> bool {
        match self.base().submit_data_callback() {
            Some(callback) if self.data_valid(&new_data) => {
                callback(new_data, record_in_history);
                true
            }
            Some(_) => {
                trace!(view = self.name(), "submitted data rejected by validation");
                false
            }
            None => false,
        }
    }

    /// Iterates over the child views.
    fn iter_child_view(&self) -> Box<dyn Iterator<Item = NodeRef> + '_> {
        Box::new(self.base().bound_children())
    }

    /// Display name of the view.
    fn name(&self) -> &'static str {
        base_type_name(any::type_name::<Self>())
    }
}

/// The refresh algorithm of [`View::try_refresh`].
///
/// Views overriding `try_refresh` call this to run the default behavior: refresh the view itself if
/// needed, then refresh the bound children. The view always refreshes before its children.
pub fn refresh_view<V: View + ?Sized>(view: &mut V, new_data: V::Data) -> ChangeFlags {
    let mut flags = ChangeFlags::NONE;

    let needs_refresh = {
        let base = view.base();
        base.should_refresh_internally() || view.should_refresh(&new_data, base.current_data())
    };

    if needs_refresh {
        trace!(view = view.name(), id = ?view.base().id(), "refresh");
        let base = view.base_mut();
        base.set_current_data(new_data.clone());
        let was_in_refresh = mem::replace(&mut base.in_refresh, true);
        flags |= ChangeFlags::REFRESH | view.refresh(&new_data);
        let base = view.base_mut();
        base.in_refresh = was_in_refresh;
        base.mark_should_refresh_internally(false);
    }

    if view.should_refresh_children() {
        flags |= view.base_mut().refresh_bindings(&new_data);
    }
    flags
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Read-only, type-erased access to a view, for introspection.
pub trait ViewNode {
    fn view_id(&self) -> ViewId;
    fn view_name(&self) -> &'static str;
    /// Debug rendering of the current data.
    fn debug_data(&self) -> String;
    /// Identity of the submission callback, if any.
    fn submit_callback_id(&self) -> Option<usize>;
    fn child_nodes(&self) -> Vec<NodeRef>;
}

impl<V: View> ViewNode for V {
    fn view_id(&self) -> ViewId {
        self.base().id()
    }

    fn view_name(&self) -> &'static str {
        self.name()
    }

    fn debug_data(&self) -> String {
        match self.base().current_data() {
            DataSlot::Data(data) => format!("{data:?}"),
            DataSlot::Uninitialized => "<uninitialized>".to_string(),
        }
    }

    fn submit_callback_id(&self) -> Option<usize> {
        self.base()
            .submit_data_callback()
            .map(|callback| Rc::as_ptr(callback) as *const () as usize)
    }

    fn child_nodes(&self) -> Vec<NodeRef> {
        self.iter_child_view().collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::headless::HeadlessWidget;
    use std::cell::Cell;

    /// Leaf view counting its refreshes.
    pub(crate) struct Counting<T> {
        base: ViewBase<T, HeadlessWidget>,
        pub(crate) refreshes: Rc<Cell<usize>>,
    }

    impl<T: Data + fmt::Debug> Counting<T> {
        pub(crate) fn new(submit: Option<SubmitFn<T>>) -> Counting<T> {
            Counting {
                base: ViewBase::new(HeadlessWidget::new(), submit),
                refreshes: Rc::new(Cell::new(0)),
            }
        }
    }

    impl<T: Data + fmt::Debug> View for Counting<T> {
        type Data = T;
        type Widget = HeadlessWidget;

        fn base(&self) -> &ViewBase<T, HeadlessWidget> {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ViewBase<T, HeadlessWidget> {
            &mut self.base
        }

        fn refresh(&mut self, new_data: &T) -> ChangeFlags {
            assert!(self.base.in_refresh());
            self.refreshes.set(self.refreshes.get() + 1);
            self.base.widget_mut().set_text(format!("{new_data:?}"));
            ChangeFlags::NONE
        }
    }

    #[derive(Debug)]
    struct Pair {
        left: Rc<String>,
        right: Rc<String>,
    }

    #[test]
    fn refresh_is_gated_by_identity() {
        let mut view = Counting::<Rc<String>>::new(None);
        let data = Rc::new("hello".to_string());

        assert!(view.try_refresh(data.clone()).contains(ChangeFlags::REFRESH));
        assert!(view.try_refresh(data.clone()).is_empty());
        assert_eq!(view.refreshes.get(), 1);

        // equal but not the same snapshot
        view.try_refresh(Rc::new("hello".to_string()));
        assert_eq!(view.refreshes.get(), 2);
        assert!(matches!(view.base().old_data(), DataSlot::Data(old) if Rc::ptr_eq(old, &data)));
    }

    #[test]
    fn forced_refresh_is_one_shot() {
        let mut view = Counting::<Rc<String>>::new(None);
        let data = Rc::new("x".to_string());
        view.try_refresh(data.clone());
        view.base_mut().mark_should_refresh_internally(true);
        view.try_refresh(data.clone());
        view.try_refresh(data.clone());
        assert_eq!(view.refreshes.get(), 2);
        assert!(!view.base().should_refresh_internally());
    }

    #[test]
    fn children_receive_converted_data() {
        let mut parent = Counting::<Rc<Pair>>::new(None);
        let left = parent.base_mut().bind_child_view(
            Rc::new(RefCell::new(Counting::<Rc<String>>::new(None))),
            |pair: &Rc<Pair>| pair.left.clone(),
        );
        let right = parent.base_mut().bind_child_view(
            Rc::new(RefCell::new(Counting::<Rc<String>>::new(None))),
            |pair: &Rc<Pair>| pair.right.clone(),
        );

        let shared_right = Rc::new("right".to_string());
        let first = Rc::new(Pair {
            left: Rc::new("left".to_string()),
            right: shared_right.clone(),
        });
        let flags = parent.try_refresh(first);
        assert!(flags.contains(ChangeFlags::REFRESH | ChangeFlags::CHILDREN));
        assert_eq!(left.borrow().widget().text(), "\"left\"");
        assert_eq!(right.borrow().widget().text(), "\"right\"");

        // only the left side changed
        let second = Rc::new(Pair {
            left: Rc::new("LEFT".to_string()),
            right: shared_right,
        });
        parent.try_refresh(second);
        assert_eq!(left.borrow().refreshes.get(), 2);
        assert_eq!(right.borrow().refreshes.get(), 1);

        assert_eq!(parent.child_nodes().len(), 2);
        assert!(parent.base_mut().unbind_child_view(&left));
        assert!(!parent.base_mut().unbind_child_view(&left));
        parent.try_refresh(Rc::new(Pair {
            left: Rc::new("gone".to_string()),
            right: Rc::new("still bound".to_string()),
        }));
        assert_eq!(left.borrow().refreshes.get(), 2);
        assert_eq!(right.borrow().refreshes.get(), 2);
    }

    #[test]
    fn rebinding_replaces_the_converter() {
        let mut parent = Counting::<i32>::new(None);
        let first = parent
            .base_mut()
            .bind_child_view(Rc::new(RefCell::new(Counting::<i32>::new(None))), |x: &i32| *x);
        let child = parent
            .base_mut()
            .bind_child_view(Rc::new(RefCell::new(Counting::<i32>::new(None))), |x: &i32| x + 100);
        parent.base_mut().bind_child_view(child.clone(), |x: &i32| x + 10);

        parent.try_refresh(1);
        assert_eq!(parent.child_nodes().len(), 2);
        assert_eq!(child.borrow().refreshes.get(), 1);
        assert_eq!(child.borrow().widget().text(), "11");
        // order is unchanged
        assert_eq!(parent.child_nodes()[0].borrow().view_id(), first.borrow().base().id());
        assert_eq!(parent.child_nodes()[1].borrow().view_id(), child.borrow().base().id());
    }

    #[test]
    fn children_are_refreshed_even_if_parent_data_is_the_same() {
        let mut parent = Counting::<Rc<String>>::new(None);
        let child = parent
            .base_mut()
            .bind_child_view(Rc::new(RefCell::new(Counting::<Rc<String>>::new(None))), Rc::clone);
        let data = Rc::new("a".to_string());
        parent.try_refresh(data.clone());
        child.borrow_mut().base_mut().mark_should_refresh_internally(true);
        let flags = parent.try_refresh(data);
        assert_eq!(flags, ChangeFlags::CHILDREN);
        assert_eq!(child.borrow().refreshes.get(), 2);
    }

    #[test]
    fn submit_goes_through_validation() {
        struct Positive(Counting<i32>);

        impl View for Positive {
            type Data = i32;
            type Widget = HeadlessWidget;

            fn base(&self) -> &ViewBase<i32, HeadlessWidget> {
                self.0.base()
            }

            fn base_mut(&mut self) -> &mut ViewBase<i32, HeadlessWidget> {
                self.0.base_mut()
            }

            fn data_valid(&self, new_data: &i32) -> bool {
                *new_data > 0
            }
        }

        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let view = Positive(Counting::new(Some(Rc::new(move |value: i32, record: bool| {
            sink.borrow_mut().push((value, record))
        }))));

        assert!(view.submit_data(3, false));
        assert!(!view.submit_data(-1, true));
        assert_eq!(*received.borrow(), vec![(3, false)]);
        // no local mutation
        assert!(view.base().current_data().is_uninitialized());

        assert!(!Counting::<i32>::new(None).submit_data(1, true));
    }

    #[test]
    fn view_node_introspection() {
        let callback: SubmitFn<i32> = Rc::new(|_, _| {});
        let mut view = Counting::<i32>::new(Some(callback.clone()));
        assert_eq!(view.debug_data(), "<uninitialized>");
        view.try_refresh(7);
        assert_eq!(view.debug_data(), "7");
        assert_eq!(view.view_name(), "Counting");
        assert_eq!(view.submit_callback_id(), Some(Rc::as_ptr(&callback) as *const () as usize));
    }
}
