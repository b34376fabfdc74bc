//! Debugging utilities
use crate::{
    surface::{DialogSurface, TreeSurface, Widget},
    ChangeFlags, NodeRef, SubmitFn, View, ViewBase, ViewId, ViewRef,
};
use serde::Serialize;
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};
use tracing::warn;

/// Try to extract the base type name (e.g. `ListView` in `fanix::list_view::ListView<...>`).
pub(crate) fn base_type_name(name: &str) -> &str {
    let first_angle_bracket = name.find('<');
    let last_double_colon = if let Some(p) = first_angle_bracket {
        name[0..p].rfind("::").map(|p| p + 2)
    } else {
        name.rfind("::").map(|p| p + 2)
    };
    &name[last_double_colon.unwrap_or(0)..first_angle_bracket.unwrap_or(name.len())]
}

/// Snapshot of a view and its descendants.
#[derive(Clone, Debug, Serialize)]
pub struct DebugViewData {
    pub id: ViewId,
    pub name: String,
    /// Debug rendering of the data held by the view.
    pub data: String,
    /// Identity of the submission callback.
    pub submit_callback: Option<usize>,
    pub child_views: Vec<DebugViewData>,
}

impl DebugViewData {
    /// Captures the tree rooted at `node`.
    ///
    /// Returns `None` if `node` is mutably borrowed, i.e. it is refreshing. Such descendants are skipped.
    pub fn capture(node: &NodeRef) -> Option<DebugViewData> {
        let node = node.try_borrow().ok()?;
        Some(DebugViewData {
            id: node.view_id(),
            name: node.view_name().to_string(),
            data: node.debug_data(),
            submit_callback: node.submit_callback_id(),
            child_views: node.child_nodes().iter().filter_map(DebugViewData::capture).collect(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn fmt_rec(&self, f: &mut fmt::Formatter, indent: usize, lines: &mut Vec<usize>, is_last: bool) -> fmt::Result {
        let mut pad = vec![' '; indent];
        for &p in lines.iter() {
            pad[p] = '│';
        }
        let pad: String = pad.into_iter().collect();
        writeln!(
            f,
            "{}{}{}({:?})  `{}`",
            pad,
            if is_last { "└" } else { "├" },
            self.name,
            self.id,
            self.data
        )?;

        if !is_last {
            lines.push(indent);
        }
        for (i, child) in self.child_views.iter().enumerate() {
            child.fmt_rec(f, indent + 2, lines, i == self.child_views.len() - 1)?;
        }
        if !is_last {
            lines.pop();
        }
        Ok(())
    }
}

impl fmt::Display for DebugViewData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_rec(f, 0, &mut Vec::new(), true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Mirrors a captured view tree into a three-column tree surface (view, data, submission callback).
///
/// Rows are matched by view ID: children are compared by presence, not by position.
pub struct DebugViewTree<S: TreeSurface> {
    base: ViewBase<Rc<DebugViewData>, S>,
    root: Option<ViewId>,
    view_item: HashMap<ViewId, S::Item>,
    children: HashMap<ViewId, Vec<ViewId>>,
}

impl<S: TreeSurface> DebugViewTree<S> {
    pub fn new(surface: S, submit_data_callback: Option<SubmitFn<Rc<DebugViewData>>>) -> DebugViewTree<S> {
        DebugViewTree {
            base: ViewBase::new(surface, submit_data_callback),
            root: None,
            view_item: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Returns the tree item displaying the view with the given ID.
    pub fn item(&self, id: ViewId) -> Option<S::Item> {
        self.view_item.get(&id).copied()
    }

    fn add_view(&mut self, id: ViewId, parent: Option<S::Item>) {
        let item = self.base.widget_mut().add_item(parent);
        self.view_item.insert(id, item);
    }

    fn update_view(&mut self, view: &DebugViewData) {
        let Some(item) = self.item(view.id) else {
            warn!("DebugViewTree: no item for view {:?}", view.id);
            return;
        };
        let surface = self.base.widget_mut();
        surface.set_text(item, 0, &view.name);
        surface.set_text(item, 1, &view.data);
        match view.submit_callback {
            Some(callback) => surface.set_text(item, 2, &format!("{callback:#x}")),
            None => surface.set_text(item, 2, "None"),
        }

        let old_children = self.children.remove(&view.id).unwrap_or_default();
        let new_children: Vec<ViewId> = view.child_views.iter().map(|child| child.id).collect();
        for &child_id in old_children.iter().filter(|id| !new_children.contains(id)) {
            if let Some(child_item) = self.remove_view(child_id) {
                self.base.widget_mut().remove_item(child_item);
            }
        }
        for child in view.child_views.iter() {
            if !old_children.contains(&child.id) && !self.view_item.contains_key(&child.id) {
                self.add_view(child.id, Some(item));
            }
        }
        for child in view.child_views.iter() {
            self.update_view(child);
        }
        self.children.insert(view.id, new_children);
    }

    /// Forgets a view and its descendants. Returns the item of the view.
    fn remove_view(&mut self, id: ViewId) -> Option<S::Item> {
        for child_id in self.children.remove(&id).unwrap_or_default() {
            self.remove_view(child_id);
        }
        self.view_item.remove(&id)
    }
}

impl<S: TreeSurface> View for DebugViewTree<S> {
    type Data = Rc<DebugViewData>;
    type Widget = S;

    fn base(&self) -> &ViewBase<Rc<DebugViewData>, S> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase<Rc<DebugViewData>, S> {
        &mut self.base
    }

    fn refresh(&mut self, view_data: &Rc<DebugViewData>) -> ChangeFlags {
        if self.root != Some(view_data.id) {
            if let Some(old_root) = self.root {
                if let Some(item) = self.remove_view(old_root) {
                    self.base.widget_mut().remove_item(item);
                }
            }
            self.add_view(view_data.id, None);
            self.root = Some(view_data.id);
        }
        self.update_view(view_data);
        ChangeFlags::NONE
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A dialog showing the mirror of a view tree.
pub struct DebugView<D: DialogSurface, S: TreeSurface> {
    base: ViewBase<Rc<DebugViewData>, D>,
    tree: ViewRef<DebugViewTree<S>>,
}

impl<D: DialogSurface, S: TreeSurface> DebugView<D, S> {
    pub fn new(mut dialog: D, tree_surface: S) -> DebugView<D, S> {
        let tree = Rc::new(RefCell::new(DebugViewTree::new(tree_surface, None)));
        dialog.set_content(tree.borrow().widget().element_id());
        let mut base = ViewBase::new(dialog, None);
        let tree = base.bind_child_view(tree, Rc::clone);
        DebugView { base, tree }
    }

    pub fn tree(&self) -> &ViewRef<DebugViewTree<S>> {
        &self.tree
    }
}

impl<D: DialogSurface, S: TreeSurface> View for DebugView<D, S> {
    type Data = Rc<DebugViewData>;
    type Widget = D;

    fn base(&self) -> &ViewBase<Rc<DebugViewData>, D> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase<Rc<DebugViewData>, D> {
        &mut self.base
    }
}
