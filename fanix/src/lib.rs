//! Reactive view trees.
//!
//! Binds immutable data snapshots to a tree of views. Snapshots flow down the tree with
//! [`View::try_refresh`]; edits flow back up as new snapshots through submission callbacks, and are
//! re-entered at the [`Root`].
//!
//! # Modules
//! * [`diff`]: edit scripts between keyed sequences, used to reconcile lists
//! * [`surface`]: the interface to the rendering toolkit
//! * [`headless`]: in-memory rendering surface

// public modules
pub mod diff;
pub mod headless;
pub mod surface;

// internal modules
mod application;
mod debug_tree;
mod error;
mod field;
mod form_view;
mod id;
mod list_view;
mod root;
mod view;

// public exports
pub use application::{Application, Config, Host};
pub use debug_tree::{DebugView, DebugViewData, DebugViewTree};
pub use error::Error;
pub use field::Field;
pub use form_view::FormView;
pub use id::{ElementId, ViewId};
pub use list_view::{ListModel, ListView};
pub use root::{History, Root, Submission, SubmissionQueue};
pub use view::{refresh_view, ChangeFlags, DataSlot, NodeRef, SubmitFn, View, ViewBase, ViewNode, ViewRef};

// fanix-common reexports
pub use fanix_common::Data;
