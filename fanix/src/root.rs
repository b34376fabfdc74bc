//! Root of a view tree: owns the current snapshot and re-enters submitted ones.
use crate::{ChangeFlags, Error, SubmitFn, View, ViewRef};
use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt, mem,
    rc::Rc,
};
use tracing::debug;

/// A snapshot proposed by a view.
#[derive(Clone, Debug)]
pub struct Submission<T> {
    pub data: T,
    pub record_in_history: bool,
}

/// Submissions waiting to be applied to the root.
///
/// Views submit while they are borrowed (e.g. from an input handler), so the root can't refresh the tree
/// synchronously: submissions are queued and applied by [`Root::process_submissions`].
pub struct SubmissionQueue<T> {
    submissions: RefCell<VecDeque<Submission<T>>>,
}

impl<T> Default for SubmissionQueue<T> {
    fn default() -> Self {
        SubmissionQueue::new()
    }
}

impl<T> SubmissionQueue<T> {
    pub fn new() -> SubmissionQueue<T> {
        SubmissionQueue {
            submissions: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, submission: Submission<T>) {
        self.submissions.borrow_mut().push_back(submission);
    }

    pub fn pop(&self) -> Option<Submission<T>> {
        self.submissions.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.submissions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.borrow().is_empty()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Undo and redo stacks of snapshots.
///
/// Holds at most `limit` undo steps, dropping the oldest ones. A limit of 0 disables the history.
#[derive(Clone, Debug)]
pub struct History<T> {
    limit: usize,
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
}

impl<T> History<T> {
    pub fn new(limit: usize) -> History<T> {
        History {
            limit,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records the snapshot that was current before an edit. Clears the redo stack.
    pub fn record(&mut self, previous: T) {
        self.redo_stack.clear();
        if self.limit == 0 {
            return;
        }
        self.undo_stack.push_back(previous);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Drops the redo stack.
    ///
    /// Called on edits that are not recorded: they branch off the redo path all the same.
    pub fn discard_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Steps back: returns the snapshot to restore, remembering `current` for redo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Steps forward: returns the snapshot to restore, remembering `current` for undo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Owns the root snapshot and the root view.
pub struct Root<V: View> {
    data: V::Data,
    view: ViewRef<V>,
    queue: Rc<SubmissionQueue<V::Data>>,
    history: History<V::Data>,
}

impl<V: View> Root<V> {
    /// Builds the root view with `build`, which receives the root submission callback, and refreshes it
    /// with `initial`.
    pub fn new(
        initial: V::Data,
        history_limit: usize,
        build: impl FnOnce(SubmitFn<V::Data>) -> ViewRef<V>,
    ) -> Root<V> {
        let queue = Rc::new(SubmissionQueue::new());
        let view = build(submitter(&queue));
        let mut root = Root {
            data: initial,
            view,
            queue,
            history: History::new(history_limit),
        };
        root.refresh();
        root
    }

    pub fn view(&self) -> &ViewRef<V> {
        &self.view
    }

    pub fn current_data(&self) -> &V::Data {
        &self.data
    }

    pub fn history(&self) -> &History<V::Data> {
        &self.history
    }

    /// Returns a callback queuing submissions to this root.
    pub fn submitter(&self) -> SubmitFn<V::Data> {
        submitter(&self.queue)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Applies the queued submissions in order, then refreshes the tree.
    ///
    /// Submissions queued during the refresh are applied too.
    pub fn process_submissions(&mut self) -> ChangeFlags {
        let mut flags = ChangeFlags::NONE;
        while !self.queue.is_empty() {
            while let Some(submission) = self.queue.pop() {
                debug!(
                    record_in_history = submission.record_in_history,
                    "Root: applying submission"
                );
                self.replace_data(submission.data, submission.record_in_history);
            }
            flags |= self.refresh();
        }
        flags
    }

    /// Replaces the current snapshot and refreshes the tree.
    pub fn set_data(&mut self, data: V::Data, record_in_history: bool) -> ChangeFlags {
        self.replace_data(data, record_in_history);
        self.refresh()
    }

    /// Refreshes the tree with the current snapshot.
    pub fn refresh(&mut self) -> ChangeFlags {
        self.view.borrow_mut().try_refresh(self.data.clone())
    }

    pub fn undo(&mut self) -> Result<ChangeFlags, Error> {
        let previous = self
            .history
            .undo(self.data.clone())
            .ok_or(Error::NothingToUndo)?;
        debug!("Root: undo");
        self.data = previous;
        Ok(self.refresh())
    }

    pub fn redo(&mut self) -> Result<ChangeFlags, Error> {
        let next = self.history.redo(self.data.clone()).ok_or(Error::NothingToRedo)?;
        debug!("Root: redo");
        self.data = next;
        Ok(self.refresh())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn replace_data(&mut self, data: V::Data, record_in_history: bool) {
        let previous = mem::replace(&mut self.data, data);
        if record_in_history {
            self.history.record(previous);
        } else {
            self.history.discard_redo();
        }
    }
}

impl<V: View> fmt::Debug for Root<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Root")
            .field("data", &self.data)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

fn submitter<T: 'static>(queue: &Rc<SubmissionQueue<T>>) -> SubmitFn<T> {
    let queue = queue.clone();
    Rc::new(move |data: T, record_in_history: bool| {
        queue.push(Submission {
            data,
            record_in_history,
        })
    })
}
