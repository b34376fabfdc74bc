//! Forms: one child view per field of a record.
use crate::{
    surface::{FormSurface, Widget},
    DataSlot, ElementId, Field, SubmitFn, View, ViewBase, ViewRef,
};
use fanix_common::Data;
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};
use tracing::{trace, warn};

/// A view editing the fields of a record.
///
/// Each row binds a child view to a [`Field`] of the record. Downward, the child receives the field value;
/// upward, an edit of the field is turned into a whole new record (with [`Field::set`]) and submitted
/// by the form.
pub struct FormView<T, S> {
    base: ViewBase<T, S>,
    this: Weak<RefCell<FormView<T, S>>>,
    validator: Option<Box<dyn Fn(&T) -> bool>>,
}

impl<T: Data + fmt::Debug, S: FormSurface> FormView<T, S> {
    pub fn new(surface: S, submit_data_callback: Option<SubmitFn<T>>) -> ViewRef<FormView<T, S>> {
        Rc::new_cyclic(|this| {
            RefCell::new(FormView {
                base: ViewBase::new(surface, submit_data_callback),
                this: this.clone(),
                validator: None,
            })
        })
    }

    /// Adds a row editing `field`.
    ///
    /// `view_factory` receives the submission callback of the child view and returns the view.
    pub fn append_item_edit<V, F>(&mut self, label: &str, field: Field<T, V::Data>, view_factory: F) -> ViewRef<V>
    where
        V: View,
        F: FnOnce(SubmitFn<V::Data>) -> ViewRef<V>,
    {
        let this = self.this.clone();
        let submit: SubmitFn<V::Data> = Rc::new(move |value: V::Data, record_in_history: bool| {
            let Some(form) = this.upgrade() else {
                return;
            };
            // the form is mutably borrowed while it refreshes its children
            let borrowed = form.try_borrow();
            match borrowed {
                Ok(form) => {
                    form.update_item(field, value, record_in_history);
                }
                Err(_) => warn!(field = field.name(), "FormView: edit submitted during refresh, dropped"),
            };
        });

        let view = view_factory(submit);
        let element = view.borrow().widget().element_id();
        self.add_row(label, element);
        self.base.bind_child_view(view, move |data: &T| field.get(data))
    }

    pub fn add_row(&mut self, label: &str, element: ElementId) {
        self.base.widget_mut().add_row(label, element);
    }

    /// Submits the current record with `field` set to `value`.
    ///
    /// Returns whether the new record was submitted: nothing happens if the form hasn't received a record
    /// yet, or if the new record fails validation.
    pub fn update_item<V>(&self, field: Field<T, V>, value: V, record_in_history: bool) -> bool {
        match self.base.current_data() {
            DataSlot::Data(data) => {
                let new_data = field.set(data, value);
                self.submit_data(new_data, record_in_history)
            }
            DataSlot::Uninitialized => {
                trace!(field = field.name(), "FormView: no record, edit dropped");
                false
            }
        }
    }

    /// Sets the predicate records must satisfy to be submitted.
    pub fn set_validator(&mut self, validator: impl Fn(&T) -> bool + 'static) {
        self.validator = Some(Box::new(validator));
    }
}

impl<T: Data + fmt::Debug, S: FormSurface> View for FormView<T, S> {
    type Data = T;
    type Widget = S;

    fn base(&self) -> &ViewBase<T, S> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase<T, S> {
        &mut self.base
    }

    fn data_valid(&self, new_data: &T) -> bool {
        self.validator.as_ref().map_or(true, |validator| validator(new_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        headless::{HeadlessForm, LineEditView},
        view::tests::Counting,
        ViewNode,
    };

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    type Submitted = Rc<RefCell<Vec<(Rc<Person>, bool)>>>;

    fn person_form() -> (
        ViewRef<FormView<Rc<Person>, HeadlessForm>>,
        ViewRef<LineEditView>,
        ViewRef<Counting<u32>>,
        Submitted,
    ) {
        let submitted: Submitted = Default::default();
        let sink = submitted.clone();
        let form: ViewRef<FormView<Rc<Person>, HeadlessForm>> = FormView::new(
            HeadlessForm::new(),
            Some(Rc::new(move |data: Rc<Person>, record: bool| {
                sink.borrow_mut().push((data, record))
            })),
        );
        let name = form
            .borrow_mut()
            .append_item_edit("Name", crate::field!(Person, name), LineEditView::new);
        let age = form
            .borrow_mut()
            .append_item_edit("Age", crate::field!(Person, age), |submit: SubmitFn<u32>| {
                Rc::new(RefCell::new(Counting::<u32>::new(Some(submit))))
            });
        (form, name, age, submitted)
    }

    fn bob() -> Rc<Person> {
        Rc::new(Person {
            name: "Bob".to_string(),
            age: 42,
        })
    }

    #[test]
    fn rows_are_added_in_order() {
        let (form, name, age, _) = person_form();
        let form = form.borrow();
        let rows = form.widget().rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("Name".to_string(), name.borrow().widget().element_id()));
        assert_eq!(rows[1], ("Age".to_string(), age.borrow().widget().element_id()));
        assert_eq!(form.child_nodes().len(), 2);
    }

    #[test]
    fn fields_are_projected_downward() {
        let (form, name, age, _) = person_form();
        form.borrow_mut().try_refresh(bob());
        assert_eq!(name.borrow().widget().text(), "Bob");
        assert_eq!(age.borrow().widget().text(), "42");
    }

    #[test]
    fn edits_submit_a_whole_new_record() {
        let (form, name, age, submitted) = person_form();
        let original = bob();
        form.borrow_mut().try_refresh(original.clone());

        assert!(name.borrow().edit("Alice"));
        assert!(age.borrow().submit_data(43, false));

        let submitted = submitted.borrow();
        assert_eq!(submitted.len(), 2);
        assert_eq!(
            *submitted[0].0,
            Person {
                name: "Alice".to_string(),
                age: 42
            }
        );
        assert!(submitted[0].1);
        assert_eq!(submitted[1].0.age, 43);
        assert!(!submitted[1].1);
        // nothing changes until the new record comes back down
        assert_eq!(original.name, "Bob");
        assert!(Rc::ptr_eq(form.borrow().base().current_data().as_data().unwrap(), &original));
    }

    #[test]
    fn edits_before_the_first_refresh_are_dropped() {
        let (_form, name, _, submitted) = person_form();
        name.borrow().edit("Alice");
        assert!(submitted.borrow().is_empty());
    }

    #[test]
    fn edits_while_the_form_is_borrowed_are_dropped() {
        let (form, name, _, submitted) = person_form();
        form.borrow_mut().try_refresh(bob());
        {
            let _refreshing = form.borrow_mut();
            // the child still submits, the form can't take it
            assert!(name.borrow().edit("Alice"));
        }
        assert!(submitted.borrow().is_empty());
        assert!(name.borrow().edit("Alice"));
        assert_eq!(submitted.borrow()[0].0.name, "Alice");
    }

    #[test]
    fn validator_rejects_records() {
        let (form, name, _, submitted) = person_form();
        form.borrow_mut().set_validator(|person: &Rc<Person>| !person.name.is_empty());
        form.borrow_mut().try_refresh(bob());

        name.borrow().edit("");
        assert!(submitted.borrow().is_empty());
        name.borrow().edit("Carol");
        assert_eq!(submitted.borrow().len(), 1);
    }
}
