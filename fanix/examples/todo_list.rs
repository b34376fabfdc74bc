//! A to-do list edited through a scripted headless host.
//!
//! Run with `RUST_LOG=fanix=trace` to see the refresh activity.
use fanix::{
    field,
    headless::{HeadlessForm, HeadlessList, LineEditView},
    Application, Config, DebugViewData, FormView, Host, ListModel, ListView, NodeRef, Root, SubmitFn, ViewRef,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Clone, Debug)]
struct Task {
    id: u32,
    text: String,
}

#[derive(Clone, Debug)]
struct TodoList {
    name: String,
    tasks: Rc<Vec<Task>>,
}

struct TaskModel;

impl ListModel for TaskModel {
    type Collection = Rc<Vec<Task>>;
    type Key = u32;
    type ElementView = LineEditView;

    fn generate_key_list(&self, tasks: &Rc<Vec<Task>>) -> Vec<u32> {
        tasks.iter().map(|task| task.id).collect()
    }

    fn get_data_at(&self, index: usize, _key: &u32, tasks: &Rc<Vec<Task>>) -> String {
        tasks[index].text.clone()
    }

    fn on_selection_changed(&mut self, row: Option<usize>) {
        println!("selected row: {row:?}");
    }
}

type TodoForm = FormView<Rc<TodoList>, HeadlessForm>;

/// Plays a fixed sequence of user edits instead of waiting for input.
struct ScriptedHost {
    root: Option<Root<TodoForm>>,
    name_edit: Option<ViewRef<LineEditView>>,
}

impl ScriptedHost {
    fn dump(&self) -> anyhow::Result<()> {
        let root = self.root.as_ref().ok_or_else(|| anyhow::anyhow!("nothing mounted"))?;
        let node: NodeRef = root.view().clone();
        let tree = DebugViewData::capture(&node).ok_or_else(|| anyhow::anyhow!("view tree is busy"))?;
        print!("{tree}");
        Ok(())
    }
}

impl Host for ScriptedHost {
    fn exec(&mut self) -> anyhow::Result<i32> {
        self.dump()?;
        let name_edit = self.name_edit.clone().ok_or_else(|| anyhow::anyhow!("no name field"))?;
        let root = self.root.as_mut().ok_or_else(|| anyhow::anyhow!("nothing mounted"))?;

        name_edit.borrow().edit("Weekend");
        root.process_submissions();

        let mut tasks = (*root.current_data().tasks).clone();
        tasks.rotate_right(1);
        let list = TodoList {
            tasks: Rc::new(tasks),
            ..(**root.current_data()).clone()
        };
        root.set_data(Rc::new(list), true);
        self.dump()?;

        let root = self.root.as_mut().ok_or_else(|| anyhow::anyhow!("nothing mounted"))?;
        root.undo()?;
        root.undo()?;
        self.dump()?;
        Ok(0)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut app = Application::new(
        ScriptedHost {
            root: None,
            name_edit: None,
        },
        Config::default(),
    );

    let initial = Rc::new(TodoList {
        name: "Chores".to_string(),
        tasks: Rc::new(vec![
            Task {
                id: 1,
                text: "laundry".to_string(),
            },
            Task {
                id: 2,
                text: "dishes".to_string(),
            },
            Task {
                id: 3,
                text: "groceries".to_string(),
            },
        ]),
    });

    let mut name_edit = None;
    let root = app.mount(initial, |submit: SubmitFn<Rc<TodoList>>| {
        let form = FormView::new(HeadlessForm::new(), Some(submit));
        name_edit = Some(
            form.borrow_mut()
                .append_item_edit("Name", field!(TodoList, name), LineEditView::new),
        );
        form.borrow_mut().append_item_edit(
            "Tasks",
            field!(TodoList, tasks),
            |submit: SubmitFn<Rc<Vec<Task>>>| {
                Rc::new(RefCell::new(ListView::new(
                    HeadlessList::new(),
                    TaskModel,
                    || LineEditView::new(Rc::new(|_, _| {})),
                    Some(submit),
                )))
            },
        );
        form
    });

    let host = app.host_mut();
    host.root = Some(root);
    host.name_edit = name_edit;
    app.run()?;
    Ok(())
}
