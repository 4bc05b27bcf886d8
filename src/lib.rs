use serde::Serialize;
use std::collections::HashMap;

// Constants
pub const API_CONTAINER: &str = "ecommerce_api";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

// Where a command executes
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Container,
    Local,
}

// Single command within a task
#[derive(Serialize, Debug, Clone)]
pub struct CommandSpec {
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub argv: Vec<String>,
    pub interactive: bool,
    /// When set, child stdout is truncate-written into this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_file: Option<String>,
}

impl CommandSpec {
    // Batch command inside the API container
    #[must_use]
    pub fn container(argv: Vec<String>) -> Self {
        Self {
            target: Target::Container,
            container: Some(API_CONTAINER.to_string()),
            argv,
            interactive: false,
            stdout_file: None,
        }
    }

    // Terminal-attached command inside the API container
    #[must_use]
    pub fn container_tty(argv: Vec<String>) -> Self {
        Self {
            interactive: true,
            ..Self::container(argv)
        }
    }

    // Command run directly on the host
    #[must_use]
    pub fn local(argv: Vec<String>) -> Self {
        Self {
            target: Target::Local,
            container: None,
            argv,
            interactive: false,
            stdout_file: None,
        }
    }

    // Host command with stdout captured into a file
    #[must_use]
    pub fn local_to_file(argv: Vec<String>, stdout_file: &str) -> Self {
        Self {
            stdout_file: Some(stdout_file.to_string()),
            ..Self::local(argv)
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Task {
    pub name: String,
    pub desc: String,
    pub commands: Vec<CommandSpec>,
}

impl Task {
    // Whether any of the task's commands run inside the container
    #[must_use]
    pub fn runs_in_container(&self) -> bool {
        self.commands
            .iter()
            .any(|command| command.target == Target::Container)
    }

    // Whether any of the task's commands want a terminal
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.commands.iter().any(|command| command.interactive)
    }
}

// The task table maps mnemonic names to command sequences
pub struct TaskTable {
    pub tasks: Vec<Task>,
    task_map: Option<HashMap<String, usize>>, // name -> index in tasks vector
}

impl TaskTable {
    // Constructor for creating a new table
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            task_map: None,
        }
    }

    // Initialize the lookup map for efficient task retrieval
    pub fn init_lookup(&mut self) {
        let mut map = HashMap::new();
        for (index, task) in self.tasks.iter().enumerate() {
            map.insert(task.name.clone(), index);
        }
        self.task_map = Some(map);
    }

    // Get a task by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Task> {
        if let Some(map) = &self.task_map {
            return map.get(name).map(|index| &self.tasks[*index]);
        }
        // Fallback to linear search if map not initialized
        self.tasks.iter().find(|task| task.name == name)
    }

    // Check if a task name is defined
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    // Method for checking if the lookup map is initialized (for testing)
    #[must_use]
    pub fn has_lookup_map(&self) -> bool {
        self.task_map.is_some()
    }

    // The built-in table, lookup map ready
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new(builtin_tasks());
        table.init_lookup();
        table
    }
}

// Build an argv for `python manage.py <args...>`
fn manage(args: &[&str]) -> Vec<String> {
    let mut argv = vec!["python".to_string(), "manage.py".to_string()];
    argv.extend(args.iter().map(|arg| (*arg).to_string()));
    argv
}

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_string()).collect()
}

fn task(name: &str, desc: &str, commands: Vec<CommandSpec>) -> Task {
    Task {
        name: name.to_string(),
        desc: desc.to_string(),
        commands,
    }
}

// The fixed task definitions for the ecommerce project
fn builtin_tasks() -> Vec<Task> {
    vec![
        task(
            "mmm",
            "Make migrations, then apply them",
            vec![
                CommandSpec::container(manage(&["makemigrations"])),
                CommandSpec::container(manage(&["migrate"])),
            ],
        ),
        task(
            "mm",
            "Make migrations",
            vec![CommandSpec::container(manage(&["makemigrations"]))],
        ),
        task(
            "m",
            "Apply migrations",
            vec![CommandSpec::container(manage(&["migrate"]))],
        ),
        task(
            "shell",
            "Open the Django shell",
            vec![CommandSpec::container_tty(manage(&["shell"]))],
        ),
        task(
            "shell_plus",
            "Open the shell_plus REPL",
            vec![CommandSpec::container_tty(manage(&["shell_plus"]))],
        ),
        task(
            "runserver",
            "Run the development server on 0.0.0.0:8000",
            vec![CommandSpec::container_tty(manage(&[
                "runserver",
                "0.0.0.0:8000",
            ]))],
        ),
        task(
            "test",
            "Run the Django test suite",
            vec![CommandSpec::container(manage(&["test"]))],
        ),
        task(
            "showmigrations",
            "Show migration status",
            vec![CommandSpec::container(manage(&["showmigrations"]))],
        ),
        task(
            "createsuperuser",
            "Create an admin account",
            vec![CommandSpec::container_tty(manage(&["createsuperuser"]))],
        ),
        task(
            "pytest_unit",
            "Run the pytest unit suite",
            vec![CommandSpec::container(argv(&["pytest", "tests/unit"]))],
        ),
        task(
            "uv_export",
            "Export locked dependencies to requirements.txt",
            vec![CommandSpec::local_to_file(
                argv(&["uv", "export", "--no-hashes", "--format", "requirements-txt"]),
                REQUIREMENTS_FILE,
            )],
        ),
    ]
}
