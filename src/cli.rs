use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::process::exit;

use crate::runner;
use ecommerce_tasks::{Task, TaskTable, API_CONTAINER};

// CLI arguments parsing structure
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output the task listing in JSON format
    #[arg(short = 'j', long)]
    pub json: bool,

    /// List the available tasks and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Name of the task to run
    pub task: Option<String>,

    /// Extra arguments; not consumed by any built-in task
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

// Structure for categorized output
#[derive(Serialize)]
struct CategorizedTasks<'a> {
    container_tasks: Vec<&'a Task>,
    local_tasks: Vec<&'a Task>,
}

// Execute the selected task
pub fn execute_command(cli: &Cli) -> Result<()> {
    let table = TaskTable::builtin();

    if cli.list {
        return cmd_list(&table, cli.json);
    }

    let Some(name) = cli.task.as_deref() else {
        // No task requested; show what is available
        return cmd_list(&table, cli.json);
    };

    let Some(task) = table.find(name) else {
        eprintln!("error: unknown task '{name}'");
        cmd_list(&table, false)?;
        exit(2);
    };

    if !cli.args.is_empty() {
        eprintln!("warning: extra arguments are ignored: {}", cli.args.join(" "));
    }

    let code = runner::run_task(task).with_context(|| format!("failed to run task '{name}'"))?;
    if code != 0 {
        exit(code);
    }

    Ok(())
}

fn cmd_list(table: &TaskTable, json_output: bool) -> Result<()> {
    // Split tasks by where they run
    let (container_tasks, local_tasks): (Vec<_>, Vec<_>) = table
        .tasks
        .iter()
        .partition(|task| task.runs_in_container());

    if json_output {
        // Output as JSON
        let categorized = CategorizedTasks {
            container_tasks,
            local_tasks,
        };

        let json = serde_json::to_string_pretty(&categorized)
            .context("failed to serialize task listing to JSON")?;
        println!("{json}");
        return Ok(());
    }

    // Find the longest task name for alignment
    let max_name_length = container_tasks
        .iter()
        .chain(local_tasks.iter())
        .map(|task| task.name.len())
        .max()
        .unwrap_or(0);

    println!("\u{001b}[4mContainer tasks (inside '{API_CONTAINER}'):\u{001b}[0m");
    for task in &container_tasks {
        print_task(task, max_name_length);
    }

    if !local_tasks.is_empty() {
        println!("\n\u{001b}[4mLocal tasks:\u{001b}[0m");
        for task in &local_tasks {
            print_task(task, max_name_length);
        }
    }

    Ok(())
}

// Helper function to print a task with proper formatting
fn print_task(task: &Task, max_name_length: usize) {
    // Create padded name for alignment
    let padded_name = format!("{:<width$}", task.name, width = max_name_length);

    if task.desc.is_empty() {
        println!("  {padded_name}");
    } else {
        println!("  {padded_name}  {}", task.desc);
    }
}
