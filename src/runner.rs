use anyhow::{bail, Context, Result};
use std::fs::File;
use std::process::Command;

use ecommerce_tasks::{CommandSpec, Target, Task};

// Constants
const CONTAINER_RUNTIME: &str = "docker";

// True when our stdin is attached to a terminal
fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

// Arguments passed to the container runtime for one command.
// Interactive commands always attach stdin; a pseudo-terminal is only
// requested when stdin actually is one, so piped invocations still work.
fn container_argv(spec: &CommandSpec, tty: bool) -> Result<Vec<String>> {
    let container = spec
        .container
        .as_deref()
        .context("container command is missing a container name")?;

    let mut args = vec!["exec".to_string()];
    if spec.interactive {
        args.push("-i".to_string());
        if tty {
            args.push("-t".to_string());
        }
    }
    args.push(container.to_string());
    args.extend(spec.argv.iter().cloned());
    Ok(args)
}

/// Run a single command and return its exit code.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned or its stdout
/// redirect target cannot be created.
pub fn run_command(spec: &CommandSpec) -> Result<i32> {
    if spec.argv.is_empty() {
        bail!("refusing to run a command with an empty argv");
    }

    let (program, args) = match spec.target {
        Target::Container => (
            CONTAINER_RUNTIME.to_string(),
            container_argv(spec, stdin_is_tty())?,
        ),
        Target::Local => (spec.argv[0].clone(), spec.argv[1..].to_vec()),
    };

    let rendered = std::iter::once(program.as_str())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    println!("+ {rendered}");

    let mut command = Command::new(&program);
    command.args(&args);

    // Only stdout is captured; stderr stays on the terminal
    if let Some(path) = &spec.stdout_file {
        let file = File::create(path)
            .with_context(|| format!("failed to open {path} for writing"))?;
        command.stdout(file);
    }

    let status = command
        .status()
        .with_context(|| format!("failed to execute {program}"))?;

    // Children killed by a signal report no exit code
    Ok(status.code().unwrap_or(1))
}

/// Run a task's commands in order, stopping at the first failure.
///
/// Returns the exit code of the first failing command, or 0 when the
/// whole sequence succeeded.
///
/// # Errors
///
/// Returns an error if any command in the sequence fails to launch.
pub fn run_task(task: &Task) -> Result<i32> {
    for spec in &task.commands {
        let code = run_command(spec)
            .with_context(|| format!("task '{}' failed to launch a command", task.name))?;

        if code != 0 {
            eprintln!("error: command exited with status {code}");
            return Ok(code);
        }
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::local(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ])
    }

    #[test]
    fn test_local_success() {
        let code = run_command(&sh("true")).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_local_exit_code_preserved() {
        let code = run_command(&sh("exit 42")).unwrap();
        assert_eq!(code, 42);
    }

    #[test]
    fn test_signal_killed_reports_one() {
        // Killed by a signal, so there is no exit code to propagate
        let code = run_command(&sh("kill -9 $$")).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_empty_argv_rejected() {
        let spec = CommandSpec::local(Vec::new());
        assert!(run_command(&spec).is_err());
    }

    #[test]
    fn test_missing_container_name_rejected() {
        let mut spec = CommandSpec::container(vec!["true".to_string()]);
        spec.container = None;
        assert!(container_argv(&spec, false).is_err());
    }

    #[test]
    fn test_container_argv_batch() {
        let spec = CommandSpec::container(vec![
            "python".to_string(),
            "manage.py".to_string(),
            "test".to_string(),
        ]);
        let args = container_argv(&spec, false).unwrap();
        assert_eq!(args, vec!["exec", "ecommerce_api", "python", "manage.py", "test"]);
    }

    #[test]
    fn test_container_argv_interactive_with_tty() {
        let spec = CommandSpec::container_tty(vec![
            "python".to_string(),
            "manage.py".to_string(),
            "shell".to_string(),
        ]);
        let args = container_argv(&spec, true).unwrap();
        assert_eq!(
            args,
            vec!["exec", "-i", "-t", "ecommerce_api", "python", "manage.py", "shell"]
        );
    }

    #[test]
    fn test_container_argv_interactive_without_tty() {
        let spec = CommandSpec::container_tty(vec!["python".to_string()]);
        let args = container_argv(&spec, false).unwrap();
        assert_eq!(args, vec!["exec", "-i", "ecommerce_api", "python"]);
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("order.log");
        let log_path = log.to_str().unwrap();

        let task = Task {
            name: "ordered".to_string(),
            desc: String::new(),
            commands: vec![
                sh(&format!("echo one >> {log_path}")),
                sh(&format!("echo two >> {log_path}")),
            ],
        };

        let code = run_task(&task).unwrap();
        assert_eq!(code, 0);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_fail_fast_halts_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let marker_path = marker.to_str().unwrap();

        let task = Task {
            name: "failing".to_string(),
            desc: String::new(),
            commands: vec![sh("exit 7"), sh(&format!("touch {marker_path}"))],
        };

        let code = run_task(&task).unwrap();
        assert_eq!(code, 7);
        assert!(!marker.exists(), "second command must never run");
    }

    #[test]
    fn test_stdout_redirect_truncates_and_skips_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("requirements.txt");
        std::fs::write(&out, "stale content that is longer than the new one\n").unwrap();

        let spec = CommandSpec::local_to_file(
            vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo pinned; echo noise >&2".to_string(),
            ],
            out.to_str().unwrap(),
        );

        let code = run_command(&spec).unwrap();
        assert_eq!(code, 0);

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "pinned\n");
        assert!(!written.contains("noise"));
    }
}
