use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod runner;

use cli::{execute_command, Cli};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Execute the appropriate task
    execute_command(&cli).with_context(|| "task execution failed")
}
