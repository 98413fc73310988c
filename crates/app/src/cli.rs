use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "repodeck")]
#[command(about = "Branch sync status and local changes across many Git projects")]
pub struct CliArgs {
    /// Directory holding projects to track, repeatable (overrides config)
    #[arg(long = "project-dir", value_name = "DIR")]
    pub project_dirs: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Refresh once, print a report and exit
    #[arg(long)]
    pub once: bool,
}
