use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "playdeck")]
#[command(about = "Read browser test runner output: catalogs, live results, styled logs")]
#[command(version)]
pub struct Cli {
    /// Project root (defaults to the nearest directory with a test config)
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the test catalog
    List(ListArgs),
    /// Extract pass/fail results from a captured run log
    Status(StatusArgs),
    /// Convert terminal output to styled markup
    Markup(MarkupArgs),
    /// Follow a run log on stdin and print results as they appear
    Follow(FollowArgs),
    /// List stored authentication fixtures
    Fixtures(FixturesArgs),
    /// Print the recording command for a setup script or test file
    Codegen(CodegenArgs),
    /// Print the list, run and report command lines
    Commands(CommandsArgs),
    /// Run the project's prepare task
    Prepare,
    /// List the variable names declared in `env.config`
    Vars(VarsArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Only list tests matching this pattern
    #[arg(long)]
    pub grep: Option<String>,
    /// Parse captured list output instead of running the tool
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    /// Run log to read, `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,
    /// Captured list output; results are joined against it
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MarkupArgs {
    /// Raw output to convert, `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FollowArgs {
    /// Captured list output; its tests are reported as pending until seen
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FixturesArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CodegenArgs {
    /// Directory that receives `setup.ts` and the saved storage
    #[arg(
        long,
        value_name = "DIR",
        conflicts_with = "output_file",
        required_unless_present = "output_file"
    )]
    pub output_dir: Option<PathBuf>,
    /// Test file to record into
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,
    #[arg(long)]
    pub url: String,
    /// Fixture directory whose storage is loaded first
    #[arg(long, value_name = "DIR")]
    pub load: Option<PathBuf>,
    /// Do not save browser storage after recording a setup script
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CommandsArgs {
    #[arg(long)]
    pub grep: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct VarsArgs {
    /// Show how this name would be stored and whether it is already declared
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub json: bool,
}

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}
