#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vitrine_core::config;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "vt: category hierarchy manager",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The explicit output flag, if any, as a mode name.
    fn format_flag(&self) -> Option<&'static str> {
        self.format
            .map(OutputMode::as_str)
            .or_else(|| self.json.then_some("json"))
    }

    /// Settle the output mode: flags, then `FORMAT`, then the user config,
    /// then the TTY default.
    fn output_mode(&self, project_root: &Path) -> OutputMode {
        match config::resolve_config(project_root, self.format_flag()) {
            Ok(effective) => OutputMode::from_name(&effective.resolved_output)
                .unwrap_or_else(|| output::fallback_output_mode(self.format, self.json)),
            Err(e) => {
                debug!(error = %format!("{e:#}"), "config unreadable; resolving output from flags");
                output::fallback_output_mode(self.format, self.json)
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a vitrine project",
        long_about = "Create .vitrine/ with a default config and an empty category list.",
        after_help = "EXAMPLES:\n    # Initialize the current directory\n    vt init\n\n    # Rewrite the config, keeping categories\n    vt init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Read",
        about = "Print the category tree",
        long_about = "Print the category hierarchy. Only children of open categories are shown.",
        after_help = "EXAMPLES:\n    # Respect the saved expansion state\n    vt tree\n\n    # Show everything\n    vt tree --all\n\n    # Reveal one category\n    vt tree --open cat-4\n\n    # Emit machine-readable output\n    vt tree --format json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one category",
        after_help = "EXAMPLES:\n    vt show cat-2"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Create a category",
        after_help = "EXAMPLES:\n    # Top-level category\n    vt create --name \"Rings\"\n\n    # Subcategory\n    vt create --name \"Gold Rings\" --parent cat-1"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Rename, move, or re-describe a category",
        after_help = "EXAMPLES:\n    # Rename\n    vt update cat-2 --name \"Gold\"\n\n    # Move to the top level\n    vt update cat-2 --root"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Delete a category",
        long_about = "Delete one category. Its children are kept and move to the top level.",
        after_help = "EXAMPLES:\n    # Prompt before deleting\n    vt delete cat-2\n\n    # No prompt\n    vt delete cat-2 --force"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "View",
        about = "Open or close a category",
        after_help = "EXAMPLES:\n    vt toggle cat-1"
    )]
    Toggle(cmd::expand::ToggleArgs),

    #[command(next_help_heading = "View", about = "Open every category")]
    ExpandAll,

    #[command(next_help_heading = "View", about = "Close every category")]
    CollapseAll,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VITRINE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "vitrine=debug,vt=debug,info"
        } else {
            "vitrine=info,vt=info,warn"
        })
    });

    let format = env::var("VITRINE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn dispatch(
    command: Commands,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run_init(&args, output, project_root).await,
        Commands::Tree(args) => cmd::tree::run_tree(&args, output, project_root).await,
        Commands::Show(args) => cmd::show::run_show(&args, output, project_root).await,
        Commands::Create(args) => cmd::create::run_create(&args, output, project_root).await,
        Commands::Update(args) => cmd::update::run_update(&args, output, project_root).await,
        Commands::Delete(args) => cmd::delete::run_delete(&args, output, project_root).await,
        Commands::Toggle(args) => cmd::expand::run_toggle(&args, output, project_root).await,
        Commands::ExpandAll => cmd::expand::run_expand_all(output, project_root).await,
        Commands::CollapseAll => cmd::expand::run_collapse_all(output, project_root).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: cannot read current directory: {e}");
            return ExitCode::FAILURE;
        }
    };
    let root_for_config =
        config::find_project_root(&project_root).unwrap_or_else(|| project_root.clone());
    let output = cli.output_mode(&root_for_config);

    match dispatch(cli.command, output, &project_root).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = CliError::from_anyhow(&err);
            if output::render_error(output, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
