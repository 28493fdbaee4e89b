use std::fs::{self, OpenOptions};
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use fixum::commands;
use fixum::context::Context;
use fixum::output::{Output, error_summary, print_error};

/// Environment variable overriding the log filter
const LOG_ENV: &str = "FIXUM_LOG";

#[derive(Parser)]
#[command(name = "fixum")]
#[command(about = "Replace outdated copies of Alfred-Workflow bundled in your Alfred workflows")]
#[command(version = env!("FIXUM_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Only show what would be updated
    #[arg(short = 'n', long)]
    nothing: bool,

    /// Enable verbose output (mirrors the log to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the action menu as Alfred feedback
    List {
        /// Filter actions by this query
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Check GitHub for a newer fixum release
    CheckUpdate,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let out = Output::new(cli.verbose);

    match run(cli, &out) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            out.result(&error_summary(&e));
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &Output) -> anyhow::Result<ExitCode> {
    // Completions need no environment
    if let Some(Commands::Completion { shell }) = &cli.command {
        generate_completions(*shell);
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = Context::from_env(out)?;
    init_logging(&ctx, cli.verbose, out);
    debug!("fixum {} ({})", env!("FIXUM_VERSION"), ctx.bundle_id);

    match cli.command {
        Some(Commands::List { query }) => {
            commands::list(&ctx, &query.join(" "), out)?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::CheckUpdate) => {
            commands::check_update(&ctx, out)?;
            Ok(ExitCode::SUCCESS)
        }

        None => {
            let opts = commands::fix::FixOptions {
                dry_run: cli.nothing,
            };
            let report = commands::fix(&ctx, opts, out)?;
            out.result(&report.summary_line());

            if report.success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Some(Commands::Completion { .. }) => unreachable!(),
    }
}

/// Log to the workflow's log file, and to stderr as well with `--verbose`
///
/// Falls back to stderr alone if the log file cannot be opened.
fn init_logging(ctx: &Context, verbose: bool, out: &Output) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_path = ctx.log_path();
    let file = fs::create_dir_all(&ctx.cache_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });

    let writer = match file {
        Ok(file) if verbose => BoxMakeWriter::new(Mutex::new(file).and(io::stderr)),
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            out.warn(&format!(
                "could not open log file {}: {}",
                log_path.display(),
                e
            ));
            BoxMakeWriter::new(io::stderr)
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
}

fn generate_completions(shell: Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
