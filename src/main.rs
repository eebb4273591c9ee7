mod history_cmd;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use cmdhist::HistoryError;
use cmdhist::config::{self, HistoryConfig};
use cmdhist::logging;
use cmdhist::store::StoreFormat;
use cmdhist::tree::NodeRef;

#[derive(Parser)]
#[command(
    name = "cmdhist",
    about = "Browse and edit a command history log grouped by day"
)]
struct Cli {
    /// History log to use instead of the configured one
    #[arg(long, global = true, env = config::LOG_PATH_ENV)]
    log: Option<PathBuf>,

    /// Log format (json or sqlite); inferred from the extension by default
    #[arg(long, global = true)]
    format: Option<StoreFormat>,

    /// Treat this date (YYYY-MM-DD) as today when bucketing
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the history grouped into day buckets
    Tree {
        /// Only show commands matching this regex
        #[arg(long)]
        filter: Option<String>,
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a newly launched command
    Add {
        #[arg(trailing_var_arg = true, required = true)]
        command_args: Vec<String>,
    },
    /// Set the status of the last command launched today
    Finish {
        #[arg(long, default_value = cmdhist::entry::STATUS_FINISHED)]
        status: String,
    },
    /// Remove a command from the history, e.g. `rm today:0`
    Rm { node: NodeRef },
    /// Show the full log entry behind a command
    Show { node: NodeRef },
    /// Print where a command would be launched (shell or tool)
    Run { node: NodeRef },
}

fn resolve_config(cli: &Cli) -> HistoryConfig {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let root = config::project_root_for(&cwd);
    let mut cfg = HistoryConfig::load(Some(&root));
    if let Some(ref log) = cli.log {
        cfg.format = StoreFormat::infer(log);
        cfg.log_path.clone_from(log);
    }
    if let Some(format) = cli.format {
        cfg.format = format;
    }
    cfg
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let cfg = resolve_config(cli);
    if cli.verbose {
        eprintln!(
            "[cmdhist] log: {} ({:?})",
            cfg.log_path.display(),
            cfg.format
        );
    }
    let mut index = history_cmd::open_index(&cfg, cli.today)?;
    match &cli.command {
        Commands::Tree { filter, json } => {
            history_cmd::cmd_tree(&mut index, filter.as_deref(), *json)
        }
        Commands::Add { command_args } => history_cmd::cmd_add(&mut index, command_args),
        Commands::Finish { status } => history_cmd::cmd_finish(&mut index, status),
        Commands::Rm { node } => history_cmd::cmd_rm(&mut index, *node),
        Commands::Show { node } => history_cmd::cmd_show(&mut index, *node),
        Commands::Run { node } => history_cmd::cmd_run(&mut index, *node),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            // Store failures were already reported through the index's notifications.
            let reported = e
                .downcast_ref::<HistoryError>()
                .is_some_and(HistoryError::is_user_facing);
            if !reported {
                eprintln!("[cmdhist] error: {e:#}");
            }
            1
        }
    };
    std::process::exit(code);
}
