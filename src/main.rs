mod cli;
mod clock;
mod config;
mod error;
mod info;
mod journal;
mod kv;
mod session;
mod store;
mod ticker;
mod timer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kickcount", about = "Time and log fetal movement (kick) counting sessions")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "KICKCOUNT_DATA_DIR", help = "Directory holding the session log")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Write a JSONL journal of recording activity")]
    pub journal: bool,

    #[arg(long, help = "Verbose output (info-level logs)")]
    pub verbose: bool,

    #[arg(long, help = "Debug output (debug-level logs)")]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show past records
    List {
        #[arg(long, help = "Print the raw session log as JSON")]
        json: bool,
    },
    /// Open the recording screen
    Record,
    /// How to count kicks
    Info,
}

fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug,rustyline=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args);

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable config, using defaults");
            config::Config::default()
        })
    };

    // CLI overrides
    if let Some(data_dir) = &args.data_dir {
        cfg.storage.data_dir = Some(data_dir.clone());
    }
    if args.journal {
        cfg.journal.enabled = true;
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error {}", error);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} errors)",
            errors.len()
        ));
    }

    let ctx = cli::Context::new(cfg, Arc::new(clock::SystemClock));
    tracing::debug!(
        path = %ctx.store.backend().path_for(ctx.store.key()).display(),
        data_dir = %ctx.store.backend().dir().display(),
        "session log"
    );

    match &args.command {
        Some(Command::List { json }) => cli::print_sessions(&ctx, *json),
        Some(Command::Info) => {
            println!("{}", info::render());
            Ok(())
        }
        Some(Command::Record) => {
            let mut rl = rustyline::DefaultEditor::new()?;
            cli::run_record(&ctx, &mut rl)
        }
        None => cli::run_home(&ctx),
    }
}
