//! `taskdesk`: interactive task tracking client.
//!
//! Runs a line-oriented prompt over an in-memory store. Configuration via
//! CLI flags, environment variables, or config file
//! (`~/.config/taskdesk/config.toml`).
//!
//! ```bash
//! # Demo data, default settings
//! cargo run --bin taskdesk
//!
//! # Slow store with a tight timeout, to watch rollbacks
//! cargo run --bin taskdesk -- --latency-ms 800 --store-timeout-ms 500
//! ```

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;

use taskdesk::command::{self, CommandError};
use taskdesk::config::{CliArgs, ClientConfig};
use taskdesk::session::Session;
use taskdesk_proto::task::OwnerId;
use taskdesk_store::InMemoryTaskStore;
use taskdesk_store::seed::demo_tasks;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // CLI args > env > config file > defaults.
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; stdout belongs to the prompt.
    let _log_guard = init_logging(&config.log_level, cli.log_file.as_deref());

    tracing::info!(owner = %config.owner_id, "taskdesk starting");

    let owner = OwnerId::new(config.owner_id.clone());
    let mut store = InMemoryTaskStore::new(owner.clone()).with_latency(config.store_latency);
    if config.seed_demo {
        store = store
            .with_seed(demo_tasks(Utc::now(), &owner))
            .map_err(io::Error::other)?;
    }

    let mut session = Session::new(store, &config.sync);
    let result = run_prompt(&mut session).await;

    tracing::info!("taskdesk exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Reads commands from stdin until `quit` or end of input.
async fn run_prompt(session: &mut Session<InMemoryTaskStore>) -> io::Result<()> {
    let reload = session.execute(command::Command::Reload, Utc::now()).await;
    print_lines(&reload.lines);
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let outcome = session.execute(command, Utc::now()).await;
        print_lines(&outcome.lines);
        if outcome.quit {
            break;
        }
    }
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
