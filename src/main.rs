mod actor;
mod app;
mod command;
mod config;
mod constants;
mod focus;
mod mail;
mod thread;

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::app::presenter::StdoutPresenter;
use crate::config::Config;
use crate::mail::{MailStore, MemoryStore, ThreadSource};

/// Session log under `dir`, truncated on each run. `None` when `dir` is unusable.
fn open_log_file(dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dir.join("colmail.log"))
        .ok()
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,colmail=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the board, so logs never go there
    match Config::config_dir().ok().and_then(|dir| open_log_file(&dir)) {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_usage() {
    eprintln!(
        r#"colmail - Column mail board with undoable thread actions

Usage: colmail [--config PATH] run <mailbox.toml>
       colmail help

Commands:
    run         Load a mailbox fixture and start an interactive session
    help        Show this help message

Type 'help' inside a session for the thread commands.

Configuration file: ~/.config/colmail/config.toml
"#
    );
}

struct Args {
    config: Option<PathBuf>,
    mailbox: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut config = None;
    let mut rest = args.iter().skip(1);

    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "help" | "--help" | "-h" => return Ok(None),
            "--config" => {
                let path = rest.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            "run" => {
                let mailbox = rest.next().context("run needs a mailbox file")?;
                if let Some(extra) = rest.next() {
                    anyhow::bail!("Unexpected argument: {}", extra);
                }
                return Ok(Some(Args {
                    config,
                    mailbox: PathBuf::from(mailbox),
                }));
            }
            other => anyhow::bail!("Unknown command: {}", other),
        }
    }
    Ok(None)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    setup_logging();

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mailbox = Arc::new(MemoryStore::load(&args.mailbox)?);
    tracing::info!(
        "Loaded mailbox {} with columns {:?}",
        args.mailbox.display(),
        config.board.columns
    );

    let store: Arc<dyn MailStore> = mailbox.clone();
    let source: Arc<dyn ThreadSource> = mailbox;
    let presenter = Box::new(StdoutPresenter::new(config.ui.date_format.clone()));

    let mut app = App::new(config, store, source, presenter);
    app.run().await
}
