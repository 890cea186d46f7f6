mod backend;
mod cli;
mod config;
mod error;
mod model;
mod orchestrator;
mod store;
#[cfg(test)]
mod testing;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log to stderr, or to a file under the state directory while the TUI owns
/// the terminal.
fn init_tracing(to_file: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_target(false).compact();
    if to_file {
        let dir = config::state_dir()?;
        std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("scout.log"))
            .context("open log file")?;
        builder
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|err| anyhow!(err))
    } else {
        builder
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))
    }
}

/// Stderr belongs to the TUI once it starts, so only headless modes report
/// a logging setup failure.
fn logging_warning(is_non_tui: bool, err: &anyhow::Error) -> Option<String> {
    is_non_tui.then(|| format!("warning: logging disabled: {err:#}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.is_non_tui() || cfg!(not(feature = "tui"));
    if let Err(e) = init_tracing(!is_non_tui) {
        if let Some(warning) = logging_warning(is_non_tui, &e) {
            eprintln!("{warning}");
        }
    }

    match cli::run(args).await {
        Ok(()) => {
            // Feed tasks may still be polling; exit explicitly in print-and-exit modes.
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_tracing_init_is_reported_in_headless_modes() {
        let _ = init_tracing(false);
        let err = init_tracing(false).unwrap_err();
        let warning = logging_warning(true, &err).unwrap();
        assert!(warning.starts_with("warning: logging disabled: "));
        assert!(logging_warning(false, &err).is_none());
    }
}
