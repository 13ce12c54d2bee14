//! Top-level CLI definition and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use qtop::core::config::Config;
use qtop::core::errors::{QtopError, Result};
use qtop::source::demo::DemoBackend;
use qtop::source::MonitoringDataSource;
use qtop::tui::event_loop::Dashboard;

/// qtop — terminal dashboard for background job queues.
#[derive(Debug, Parser)]
#[command(
    name = "qtop",
    author,
    version,
    about = "Terminal dashboard for background job queues",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Refresh interval in seconds.
    #[arg(long, value_name = "SECS")]
    refresh: Option<u64>,
    /// Backend connection URL.
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Append JSONL event log to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Run against the built-in simulated backend.
    #[arg(long)]
    demo: bool,
}

/// Load configuration, pick a backend, and run the dashboard.
pub fn run(args: &Cli) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(secs) = args.refresh {
        if secs == 0 {
            return Err(QtopError::InvalidConfig {
                details: "--refresh must be > 0".to_string(),
            });
        }
        config.dashboard.refresh_interval_ms = secs * 1000;
    }
    if let Some(url) = &args.url {
        config.backend.url.clone_from(url);
    }
    if let Some(path) = &args.log_file {
        config.log.file = Some(path.clone());
    }

    if !(args.demo || config.backend.url.starts_with("demo:")) {
        // Wire backends are separate crates implementing the two source
        // traits; this binary ships only the simulator.
        return Err(QtopError::Runtime {
            details: format!(
                "no driver available for {:?}; run with --demo or link a backend implementation",
                config.backend.url
            ),
        });
    }

    let backend = Arc::new(DemoBackend::new());
    let dashboard = Dashboard {
        source: backend.clone() as Arc<dyn MonitoringDataSource>,
        actions: backend,
        config,
    };
    dashboard.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_all_flags() {
        let cli = Cli::parse_from([
            "qtop",
            "--refresh",
            "5",
            "--url",
            "demo:",
            "--log-file",
            "/tmp/qtop.jsonl",
            "--demo",
        ]);
        assert_eq!(cli.refresh, Some(5));
        assert!(cli.demo);
        assert_eq!(cli.url.as_deref(), Some("demo:"));
    }

    #[test]
    fn non_demo_url_without_driver_is_rejected() {
        let cli = Cli::parse_from(["qtop", "--url", "redis://example:6379/0"]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.code(), "QT-3900");
    }
}
