use anyhow::Context;
use clap::Parser;
use herald_logger::Logger;
use herald_shell::config::{ShellConfig, load_config};
use herald_shell::scenario;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "herald", version, about = "Runs the herald dispatcher walkthrough")]
struct Cli {
    /// Configuration file; defaults to `herald` (any supported extension) in
    /// the working directory.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg: ShellConfig =
        load_config(cli.config.as_deref()).context("Critical: configuration is malformed")?;
    let _logger = Logger::init(env!("CARGO_BIN_NAME"), &cfg.logging)?;

    info!(serialize_publish = cfg.dispatch.serialize_publish, "Starting scenario");
    let summary = scenario::run(&cfg.dispatch);

    for (event_type, count) in &summary.metrics {
        info!(%event_type, count, "Events processed");
    }
    info!(
        login_listeners = summary.login_listeners,
        upload_listeners = summary.upload_listeners,
        after_unsubscribe = summary.login_listeners_after_unsubscribe,
        after_drop = summary.login_listeners_after_drop,
        audited = summary.audited,
        logins = ?summary.logins,
        failures = summary.failures,
        "Scenario finished"
    );

    Ok(())
}
