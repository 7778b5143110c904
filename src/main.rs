use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use turnos_kiosk::api::ApiClient;
use turnos_kiosk::app;
use turnos_kiosk::config::Config;
use turnos_kiosk::models::Branch;

#[derive(Parser, Debug)]
#[command(
    name = "kiosk",
    about = "Self-service kiosk that issues branch queue tickets",
    version
)]
struct Args {
    /// Backend base URL (overrides config and KIOSK_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Branch id to serve
    #[arg(short, long)]
    branch_id: Option<String>,

    /// Display name for --branch-id
    #[arg(long, requires = "branch_id")]
    branch_name: Option<String>,

    /// Seconds of inactivity before the session resets
    #[arg(long)]
    idle_secs: Option<u32>,

    /// Seconds the ticket stays on screen before the session resets
    #[arg(long)]
    return_secs: Option<u32>,

    /// Check backend connectivity for the configured branch and exit (no TUI)
    #[arg(short, long)]
    check: bool,

    /// Log file (defaults to the config directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(Config::default_log_path);
    init_logging(&log_path)?;

    let config = apply_overrides(Config::load(), &args);
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("invalid configuration ({})", Config::config_location()))?;

    let api = ApiClient::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("could not build the backend client")?;

    if args.check {
        return check_backend(&api, &config.branch).await;
    }

    app::run_tui(config, api).await
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create log directory '{}'", parent.display())
            })?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}

/// Command-line flags win over the config file and the environment.
fn apply_overrides(config: Config, args: &Args) -> Config {
    let mut config = config.with_api_url_override(args.api_url.clone());
    if let Some(id) = &args.branch_id {
        let name = args.branch_name.as_deref().unwrap_or(id);
        config.branch = Branch::new(id, name);
    }
    if let Some(secs) = args.idle_secs {
        config.idle_timeout_secs = secs;
    }
    if let Some(secs) = args.return_secs {
        config.return_countdown_secs = secs;
    }
    config
}

async fn check_backend(api: &ApiClient, branch: &Branch) -> Result<()> {
    println!("Backend: {}", api.base_url());
    println!("Sucursal: {} ({})", branch.name, branch.id);
    for (label, is_client) in [("no clientes", false), ("clientes", true)] {
        let areas = api
            .list_areas(&branch.id, is_client)
            .await
            .with_context(|| format!("listing areas for {}", label))?;
        println!("  {} áreas para {}", areas.len(), label);
    }
    Ok(())
}
