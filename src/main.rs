use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coda_mcp::coda::{CodaApi, CodaClient, DEFAULT_BASE_URL};
use coda_mcp::config::{AppConfig, CliConfig, FileConfig};
use coda_mcp::content::ContentResolver;
use coda_mcp::mcp::{self, server, McpServer};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    /// Coda API token.
    #[clap(long, env = "CODA_API_KEY", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Base URL of the Coda API.
    #[clap(long, env = "CODA_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Timeout in seconds for a single HTTP request to Coda.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Upper bound in seconds for a single tool call.
    #[clap(long, default_value_t = 120)]
    pub tool_timeout_secs: u64,

    /// Delay in milliseconds between export status checks.
    #[clap(long, default_value_t = 500)]
    pub export_poll_interval_ms: u64,

    /// How long in seconds to wait for a page export to finish.
    #[clap(long, default_value_t = 30)]
    pub export_max_wait_secs: u64,

    /// Path to a TOML config file. Values in the file override flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            api_token: self.api_token.clone(),
            api_base_url: self.api_base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
            tool_timeout_secs: self.tool_timeout_secs,
            export_poll_interval_ms: self.export_poll_interval_ms,
            export_max_wait_secs: self.export_max_wait_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let client = CodaClient::new(
        config.api_token.clone(),
        &config.api_base_url,
        config.request_timeout_secs,
    )
    .context("Failed to create Coda API client")?;
    let api: Arc<dyn CodaApi> = Arc::new(client);
    let resolver = ContentResolver::new(api.clone(), config.export);

    let export = resolver.settings();
    info!(
        "Page exports polled every {:?}, abandoned after {:?}",
        export.poll_interval, export.max_wait
    );

    let registry = mcp::default_registry();
    info!(
        "{} {} ready with {} tools (API at {})",
        server::SERVER_NAME,
        server::server_version(),
        registry.tool_count(),
        config.api_base_url
    );

    let server = McpServer::new(registry, api, resolver, config.tool_timeout);
    server
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await
}
