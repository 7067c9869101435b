mod file_config;

pub use file_config::{ExportConfig, FileConfig};

use anyhow::{bail, Result};
use std::time::Duration;

use crate::coda::{ApiToken, DEFAULT_BASE_URL};
use crate::content::PollSettings;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_token: Option<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub export_poll_interval_ms: u64,
    pub export_max_wait_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        let export = PollSettings::default();
        Self {
            api_token: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            tool_timeout_secs: 120,
            export_poll_interval_ms: export.poll_interval.as_millis() as u64,
            export_max_wait_secs: export.max_wait.as_secs(),
        }
    }
}

/// Resolved, validated process configuration. Immutable after startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_token: ApiToken,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Upper bound on a single `tools/call`.
    pub tool_timeout: Duration,
    pub export: PollSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let api_token = file
            .api_token
            .or_else(|| cli.api_token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "api_token must be specified via --api-token, CODA_API_KEY or in config file"
                )
            })?;

        let api_base_url = file
            .api_base_url
            .unwrap_or_else(|| cli.api_base_url.clone());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            bail!("api_base_url must be an http(s) URL: {}", api_base_url);
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(cli.request_timeout_secs);
        let tool_timeout_secs = file.tool_timeout_secs.unwrap_or(cli.tool_timeout_secs);

        // Export settings - merge file config with CLI
        let export_file = file.export.unwrap_or_default();
        let poll_interval_ms = export_file
            .poll_interval_ms
            .unwrap_or(cli.export_poll_interval_ms);
        let max_wait_secs = export_file
            .max_wait_secs
            .unwrap_or(cli.export_max_wait_secs);

        if poll_interval_ms == 0 {
            bail!("export poll interval must be greater than zero");
        }
        let export = PollSettings {
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_wait: Duration::from_secs(max_wait_secs),
        };
        if export.max_wait < export.poll_interval {
            bail!(
                "export max wait ({}s) is shorter than the poll interval ({}ms)",
                max_wait_secs,
                poll_interval_ms
            );
        }

        let tool_timeout = Duration::from_secs(tool_timeout_secs);
        if tool_timeout <= export.max_wait {
            bail!(
                "tool timeout ({}s) must be longer than the export max wait ({}s)",
                tool_timeout_secs,
                max_wait_secs
            );
        }

        Ok(Self {
            api_token: ApiToken::new(api_token),
            api_base_url,
            request_timeout_secs,
            tool_timeout,
            export,
        })
    }
}
