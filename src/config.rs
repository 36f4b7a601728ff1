//! Configuration loading for mcp-pulse.
//!
//! Three values drive the whole process, each resolved from a CLI flag first
//! and an environment variable second:
//!
//! | Value           | Flag        | Environment     | Required                |
//! |-----------------|-------------|-----------------|-------------------------|
//! | API base URL    | `--api-url` | `PULSE_API_URL` | no (production default) |
//! | API key         | `--api-key` | `PULSE_API_KEY` | yes                     |
//! | Organization id | `--org-id`  | `PULSE_ORG_ID`  | yes                     |
//!
//! A missing or empty API key or organization id is startup-fatal: `main`
//! prints the error to stderr and exits before the MCP loop starts.

use clap::Parser;

/// Production Pulse API origin plus version prefix. Override with
/// `--api-url` / `PULSE_API_URL` for staging or on-prem installs.
pub const DEFAULT_API_URL: &str = "https://pulse.gawd.ai/api/v1";

/// CLI arguments parsed by `clap`.
#[derive(Parser)]
#[command(name = "mcp-pulse", about = "MCP server for the Pulse device-management API")]
pub struct Cli {
    /// Base URL of the Pulse API (origin + version prefix)
    #[arg(long)]
    pub api_url: Option<String>,
    /// API key used for Bearer authentication
    #[arg(long)]
    pub api_key: Option<String>,
    /// Organization id scoping every request
    #[arg(long)]
    pub org_id: Option<String>,
}

/// Validated configuration consumed by [`PulseClient::new`](crate::client::PulseClient::new).
/// Immutable for the process lifetime.
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub org_id: String,
}

/// Resolve configuration from CLI flags and environment variables.
pub fn load_config(cli: &Cli) -> Result<ClientConfig, String> {
    let base_url = resolve(cli.api_url.as_deref(), "PULSE_API_URL")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_key = resolve(cli.api_key.as_deref(), "PULSE_API_KEY")
        .ok_or("No API key: set PULSE_API_KEY or pass --api-key")?;
    let org_id = resolve(cli.org_id.as_deref(), "PULSE_ORG_ID")
        .ok_or("No organization id: set PULSE_ORG_ID or pass --org-id")?;

    Ok(ClientConfig {
        base_url,
        api_key,
        org_id,
    })
}

/// Flag wins over environment; empty strings count as unset either way.
fn resolve(flag: Option<&str>, env: &str) -> Option<String> {
    flag.filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
}
