//! # mcp-pulse
//!
//! MCP (Model Context Protocol) server that exposes the Pulse
//! device-management cloud API as agent tools. Runs as a stdio JSON-RPC
//! server — designed to be launched by an AI agent host (e.g. Claude Code).
//!
//! ## Architecture
//!
//! ```text
//! main.rs   — entry point, config loading, MCP server launch
//! config.rs — CLI flag / env-var configuration loading
//! client.rs — HTTP client for Pulse REST endpoints
//! mcp.rs    — MCP JSON-RPC protocol handler (stdio)
//! tools.rs  — tool definitions and dispatch
//! ```
//!
//! ## Tools
//!
//! One tool per Pulse REST operation, covering endpoints (devices), rooms,
//! locations, regions, profiles, users, audit logs, bug reports, and room
//! notes. See `tools.rs` for the full registry.

mod client;
mod config;
mod mcp;
mod tools;

use clap::Parser;
use config::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let resolved = match config::load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-pulse: configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let org_id = resolved.org_id.clone();
    let base_url = resolved.base_url.clone();

    let client = match client::PulseClient::new(resolved) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-pulse: configuration error: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("mcp-pulse: serving org {} via {}", org_id, base_url);

    mcp::run_stdio(client).await;
}
