//! rtlscope MCP server
//!
//! Exposes SystemVerilog and cocotb build analysis to AI agents over MCP (stdio).
//!
//! ## Tools
//!
//! - `run-analysis` - Run `make` (or one of its `sim`/`lint`/`clean` targets) in a directory
//! - `analyze-source` - Modules, ports, signals and imported packages of a source file
//! - `check-compatibility` - Port and package differences between two source files
//! - `suggest-build-fixes` - Missing cocotb Makefile variables and the lines that add them
//! - `check-compliance` - Review checklist for a requirement category (always UNVERIFIED)
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "rtlscope": {
//!       "command": "rtlscope-mcp",
//!       "env": { "RTLSCOPE_DOCS_DIR": "/path/to/docs" }
//!     }
//!   }
//! }
//! ```

pub mod compliance;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod registry;
pub mod service;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ServerConfig};
pub use dispatch::Dispatcher;
pub use registry::{Registry, RegistryError};
pub use service::RtlscopeService;

use anyhow::{Context, Result};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

pub async fn main_entry() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServerConfig::load().context("failed to load rtlscope configuration")?;
    log::info!(
        "Starting rtlscope MCP server (docs: {}, make: {})",
        config.docs_dir.display(),
        config.make_program
    );
    config.check_docs_dir();

    let service = RtlscopeService::new(Dispatcher::new(config));
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("rtlscope MCP server stopped");
    Ok(())
}
