use anyhow::{Context, Result};
use rmcp::service::{RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn locate_rtlscope_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_rtlscope-mcp") {
        return Ok(PathBuf::from(path));
    }

    // `.../target/{debug|release}/deps/<test>` → `.../target/{debug|release}/rtlscope-mcp`
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("rtlscope-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in ["target/debug/rtlscope-mcp", "target/release/rtlscope-mcp"] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!("failed to locate rtlscope-mcp binary; build with: cargo build -p rtlscope-mcp")
}

/// Spawn the server with an isolated config and the given docs directory.
pub async fn start_server(
    config_dir: &Path,
    docs_dir: &Path,
) -> Result<RunningService<RoleClient, ()>> {
    let bin = locate_rtlscope_mcp_bin()?;
    let config_path = config_dir.join("config.toml");
    std::fs::write(&config_path, "").context("write empty config")?;

    let mut cmd = Command::new(bin);
    cmd.env("RUST_LOG", "warn");
    cmd.env("RTLSCOPE_CONFIG", &config_path);
    cmd.env("RTLSCOPE_DOCS_DIR", docs_dir);
    cmd.env_remove("RTLSCOPE_MAKE");
    cmd.env_remove("RTLSCOPE_RUN_TIMEOUT_SECS");

    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    let service = tokio::time::timeout(TIMEOUT, ().serve(transport))
        .await
        .context("timeout starting MCP server")??;
    Ok(service)
}
