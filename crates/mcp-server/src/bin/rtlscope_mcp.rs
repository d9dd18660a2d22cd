use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    rtlscope_mcp::main_entry().await
}
