use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    session_cli::main_entry().await
}
