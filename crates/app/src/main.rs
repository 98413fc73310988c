use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    repodeck::runtime::main_entry().await
}
