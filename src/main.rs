use angular_docs_mcp::config::{Cli, Config};
use angular_docs_mcp::server;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    server::start_stdio_server(Config::from(cli)).await
}
