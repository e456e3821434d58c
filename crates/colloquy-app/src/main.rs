use anyhow::Result;
use clap::Parser;
use colloquy_app::cli::{Cli, Commands};
use colloquy_app::server;
use colloquy_core::config::AppConfig;
use colloquy_core::{lifecycle, redact};

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = AppConfig::load_or_default(cli.config.as_deref());
            server::serve(config).await?;
        }
        Commands::Redact { text } => {
            println!("{}", redact(&text));
        }
    }

    Ok(())
}
