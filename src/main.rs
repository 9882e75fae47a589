mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use recipebox::{api, config::Config, observability};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = Config::load_with(args.config)?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }

            observability::init_tracing(&config.telemetry.log_filter)?;
            api::run(config).await?;
        }
    }

    Ok(())
}
