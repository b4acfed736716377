mod cli;
mod host;

use clap::Parser;
use cli::{Cli, Commands};
use relaybox::config::Config;
use relaybox::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config)?;

    match cli.command {
        Commands::Run => host::run(config).await?,
        Commands::Send(args) => {
            if let Some(shape) = args.shape {
                config.worker.response_shape = shape.into();
            }
            if let Some(result) = host::send_one(config, args.task()).await? {
                println!("{}", result);
            }
        }
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}
