use clap::{Parser, Subcommand, ValueEnum};
use relaybox::messaging::Task;
use relaybox::worker::ResponseShape;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relaybox")]
#[command(about = "Relay tasks to an HTTP endpoint and post the results back", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $RELAYBOX_CONFIG or config/relaybox.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read JSON tasks from stdin, write relayed results to stdout
    Run,
    /// Relay a single task and print its result
    Send(SendArgs),
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Requester name passed to the endpoint
    #[arg(long)]
    pub from: String,

    /// Ask the endpoint to delay its response
    #[arg(long)]
    pub delay: bool,

    /// Override the configured response shape
    #[arg(long, value_enum)]
    pub shape: Option<ShapeArg>,
}

impl SendArgs {
    pub fn task(&self) -> Task {
        Task {
            from: self.from.clone(),
            delay: self.delay,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ShapeArg {
    Full,
    Content,
}

impl From<ShapeArg> for ResponseShape {
    fn from(value: ShapeArg) -> Self {
        match value {
            ShapeArg::Full => ResponseShape::Full,
            ShapeArg::Content => ResponseShape::Content,
        }
    }
}
