pub mod handlers;
pub mod logging;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use spotcount_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;
    match cli.command {
        Commands::Count {
            root,
            filter,
            channels,
            threshold,
            params,
            detector,
            detector_args,
            delimiter,
        } => handlers::handle_count(
            root,
            filter,
            channels,
            threshold,
            params,
            detector,
            detector_args,
            delimiter,
        ),
        Commands::Inspect { image } => handlers::handle_inspect(image),
        Commands::Params {
            params,
            threshold,
            out,
        } => handlers::handle_params(params, threshold, out),
    }
}
