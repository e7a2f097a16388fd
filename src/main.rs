use clap::Parser;
use satcrop::cli::{Cli, run};
use satcrop::log::init_logging;
use std::process::ExitCode;
use std::time::Instant;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let start_time = Instant::now();
    match run(cli).await {
        Ok(()) => {
            log::debug!("Finished in {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
