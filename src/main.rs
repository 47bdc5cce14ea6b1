use anyhow::Result;
use clap::Parser;
use crawl_overwatch::{cli, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;
    logging::init_tracing(if args.verbose { "info" } else { "warn" })?;

    match cli::run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if is_silent {
                println!("{e:#}");
                std::process::exit(1);
            }
            Err(e)
        }
    }
}
