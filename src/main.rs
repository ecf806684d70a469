use clap::Parser;

use oddsfeed::cli::{check, run, CheckCommand, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::execute(&args).await?,
        Commands::Check(CheckCommand::Config(arg)) => check::execute_config(&arg.config)?,
    }

    Ok(())
}
