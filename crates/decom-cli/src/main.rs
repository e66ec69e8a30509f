use std::process::ExitCode;

use clap::Parser;
use decom_cli::{Cli, Commands, DecomConfig};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install log subscriber: {err}");
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        // Command ran but the case did not solve or did not validate
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Run {
            case,
            out,
            serial,
            max_stages,
            threads,
        } => {
            let config = DecomConfig::load(cli.config.as_deref())?;
            let options = commands::run::RunOptions {
                out: out.as_deref(),
                serial: *serial,
                max_stages: *max_stages,
                threads: threads.as_deref(),
            };
            commands::run::handle(case, &options, &config)
        }
        Commands::Cost { case } => commands::cost::handle(case).map(|()| true),
        Commands::Validate { case } => commands::validate::handle(case),
    }
}
