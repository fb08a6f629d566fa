use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ipfilter::{Cli, Dispatcher, ErrorKind, FilterError};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries the filtered lines
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) if e.kind() == ErrorKind::Usage => {
            eprintln!("{}\n", e);
            eprintln!("{}", Cli::command().render_help());
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e.into()),
    };
    debug!(?config, "starting");

    let processor = config
        .build_processor()
        .context("failed to load filter ranges")?;

    let dispatcher = Dispatcher::new(Arc::new(processor), config.procs);
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout());

    let stats = match dispatcher.run(stdin, stdout) {
        Ok(stats) => stats,
        // Downstream closed early (e.g. piped into `head`)
        Err(FilterError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(ExitCode::SUCCESS),
        Err(e) => return Err(e).context("failed to write output"),
    };

    if let Some(e) = &stats.read_error {
        eprintln!("failed to read input: {}", e);
    }

    Ok(ExitCode::SUCCESS)
}
