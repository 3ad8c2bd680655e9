use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use tabledb::{CommandProcessor, Config, Database, Snapshotter};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::from_env();
    init_logging(&config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "terminated");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("tabledb=warn"));

    // stdout carries the responses
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(config: &Config) -> tabledb::Result<()> {
    let snapshotter = config.snapshot_path.clone().map(Snapshotter::new);

    let database = match &snapshotter {
        Some(snapshotter) if snapshotter.path().exists() => snapshotter.load()?,
        _ => Database::new(),
    };
    let mut processor = CommandProcessor::with_database(Arc::new(database));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        writeln!(stdout, "{}", processor.process(&line))?;
        stdout.flush()?;
        if !processor.is_running() {
            break;
        }
    }
    info!("input closed or stopped");

    if let Some(snapshotter) = &snapshotter {
        snapshotter.save(processor.database())?;
    }
    Ok(())
}
