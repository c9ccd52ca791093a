use std::{fs::OpenOptions, path::Path};

use env_logger::{Builder, Env, Target};

use crate::errors::DashError;

/// Sends log output to `log_file`. The terminal belongs to the UI, so without a
/// file nothing is logged.
pub fn init(log_file: Option<&Path>) -> Result<(), DashError> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| DashError::Config(format!("Failed to initialise logging: {}", e)))?;

    log::info!("logging to {}", path.display());
    Ok(())
}
