//! Entrypoint: set up tracing, load settings, inspect the database once,
//! and print the result set.
//!
//! Settings (`Settings` in `config.rs`) provide:
//!  - `database_path` – the SQLite file to open read-only
//!  - `query`         – the single read statement to run
//!  - `format`        – `json` (default) or `records`

use std::io;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use sqlite_inspector::config::Settings;
use sqlite_inspector::errors::InspectError;
use sqlite_inspector::inspector::Inspector;
use sqlite_inspector::render::write_result_set;

/// Application entrypoint for the inspector.
///
/// **Workflow**:
/// 1. Initialise tracing on stderr from `RUST_LOG` (or default to `warn`).
/// 2. Load `Inspector.toml` (and apply any `INSPECTOR__…` env-var overrides).
/// 3. Open the database read-only, run the query, close the connection.
/// 4. Render every row and write it to stdout in one go.
///
/// Any failure is printed as a single `error:` line on stderr and the
/// process exits with status 1; stdout stays empty.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), InspectError> {
    let settings = Settings::new()?;
    debug!(?settings, "Loaded configuration");

    let rows = Inspector::from_settings(&settings).inspect().await?;

    let mut stdout = io::stdout().lock();
    let written = write_result_set(&rows, settings.format, &mut stdout)?;
    debug!(rows = rows.len(), bytes = written, "Wrote result set");

    Ok(())
}
