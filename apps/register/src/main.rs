//! # Kasir Register Entry Point
//!
//! Headless driver: one JSON request per stdin line, one JSON response per
//! stdout line. See [`kasir_register::driver`] for the line format.
//!
//! ## Startup Sequence
//! 1. Load configuration (defaults → kasir.toml → KASIR_*)
//! 2. Initialize tracing (stderr)
//! 3. Connect to database & run migrations
//! 4. Spawn the dispatcher
//! 5. Serve stdin until EOF, then drain and close

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use kasir_register::state::AppConfig;
use kasir_register::{driver, init_tracing, Register};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(None)?;
    init_tracing(config.log_filter());

    info!("Starting Kasir register");

    let register = Register::start(&config).await?;
    let handle = register.handle();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = driver::handle_line(&handle, &line).await;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    drop(handle);
    register.shutdown().await;

    Ok(())
}
