//! # Kasir Register Library
//!
//! Wires configuration, logging, the database and the request channel into
//! a running register.
//!
//! ## Module Organization
//! ```text
//! kasir_register/
//! ├── lib.rs          ◄─── You are here (startup & shutdown)
//! ├── channel.rs      ◄─── RegisterHandle / Dispatcher (mpsc + oneshot)
//! ├── driver.rs       ◄─── JSON-lines protocol for the headless binary
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   └── config.rs   ◄─── AppConfig (defaults → kasir.toml → KASIR_*)
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   └── sale.rs     ◄─── checkout / delete / update / list
//! └── error.rs        ◄─── API error type
//! ```

pub mod channel;
pub mod commands;
pub mod driver;
pub mod error;
pub mod state;

use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use channel::RegisterHandle;
use error::StartupError;
use kasir_db::Database;
use state::AppConfig;

/// A started register: the database, its dispatcher task, and a handle.
#[derive(Debug)]
pub struct Register {
    handle: RegisterHandle,
    dispatcher: JoinHandle<()>,
    db: Database,
}

impl Register {
    /// Starts the register.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Resolve Database Path ─── config path, or the platform data dir   │
    /// │  2. Connect to Database ───── WAL, foreign keys, busy timeout,         │
    /// │                               pending migrations                       │
    /// │  3. Spawn Dispatcher ──────── bounded mpsc, one task per request       │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn start(config: &AppConfig) -> Result<Self, StartupError> {
        let db_config = config.db_config()?;
        info!(path = %db_config.database_path.display(), "Database path determined");

        let db = Database::new(db_config).await?;
        info!("Database connected and migrations applied");

        Ok(Self::with_database(db, config.register.queue_capacity))
    }

    /// Starts a register over an already opened database.
    pub fn with_database(db: Database, queue_capacity: usize) -> Self {
        let (handle, dispatcher) = channel::channel(db.clone(), queue_capacity);
        let dispatcher = tokio::spawn(dispatcher.run());

        Register {
            handle,
            dispatcher,
            db,
        }
    }

    /// Returns a new handle onto the running register.
    pub fn handle(&self) -> RegisterHandle {
        self.handle.clone()
    }

    /// Waits for in-flight requests, then closes the pool.
    ///
    /// Handles cloned out of the register must be dropped first, or this
    /// waits for them.
    pub async fn shutdown(self) {
        let Register {
            handle,
            dispatcher,
            db,
        } = self;

        drop(handle);
        if let Err(e) = dispatcher.await {
            tracing::error!(error = %e, "Dispatcher task failed");
        }
        db.close().await;

        info!("Register stopped");
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set (e.g. `RUST_LOG=kasir_db=trace`)
/// - otherwise `fallback`, normally [`AppConfig::log_filter`]
///
/// Logs go to stderr; stdout belongs to the driver protocol.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
