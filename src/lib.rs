pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod schedule;

use tracing_subscriber::EnvFilter;

pub use models::{Medication, MedicationSchedule, NewOccurrence, Note, NoteType, Occurrence};
pub use schedule::{
    generate_auto_notes, generate_occurrences, DeleteOutcome, EngineError, OccurrenceEngine,
    ScheduleStore, SqliteScheduleStore,
};

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// built-in filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}

/// Open the SQLite store described by `config` and wrap it in an engine.
pub fn open_engine(
    config: &config::EngineConfig,
) -> Result<OccurrenceEngine<SqliteScheduleStore>, db::DatabaseError> {
    let store = SqliteScheduleStore::open(config)?;
    tracing::info!(path = %config.database_path.display(), "Medication store ready");
    Ok(OccurrenceEngine::new(store))
}
