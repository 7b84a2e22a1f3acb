//! Error types for the SurgiTrack binary.
//!
//! [`EngineBinError`] wraps every failure that can abort startup, so `main`
//! can propagate with `?`. Once the tick loop runs, nothing is fatal.

/// Top-level error for the SurgiTrack binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: surgitrack_core::config::ConfigError,
    },

    /// The snapshot slot could not be opened.
    #[error("storage error: {source}")]
    Db {
        /// The underlying storage error.
        #[from]
        source: surgitrack_db::DbError,
    },

    /// The persisted snapshot could not be loaded.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: surgitrack_core::store::StoreError,
    },

    /// The advisor prompt templates failed to load.
    #[error("advisor error: {source}")]
    Advisor {
        /// The underlying advisor error.
        #[from]
        source: surgitrack_advisor::error::AdvisorError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: surgitrack_observer::ServerError,
    },
}
