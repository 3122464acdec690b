//! # tessel-engine
//!
//! Resolves a stream of cell sightings into named areas and applies the
//! profile bound to the area whenever it changes.
//!
//! ## Modules
//!
//! - [`normalizer`]: raw radio reading to [`CellKey`](tessel_types::cell::CellKey)
//! - [`state`]: process-wide resolution state shared by sightings and commands
//! - [`learning`]: time-bounded learning sessions
//! - [`resolver`]: cell to (area name, profile) resolution
//! - [`applier`]: profile application through external collaborators
//! - [`engine`]: sighting processing, commands and retroactive reassignment
//! - [`dispatcher`]: keyed worker pool feeding the engine
//! - [`clock`]: monotonic and wall-clock time sources

pub mod applier;
pub mod clock;
pub mod dispatcher;
pub mod engine;
pub mod learning;
pub mod normalizer;
pub mod resolver;
pub mod state;

pub use engine::Engine;

use tessel_db::DbError;
use tessel_types::AreaId;

/// Error types for the resolution engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Storage failure.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// Malformed command input, rejected before any state change.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The command targets an area that does not exist.
    #[error("unknown area: {0}")]
    UnknownArea(AreaId),

    /// The default area cannot be learned into, renamed or deleted.
    #[error("the default area cannot be modified this way")]
    DefaultAreaProtected,

    /// The sighting dispatcher has shut down.
    #[error("sighting dispatcher is closed")]
    DispatcherClosed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
