//! Spaced-repetition revision engine
//!
//! - `scheduler`: fixed checkpoints for a newly solved item
//! - `completion`: records an attempt, history and metrics
//! - `adaptive`: ease factor and interval recalculation
//! - `resolver`: the next actionable checkpoint as of a given time
//! - `prioritizer`: ranking across an owner's schedules
//! - `service`: the above against the store, with optimistic writes

pub mod adaptive;
pub mod completion;
pub mod error_responses;
pub mod prioritizer;
pub mod resolver;
pub mod scheduler;
pub mod service;

pub use completion::RevisionAttempt;
pub use prioritizer::RankedRevision;
pub use resolver::NextDue;
pub use service::RevisionService;
