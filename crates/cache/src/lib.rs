//! Local storage for reel.
//!
//! Two independent stores live here:
//! - the versioned **video database** ([`Database`] + [`VideoStore`]), one
//!   record per video identifier holding both encodings. It is a cache: the
//!   network is the source of truth, and a deleted database is simply
//!   repopulated on the next load.
//! - the flat **key/string store** ([`LocalStorage`]), used through
//!   [`Positions`] to remember where each video was paused.

mod db;
pub mod error;
mod local;
mod models;
mod repo;

pub use crate::db::{Database, SCHEMA_VERSION};
pub use crate::local::{LocalStorage, Positions};
pub use crate::models::RecordSummary;
pub use crate::repo::VideoStore;
