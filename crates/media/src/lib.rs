//! Domain types shared by every reel crate.
//!
//! A video is known by its [`VideoId`] and exists as two [`Encoding`]s of the
//! same content. The bytes of one encoding are a [`Payload`]; both payloads
//! together form a [`CacheRecord`], which is the unit the local store keeps.

pub mod error;
mod id;
mod payload;
mod record;

pub use crate::id::VideoId;
pub use crate::payload::{Encoding, Payload};
pub use crate::record::{CacheRecord, PlaybackPosition};
