//! The page side of reel: players mounted into a [`Page`], the
//! [`PositionTracker`] that remembers where each one was paused, and an
//! [`export`] of the page as static HTML.

mod blob;
pub mod error;
mod export;
mod page;
mod player;
mod renderer;
mod tracker;

pub use crate::blob::{Blob, BlobRegistry, ObjectUrl};
pub use crate::export::{BLOB_FOLDER, INDEX_FILE, STYLESHEET_FILE, export};
pub use crate::page::{Article, Page, StatusRegion};
pub use crate::player::{ObserverHandle, PlaybackObserver, Player, Source};
pub use crate::renderer::{Attachment, Renderer};
pub use crate::tracker::PositionTracker;
