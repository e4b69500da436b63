pub mod error;
pub mod fetcher;
mod path;

pub use crate::fetcher::Fetcher;
pub use crate::path::resource_path;
use std::sync::Arc;

pub type FetcherHandle = Arc<dyn Fetcher + Send + Sync>;
