//! In-memory handles to video payloads.
//!
//! A player never holds the payload itself, only an [`ObjectUrl`] that the
//! [`BlobRegistry`] resolves back to the bytes. URLs stay valid until they are
//! revoked, for as long as the registry lives.

use derive_more::Display;
use reel_media::{Encoding, Payload};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Opaque, registry-unique reference to one payload, e.g. `blob:reel/3`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("blob:reel/{_0}")]
pub struct ObjectUrl(u64);

impl ObjectUrl {
    /// Position of this URL in creation order.
    pub fn serial(&self) -> u64 {
        self.0
    }
}

/// A registered payload together with its encoding.
#[derive(Clone, Debug)]
pub struct Blob {
    pub encoding: Encoding,
    pub payload: Payload,
}

#[derive(Debug, Default)]
pub struct BlobRegistry {
    next: AtomicU64,
    entries: RwLock<BTreeMap<ObjectUrl, Blob>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `payload` and hand back a fresh URL for it. The payload is
    /// shared, not copied.
    pub async fn create_object_url(&self, encoding: Encoding, payload: Payload) -> ObjectUrl {
        let url = ObjectUrl(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.write().await.insert(url, Blob { encoding, payload });
        url
    }

    pub async fn resolve(&self, url: &ObjectUrl) -> Option<Blob> {
        self.entries.read().await.get(url).cloned()
    }

    /// Returns `true` if the URL was still registered.
    pub async fn revoke(&self, url: &ObjectUrl) -> bool {
        self.entries.write().await.remove(url).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
