//! The page every player is mounted into.

use crate::error::{ErrorKind, Result};
use crate::player::Player;
use reel_media::VideoId;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Text shown next to a player ("playing...", "Paused at: 12.5", …).
#[derive(Debug)]
pub struct StatusRegion {
    element_id: String,
    text: RwLock<String>,
}

impl StatusRegion {
    pub fn new(id: &VideoId) -> Self {
        Self { element_id: Self::element_id_for(id), text: RwLock::default() }
    }

    /// Element id of the status region belonging to `id`: `"<id>-status"`.
    pub fn element_id_for(id: &VideoId) -> String {
        format!("{id}-status")
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub async fn text(&self) -> String {
        self.text.read().await.clone()
    }

    pub async fn set_text(&self, text: impl Into<String>) {
        *self.text.write().await = text.into();
    }
}

/// One mounted unit: a player, its label and its status region.
#[derive(Clone, Debug)]
pub struct Article {
    pub player: Arc<Player>,
    pub status: Arc<StatusRegion>,
}

impl Article {
    pub fn new(player: Arc<Player>) -> Self {
        let status = Arc::new(StatusRegion::new(player.id()));
        Self { player, status }
    }

    pub fn id(&self) -> &VideoId {
        self.player.id()
    }

    /// Visible caption; the identifier itself.
    pub fn label(&self) -> &str {
        self.player.id().as_str()
    }
}

/// Where newly mounted articles go.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum MountOrder {
    /// Appended as rendering completes, so the order depends on which
    /// video finished loading first.
    #[default]
    Completion,
    /// Kept sorted by position in this list. Identifiers not in the list go
    /// last, in completion order.
    Declared(Vec<VideoId>),
}

#[derive(Debug)]
pub struct Page {
    title: String,
    order: MountOrder,
    articles: RwLock<Vec<Article>>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), order: MountOrder::Completion, articles: RwLock::default() }
    }

    pub fn with_declared_order(mut self, ids: impl IntoIterator<Item = VideoId>) -> Self {
        self.order = MountOrder::Declared(ids.into_iter().collect());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Mount an article. A page holds at most one player per identifier.
    pub async fn mount(&self, article: Article) -> Result<()> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|existing| existing.id() == article.id()) {
            exn::bail!(ErrorKind::DuplicatePlayer(article.id().clone()));
        }
        let index = match &self.order {
            MountOrder::Completion => articles.len(),
            MountOrder::Declared(declared) => {
                let rank = |id: &VideoId| declared.iter().position(|d| d == id).unwrap_or(usize::MAX);
                let own = rank(article.id());
                articles.iter().position(|existing| rank(existing.id()) > own).unwrap_or(articles.len())
            },
        };
        tracing::debug!(video = %article.id(), index, "article mounted");
        articles.insert(index, article);
        Ok(())
    }

    pub async fn player(&self, id: &VideoId) -> Option<Arc<Player>> {
        self.articles.read().await.iter().find(|a| a.id() == id).map(|a| a.player.clone())
    }

    /// All players in mount order.
    pub async fn players(&self) -> Vec<Arc<Player>> {
        self.articles.read().await.iter().map(|a| a.player.clone()).collect()
    }

    /// Look up a status region by element id, e.g. `"video1-status"`.
    pub async fn find_status(&self, element_id: &str) -> Option<Arc<StatusRegion>> {
        self.articles.read().await.iter().find(|a| a.status.element_id() == element_id).map(|a| a.status.clone())
    }

    pub async fn articles(&self) -> Vec<Article> {
        self.articles.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.articles.read().await.is_empty()
    }
}
