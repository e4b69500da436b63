//! Layered configuration for reel.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults ([`Config::default()`]),
//! 2. a configuration file, TOML, YAML or JSON by extension (`--config`, or
//!    `reel.toml` in the platform configuration directory if it exists),
//! 3. `REEL_` environment variables, with `__` separating nested keys
//!    (`REEL_SOURCE__BASE_URL`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use reel_media::VideoId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "REEL_";
pub const CONFIG_FILE: &str = "reel.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "reel")
}

/// Where data files go when not configured: the platform data directory,
/// or the working directory if the platform has none.
fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
}

/// The configuration file used when none is given explicitly.
pub fn default_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifiers of the videos on the page, in declared order.
    pub videos: Vec<String>,
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub tracking: TrackingConfig,
    pub page: PageConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Video database file.
    pub path: PathBuf,
    /// Schema version the video database is opened at.
    pub version: u32,
    /// Key/string store holding playback positions.
    pub local_storage: PathBuf,
}

/// Where videos are fetched from on a cache miss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Http { base_url: String },
    Directory { root: PathBuf },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Delay, measured from the start of a load, before position tracking
    /// is attached to every player. `0` attaches each player as it renders.
    pub settle_delay_ms: u64,
}

impl TrackingConfig {
    pub fn settle_delay(&self) -> Option<Duration> {
        (self.settle_delay_ms > 0).then(|| Duration::from_millis(self.settle_delay_ms))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrder {
    /// Players appear as their videos finish loading.
    #[default]
    Completion,
    /// Players appear in the order of [`Config::videos`].
    Declared,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub order: PageOrder,
    /// Directory the static page is exported to.
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            videos: ["video1", "video2", "video3", "video4"].map(String::from).to_vec(),
            store: StoreConfig::default(),
            source: SourceConfig::default(),
            tracking: TrackingConfig::default(),
            page: PageConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let dir = data_dir();
        Self { path: dir.join("videos.db"), version: 1, local_storage: dir.join("local-storage.db") }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Directory { root: PathBuf::from(".") }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self { title: "Video players".to_string(), order: PageOrder::default(), output: data_dir().join("page") }
    }
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path().filter(|path| path.exists()),
        };
        let figment = Self::figment(file.as_deref()).merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(&figment)
    }

    /// Defaults with the given file merged on top, without the environment.
    pub fn figment(file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let Some(file) = file else {
            return figment;
        };
        tracing::debug!(path = %file.display(), "reading configuration file");
        match file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
            Some("json") => figment.merge(Json::file(file)),
            _ => figment.merge(Toml::file(file)),
        }
    }

    pub fn extract(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.videos.is_empty() {
            exn::bail!(ErrorKind::Invalid("no videos configured".to_string()));
        }
        let mut seen = HashSet::new();
        for id in self.video_ids()? {
            if !seen.insert(id.clone()) {
                exn::bail!(ErrorKind::Invalid(format!("video {id} is listed twice")));
            }
        }
        if self.store.version == 0 {
            exn::bail!(ErrorKind::Invalid("store.version must be at least 1".to_string()));
        }
        if let SourceConfig::Http { base_url } = &self.source
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            exn::bail!(ErrorKind::Invalid(format!("source.base_url is not an HTTP(S) URL: {base_url}")));
        }
        Ok(())
    }

    /// The configured identifiers, in declared order.
    pub fn video_ids(&self) -> Result<Vec<VideoId>> {
        self.videos
            .iter()
            .map(|name| name.parse::<VideoId>().or_raise(|| ErrorKind::Invalid(format!("invalid video id {name:?}"))))
            .collect()
    }
}
