//! Static HTML export of a [`Page`].
//!
//! Writes a self-contained directory that any browser can open:
//!
//! ```text
//! <dir>/index.html
//! <dir>/page.css
//! <dir>/blobs/<serial>.<ext>    one file per object URL in use
//! ```
//!
//! A resumed player's sources carry a `#t=<offset>` media fragment, so the
//! exported page starts each video where it was last paused.

use crate::blob::BlobRegistry;
use crate::error::{ErrorKind, Result};
use crate::page::Page;
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use std::borrow::Cow;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;
use upon::{Engine, Value, fmt as upon_fmt};

pub const INDEX_FILE: &str = "index.html";
pub const STYLESHEET_FILE: &str = "page.css";
pub const BLOB_FOLDER: &str = "blobs";

#[derive(Embed)]
#[folder = "../../assets/templates/"]
struct Templates;

#[derive(Embed)]
#[folder = "../../assets/styles/"]
struct Styles;

fn asset(found: Option<rust_embed::EmbeddedFile>, name: &str) -> Result<Cow<'static, [u8]>> {
    found.map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(format!("builtin:{name}")))
}

/// Write `page` and every payload it references into `dir`, returning the
/// path of the written `index.html`.
#[instrument(skip(page, blobs), fields(dir = %dir.display()))]
pub async fn export(page: &Page, blobs: &BlobRegistry, dir: &Path) -> Result<PathBuf> {
    let blob_dir = dir.join(BLOB_FOLDER);
    tokio::fs::create_dir_all(&blob_dir).await.or_raise(|| ErrorKind::Io)?;

    let mut videos = Vec::new();
    for article in page.articles().await {
        let offset = article.player.current_time().await;
        let fragment = if offset > 0.0 { format!("#t={offset}") } else { String::new() };
        let mut sources = Vec::new();
        for source in article.player.sources() {
            let blob =
                blobs.resolve(&source.url).await.ok_or_raise(|| ErrorKind::AssetNotFound(source.url.to_string()))?;
            let file = format!("{}.{}", source.url.serial(), source.encoding.extension());
            tokio::fs::write(blob_dir.join(&file), blob.payload.bytes()).await.or_raise(|| ErrorKind::Io)?;
            sources.push(upon::value! {
                src: format!("{BLOB_FOLDER}/{file}{fragment}"),
                mime: source.mime(),
            });
        }
        let status = article.status.text().await;
        videos.push(upon::value! {
            label: article.label(),
            status_id: article.status.element_id(),
            status: status,
            sources: sources,
        });
    }
    let count = videos.len();

    let stylesheet = asset(Styles::get(STYLESHEET_FILE), STYLESHEET_FILE)?;
    tokio::fs::write(dir.join(STYLESHEET_FILE), &stylesheet).await.or_raise(|| ErrorKind::Io)?;

    let html = render_index(page.title(), videos)?;
    let index = dir.join(INDEX_FILE);
    tokio::fs::write(&index, html).await.or_raise(|| ErrorKind::Io)?;
    tracing::info!(videos = count, path = %index.display(), "page exported");
    Ok(index)
}

fn render_index(title: &str, videos: Vec<Value>) -> Result<String> {
    // Every interpolated value is HTML-escaped unless formatted with `raw`,
    // which is reserved for generated blob paths and MIME types.
    let mut engine = Engine::new();
    engine.set_default_formatter(&escape_html);
    engine.add_formatter("raw", upon_fmt::default);
    let source = asset(Templates::get("page.html"), "page.html")?;
    let source = String::from_utf8(source.into_owned()).or_raise(|| ErrorKind::Template)?;
    let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
    template
        .render(
            &engine,
            upon::value! {
                title: title,
                stylesheet: STYLESHEET_FILE,
                videos: videos,
            },
        )
        .to_string()
        .or_raise(|| ErrorKind::Template)
}

/// Default formatter: strings are written with HTML metacharacters escaped,
/// anything else is formatted as usual.
fn escape_html(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
    match value {
        Value::String(s) => {
            for c in s.chars() {
                match c {
                    '&' => f.write_str("&amp;")?,
                    '<' => f.write_str("&lt;")?,
                    '>' => f.write_str("&gt;")?,
                    '"' => f.write_str("&quot;")?,
                    '\'' => f.write_str("&#39;")?,
                    c => f.write_char(c)?,
                }
            }
        },
        v => upon_fmt::default(f, v)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Renderer;
    use reel_cache::{LocalStorage, Positions};
    use reel_media::{Payload, PlaybackPosition, VideoId};
    use std::sync::Arc;

    #[test]
    fn test_builtin_assets_are_embedded() {
        assert!(Templates::get("page.html").is_some());
        assert!(Styles::get(STYLESHEET_FILE).is_some());
    }

    #[test]
    fn test_values_are_escaped() {
        let html = render_index("Cats & <Dogs>", Vec::new()).unwrap();
        assert!(html.contains("<title>Cats &amp; &lt;Dogs&gt;</title>"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let sources: Vec<Value> = Vec::new();
        let videos = vec![upon::value! {
            label: "a\"b",
            status_id: "x'><script>",
            status: "<b>paused</b>",
            sources: sources,
        }];
        let html = render_index("t", videos).unwrap();
        assert!(html.contains(r#"<pre id="x&#39;&gt;&lt;script&gt;">&lt;b&gt;paused&lt;/b&gt;</pre>"#));
        assert!(html.contains("a&quot;b"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_raw_sources_are_not_escaped() {
        let sources = vec![upon::value! { src: "blobs/0.mp4#t=1.5", mime: "video/mp4" }];
        let videos = vec![upon::value! {
            label: "video1",
            status_id: "video1-status",
            status: "",
            sources: sources,
        }];
        let html = render_index("t", videos).unwrap();
        assert!(html.contains(r#"<source src="blobs/0.mp4#t=1.5" type="video/mp4">"#));
    }

    #[tokio::test]
    async fn test_export_writes_page_and_blobs() {
        let positions = Positions::from(LocalStorage::connect_in_memory().await.unwrap());
        let video1: VideoId = "video1".parse().unwrap();
        positions.set(&PlaybackPosition::new(video1.clone(), 12.5).unwrap()).await.unwrap();
        let renderer = Renderer::new(Arc::new(Page::new("Video players")), positions);
        renderer.render(&video1, Payload::from(&b"one-mp4"[..]), Payload::from(&b"one-webm"[..])).await.unwrap();
        renderer
            .render(&"video2".parse().unwrap(), Payload::from(&b"two-mp4"[..]), Payload::from(&b"two-webm"[..]))
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let index = export(renderer.page(), renderer.blobs(), dir.path()).await.unwrap();
        let html = std::fs::read_to_string(&index).unwrap();

        assert!(html.contains(r#"<source src="blobs/0.mp4#t=12.5" type="video/mp4">"#));
        assert!(html.contains(r#"<source src="blobs/1.webm#t=12.5" type="video/webm">"#));
        assert!(html.contains(r#"<source src="blobs/2.mp4" type="video/mp4">"#));
        assert!(html.contains(r#"<pre id="video1-status">resuming at: 12.5</pre>"#));
        assert!(html.contains(r#"<pre id="video2-status"></pre>"#));
        assert!(html.find("video1-status") < html.find("video2-status"));
        assert_eq!(std::fs::read(dir.path().join("blobs/3.webm")).unwrap(), b"two-webm");
        assert!(dir.path().join(STYLESHEET_FILE).exists());
    }
}
