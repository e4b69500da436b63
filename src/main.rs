mod app;
mod cli;
mod error;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use reel_config::Config;
use reel_loader::error::ErrorKind as LoadErrorKind;
use reel_loader::{LoadEvent, Persist};
use reel_media::VideoId;
use reel_render::StatusRegion;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{err}");
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let app = App::open(config).await?;
    let result = match cli.command {
        Command::Load { output } => load(&app, output).await,
        Command::Play { id } => play(&app, &parse_id(&id)?).await,
        Command::Pause { id, at } => pause(&app, &parse_id(&id)?, at).await,
        Command::Status => status(&app).await,
    };
    app.close().await;
    result
}

fn parse_id(raw: &str) -> Result<VideoId> {
    raw.parse::<VideoId>().or_raise(|| ErrorKind::InvalidArgument(format!("invalid video id {raw:?}")))
}

async fn load(app: &App, output: Option<std::path::PathBuf>) -> Result<()> {
    let ids = app.config.video_ids().or_raise(|| ErrorKind::Config)?;
    let loader = app.loader()?;
    let (mut rendered, mut failed) = (0usize, 0usize);
    let mut events = std::pin::pin!(loader.load(ids));
    while let Some(event) = events.next().await {
        match event {
            Ok(LoadEvent::Started) => tracing::debug!("load started"),
            Ok(LoadEvent::Queued(n)) => tracing::info!(videos = n, "loading videos"),
            Ok(LoadEvent::Rendered(loaded)) => {
                rendered += 1;
                tracing::info!(video = %loaded.id, origin = ?loaded.origin, "video rendered");
            },
            Ok(LoadEvent::Persisted { id, outcome: Persist::Failed }) => {
                tracing::warn!(video = %id, "video not cached; it will be downloaded again next time")
            },
            Ok(LoadEvent::Persisted { id, outcome }) => tracing::debug!(video = %id, ?outcome, "video cached"),
            Ok(LoadEvent::TrackingAttached(n)) => tracing::info!(players = n, "position tracking attached"),
            Ok(LoadEvent::Complete) => tracing::debug!("load complete"),
            Err(err) => {
                failed += 1;
                match &*err {
                    LoadErrorKind::Fetch(id) => tracing::error!(video = %id, error = ?err, "download failed; video skipped"),
                    LoadErrorKind::Render(id) => tracing::error!(video = %id, error = ?err, "render failed; video skipped"),
                }
            },
        }
    }

    let dir = output.unwrap_or_else(|| app.config.page.output.clone());
    let renderer = loader.renderer();
    let index = reel_render::export(renderer.page(), renderer.blobs(), &dir).await.or_raise(|| ErrorKind::Export)?;
    tracing::info!(rendered, failed, "done");
    println!("{}", index.display());
    Ok(())
}

async fn play(app: &App, id: &VideoId) -> Result<()> {
    let loader = app.interactive_loader()?;
    let loaded = loader.load_one(id).await.or_raise(|| ErrorKind::Load(id.to_string()))?;
    loaded.player.play().await;
    print_status(&loader, id).await;
    Ok(())
}

async fn pause(app: &App, id: &VideoId, at: f64) -> Result<()> {
    if !at.is_finite() || at < 0.0 {
        exn::bail!(ErrorKind::InvalidArgument(format!("offset must be a non-negative number of seconds, got {at}")));
    }
    let loader = app.interactive_loader()?;
    let loaded = loader.load_one(id).await.or_raise(|| ErrorKind::Load(id.to_string()))?;
    loaded.player.play().await;
    loaded.player.seek(at).await;
    loaded.player.pause().await;
    print_status(&loader, id).await;
    Ok(())
}

async fn print_status(loader: &reel_loader::Loader, id: &VideoId) {
    if let Some(status) = loader.renderer().page().find_status(&StatusRegion::element_id_for(id)).await {
        println!("{id}: {}", status.text().await);
    }
}

async fn status(app: &App) -> Result<()> {
    let records = app.store().list().await.or_raise(|| ErrorKind::Store)?;
    let positions = app.positions.list().await.or_raise(|| ErrorKind::Store)?;
    println!("store version {}", app.db.version().await.or_raise(|| ErrorKind::Store)?);
    for record in &records {
        println!(
            "{}\tmp4 {} bytes\twebm {} bytes\tstored {}",
            record.id, record.mp4_size, record.webm_size, record.stored_at
        );
    }
    for position in &positions {
        println!("{}\tpaused at {}", position.id, position.offset());
    }
    if records.is_empty() && positions.is_empty() {
        println!("nothing cached yet");
    }
    Ok(())
}
