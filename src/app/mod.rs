use crate::config::Config;
use crate::playback::{PlaybackController, Status};
use crate::player::PlayerEvent;
use crate::player::mpv::MpvFactory;
use crate::playlist;
use crate::youtube::api::YoutubeClient;
use crate::youtube::models::PlaylistEntry;
use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;

/// Fetch the configured playlist and drop its unavailable entries. Shared by
/// playback and by the headless item listings, which print the list in this
/// still-unshuffled order.
pub async fn fetch_sanitized(cfg: &Config) -> anyhow::Result<Vec<PlaylistEntry>> {
    let playlist_id = require_playlist_id(cfg)?;
    let client = YoutubeClient::new(&cfg.youtube).context("build youtube client")?;

    info!("fetching playlist {playlist_id}");
    let entries = client
        .fetch_playlist_items(&playlist_id)
        .await
        .context("fetch playlist items")?;
    info!("fetched {} entries", entries.len());

    Ok(playlist::sanitize(entries))
}

/// Fetch, sanitize, shuffle, then play until the sequence ends or the user
/// interrupts. The played-entry log goes to stdout on the way out.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let mut entries = fetch_sanitized(&cfg).await?;
    playlist::shuffle(&mut entries, &mut rand::rng());
    info!("shuffled {} playable entries", entries.len());

    let (tx, mut rx) = mpsc::channel::<PlayerEvent>(64);
    let factory = MpvFactory::new(tx, cfg.player.audio_device.clone());
    let mut controller = PlaybackController::new(entries, cfg.player.loop_mode, factory);

    if !controller.start().await.context("start playback")? {
        println!("Playlist has no playable entries.");
        return Ok(());
    }

    loop {
        tokio::select! {
            ev = rx.recv() => {
                let Some(ev) = ev else { break };
                match ev {
                    PlayerEvent::Ready => controller.on_widget_ready().await?,
                    PlayerEvent::Ended => controller.on_finished().await?,
                    PlayerEvent::Error(reason) => controller.on_error(&reason).await?,
                }
                if controller.status() == Status::Ended {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    let log = controller.playback_log();
    if !log.is_empty() {
        println!("{log}");
    }
    Ok(())
}

fn require_playlist_id(cfg: &Config) -> anyhow::Result<String> {
    let id = cfg.playlist.id.trim();
    anyhow::ensure!(
        !id.is_empty(),
        "no playlist configured; run `rollseq playlist <ID>` first"
    );
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_playlist_id_is_rejected() {
        let cfg = Config::default();
        assert!(require_playlist_id(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.playlist.id = "  ".to_string();
        assert!(require_playlist_id(&cfg).is_err());

        cfg.playlist.id = "PLabc".to_string();
        assert_eq!(require_playlist_id(&cfg).unwrap(), "PLabc");
    }
}
