mod app;
mod config;
mod playback;
mod player;
mod playlist;
mod youtube;

use anyhow::Context;
use clap::{Parser, Subcommand};
use youtube::models::{ErrorBody, PlaylistEntry, PlaylistItemsResponse};

#[derive(Debug, Parser)]
#[command(name = "rollseq", version, about = "Shuffled playback for one YouTube playlist")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch, shuffle and play the configured playlist (default).
    Play,
    /// Print the playable entries in playlist order (headless).
    Items,
    /// Print the playable entries as JSON (headless).
    ItemsJson,
    /// Store the playlist id (or playlist url) in the config.
    Playlist { playlist_id: String },

    /// Audio output device management (mpv).
    Audio {
        #[command(subcommand)]
        cmd: AudioCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AudioCommand {
    /// List mpv audio devices.
    List,
    /// Set mpv audio device (name as shown in list).
    Set { device: String },
    /// Clear mpv audio device override.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => {
            app::run(cfg).await?;
        }
        Command::Items => {
            let entries = app::fetch_sanitized(&cfg).await?;
            print_entries(&entries);
        }
        Command::ItemsJson => match app::fetch_sanitized(&cfg).await {
            Ok(entries) => {
                let body = PlaylistItemsResponse {
                    playlist_items: entries,
                };
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Err(e) => {
                tracing::error!("{e:#}");
                let body = ErrorBody {
                    message: "internal server error".to_string(),
                };
                println!("{}", serde_json::to_string(&body)?);
                std::process::exit(1);
            }
        },
        Command::Playlist { playlist_id } => {
            let mut cfg = cfg;
            cfg.playlist.id = youtube::extract_playlist_id(&playlist_id)?;
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Updated playlist id in config.");
        }
        Command::Audio { cmd } => match cmd {
            AudioCommand::List => {
                let out = tokio::process::Command::new("mpv")
                    .args(["--audio-device=help", "--no-video", "--idle=no"])
                    .output()
                    .await
                    .context("run mpv --audio-device=help")?;
                // mpv prints the device list to stdout.
                print!("{}", String::from_utf8_lossy(&out.stdout));
                eprint!("{}", String::from_utf8_lossy(&out.stderr));
            }
            AudioCommand::Set { device } => {
                let mut cfg = cfg;
                cfg.player.audio_device = Some(device);
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated audio device in config.");
            }
            AudioCommand::Clear => {
                let mut cfg = cfg;
                cfg.player.audio_device = None;
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Cleared audio device override.");
            }
        },
    }

    Ok(())
}

fn print_entries(entries: &[PlaylistEntry]) {
    for (i, e) in entries.iter().enumerate() {
        println!("{:02}. {}  (video_id={})", i + 1, e.title, e.video_id);
    }
}
