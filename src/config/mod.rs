use crate::playback::LoopMode;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playlist: PlaylistConfig,
    pub youtube: YoutubeConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Id of the playlist to play (the `list=` value of its url).
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Api base urls, tried in order until one answers.
    pub api_base_urls: Vec<String>,
    /// Api key, sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// OAuth bearer token, obtained out of band.
    pub access_token: Option<String>,
    /// Per-request timeout in seconds. No timeout when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_base_urls: vec!["https://www.googleapis.com/youtube/v3".to_string()],
            api_key: None,
            access_token: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// mpv audio device name (see `mpv --audio-device=help`)
    pub audio_device: Option<String>,
    /// Whether playback wraps to the first entry or stops at the end.
    pub loop_mode: LoopMode,
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "rollseq", "rollseq").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.playlist.id.is_empty());
        assert_eq!(
            cfg.youtube.api_base_urls,
            vec!["https://www.googleapis.com/youtube/v3".to_string()]
        );
        assert!(cfg.youtube.api_key.is_none());
        assert_eq!(cfg.player.loop_mode, LoopMode::Repeat);
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let raw = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg: Config = toml::from_str(&raw).unwrap();
        assert_eq!(
            cfg.youtube.api_base_urls,
            Config::default().youtube.api_base_urls
        );
        assert_eq!(cfg.player.loop_mode, LoopMode::Repeat);
    }

    #[test]
    fn loop_mode_parses_from_lowercase_names() {
        let cfg: Config = toml::from_str("[player]\nloop_mode = \"stop\"\n").unwrap();
        assert_eq!(cfg.player.loop_mode, LoopMode::Stop);

        let cfg: Config = toml::from_str("[player]\nloop_mode = \"repeat\"\n").unwrap();
        assert_eq!(cfg.player.loop_mode, LoopMode::Repeat);
    }
}
