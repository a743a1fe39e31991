use crate::player::{PlayerEvent, PlayerWidget, WidgetFactory};
use anyhow::Context;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};
use tracing::warn;

/// Builds an `MpvWidget` on first use, wiring its signals into the app's
/// event channel.
#[derive(Debug)]
pub struct MpvFactory {
    event_tx: mpsc::Sender<PlayerEvent>,
    audio_device: Option<String>,
}

impl MpvFactory {
    pub fn new(event_tx: mpsc::Sender<PlayerEvent>, audio_device: Option<String>) -> Self {
        Self {
            event_tx,
            audio_device,
        }
    }
}

impl WidgetFactory for MpvFactory {
    type Widget = MpvWidget;

    async fn create(&mut self, initial_video_id: &str) -> anyhow::Result<MpvWidget> {
        MpvWidget::spawn(
            self.event_tx.clone(),
            self.audio_device.as_deref(),
            initial_video_id,
        )
        .await
    }
}

/// mpv behind the widget interface: one process per session, driven over its
/// JSON IPC socket. Spawned paused with the initial entry loaded; `play`
/// releases the pause, after which replaced entries start on their own.
#[derive(Debug)]
pub struct MpvWidget {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
}

impl MpvWidget {
    async fn spawn(
        event_tx: mpsc::Sender<PlayerEvent>,
        audio_device: Option<&str>,
        initial_video_id: &str,
    ) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join("rollseq-mpv.sock");
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args([
            "--no-video",
            "--idle=yes",
            "--pause",
            "--input-terminal=no",
            "--really-quiet",
        ]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        // Connect (mpv creates the socket shortly after starting).
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        // Pump mpv JSON events -> player events.
        tokio::spawn(read_events_loop(reader, event_tx.clone()));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
        };

        // Ask mpv to report load failures so they reach the log.
        this.command(json!({"command": ["request_log_messages", "warn"]}))
            .await?;
        this.load_by_id(initial_video_id).await?;

        let _ = event_tx.send(PlayerEvent::Ready).await;
        Ok(this)
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so replies can be matched on the IPC stream.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl PlayerWidget for MpvWidget {
    async fn load_by_id(&self, video_id: &str) -> anyhow::Result<()> {
        let url = watch_url(video_id);
        self.command(json!({"command": ["loadfile", url, "replace"]}))
            .await
    }

    async fn play(&self) -> anyhow::Result<()> {
        self.command(json!({"command": ["set_property", "pause", false]}))
            .await
    }
}

impl Drop for MpvWidget {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

async fn connect_with_retry(path: &PathBuf) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e)
                        .with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(
    reader: tokio::io::ReadHalf<UnixStream>,
    event_tx: mpsc::Sender<PlayerEvent>,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        // Command replies: {"request_id":..., "error":"..."}
        if let (Some(_rid), Some(err)) = (v.get("request_id"), v.get("error"))
            && let Some(err_s) = err.as_str()
            && err_s != "success"
        {
            warn!("mpv ipc error: {err_s}");
        }
        if let Some(pe) = map_mpv_event(&v) {
            let _ = event_tx.send(pe).await;
        }
    }
}

fn map_mpv_event(v: &serde_json::Value) -> Option<PlayerEvent> {
    match v.get("event")?.as_str()? {
        "end-file" => {
            // Only a natural end or a load failure may drive the controller;
            // end-files caused by our own loadfile replace ("stop",
            // "redirect") must not, or every advance would double-fire.
            match v.get("reason").and_then(|x| x.as_str()).unwrap_or("") {
                "eof" => Some(PlayerEvent::Ended),
                "error" => {
                    let err = v
                        .get("file_error")
                        .or_else(|| v.get("error"))
                        .and_then(|x| x.as_str())
                        .unwrap_or("unknown");
                    Some(PlayerEvent::Error(format!("mpv end-file: {err}")))
                }
                _ => None,
            }
        }
        "log-message" => {
            // Diagnostics only. Turning warnings into Error events would
            // make the controller skip entries that still play fine.
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if (level == "warn" || level == "error") && !text.is_empty() {
                warn!("mpv {level}: {text}");
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_file_eof_maps_to_ended() {
        let ev = map_mpv_event(&json!({"event": "end-file", "reason": "eof"}));
        assert!(matches!(ev, Some(PlayerEvent::Ended)));
    }

    #[test]
    fn end_file_error_maps_to_error() {
        let ev = map_mpv_event(
            &json!({"event": "end-file", "reason": "error", "file_error": "loading failed"}),
        );
        match ev {
            Some(PlayerEvent::Error(msg)) => assert!(msg.contains("loading failed")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn replace_triggered_end_file_is_ignored() {
        assert!(map_mpv_event(&json!({"event": "end-file", "reason": "stop"})).is_none());
        assert!(map_mpv_event(&json!({"event": "end-file", "reason": "redirect"})).is_none());
        assert!(map_mpv_event(&json!({"event": "idle"})).is_none());
    }

    #[test]
    fn watch_url_embeds_the_video_id() {
        assert_eq!(
            watch_url("abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
    }
}
