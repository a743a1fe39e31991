use crate::player::{PlayerWidget, WidgetFactory};
use crate::youtube::models::PlaylistEntry;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What happens when playback moves past the last entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Wrap to the first entry and keep going.
    #[default]
    Repeat,
    /// Finish the session once every entry has played.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Loading,
    Ready,
    Playing,
    Ended,
}

/// Playback state for one process run: the shuffled sequence, the cursor
/// into it, and the log of entries that began playing. `current_index` stays
/// inside the sequence while playback is active; `history` is append-only
/// and may repeat entries when the sequence wraps.
#[derive(Debug)]
struct PlaybackSession {
    sequence: Vec<PlaylistEntry>,
    current_index: usize,
    history: Vec<PlaylistEntry>,
    status: Status,
}

/// Drives the widget through the sequence: start lazily builds the widget,
/// ready begins playback, and every finished or failed entry advances the
/// cursor. The widget is built once and owned here for the whole session.
pub struct PlaybackController<F: WidgetFactory> {
    session: PlaybackSession,
    loop_mode: LoopMode,
    factory: F,
    widget: Option<F::Widget>,
}

impl<F: WidgetFactory> PlaybackController<F> {
    pub fn new(sequence: Vec<PlaylistEntry>, loop_mode: LoopMode, factory: F) -> Self {
        Self {
            session: PlaybackSession {
                sequence,
                current_index: 0,
                history: Vec::new(),
                status: Status::NotStarted,
            },
            loop_mode,
            factory,
            widget: None,
        }
    }

    pub fn status(&self) -> Status {
        self.session.status
    }

    pub fn current_index(&self) -> usize {
        self.session.current_index
    }

    /// Every entry that began playing, in play order.
    pub fn history(&self) -> &[PlaylistEntry] {
        &self.session.history
    }

    /// Titles of every entry that began playing, one per line.
    pub fn playback_log(&self) -> String {
        self.session
            .history
            .iter()
            .map(|e| e.title.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Begin the session: build the widget, loaded with the first entry.
    /// Returns false without building anything when the sequence is empty;
    /// a second call after the session has started is a no-op.
    pub async fn start(&mut self) -> anyhow::Result<bool> {
        if self.session.sequence.is_empty() {
            info!("sequence is empty, nothing to play");
            return Ok(false);
        }
        if self.session.status != Status::NotStarted {
            return Ok(true);
        }
        if self.session.sequence.len() == 1 && self.loop_mode == LoopMode::Repeat {
            info!("single-entry sequence, the same entry will repeat");
        }

        self.session.status = Status::Loading;
        let first = self.session.sequence[0].video_id.clone();
        let widget = self.factory.create(&first).await?;
        self.widget = Some(widget);
        Ok(true)
    }

    /// The widget signalled ready: play the first entry and log it.
    pub async fn on_widget_ready(&mut self) -> anyhow::Result<()> {
        if self.session.status != Status::Loading {
            return Ok(());
        }
        self.session.status = Status::Ready;

        let widget = self.widget.as_ref().context("no widget while loading")?;
        widget.play().await?;

        let entry = self.session.sequence[self.session.current_index].clone();
        info!("playing: {}", entry.title);
        self.session.history.push(entry);
        self.session.status = Status::Playing;
        Ok(())
    }

    /// The current entry finished naturally.
    pub async fn on_finished(&mut self) -> anyhow::Result<()> {
        self.advance().await
    }

    /// A playback failure is skip-forward: the same transition as a natural
    /// end. The reason goes to the log and nowhere else.
    pub async fn on_error(&mut self, reason: &str) -> anyhow::Result<()> {
        warn!("playback error, skipping entry: {reason}");
        self.advance().await
    }

    async fn advance(&mut self) -> anyhow::Result<()> {
        if self.session.status != Status::Playing {
            return Ok(());
        }

        let next = (self.session.current_index + 1) % self.session.sequence.len();
        if next == 0 && self.loop_mode == LoopMode::Stop {
            info!("reached the end of the sequence");
            self.session.status = Status::Ended;
            return Ok(());
        }

        self.session.current_index = next;
        let entry = self.session.sequence[next].clone();
        debug!("advancing to index {next}");

        let widget = self.widget.as_ref().context("no widget while playing")?;
        widget.load_by_id(&entry.video_id).await?;

        info!("playing: {}", entry.title);
        self.session.history.push(entry);
        Ok(())
    }
}
