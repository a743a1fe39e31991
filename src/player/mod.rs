pub mod mpv;

/// Lifecycle signals of the embedded player, delivered over the app's event
/// channel.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The widget is constructed and the initial entry is loaded.
    Ready,
    /// The current entry finished playing.
    Ended,
    /// The current entry cannot be played.
    Error(String),
}

/// The slice of an embedded player the playback controller drives: load one
/// entry at a time and start playback. Signals flow back as `PlayerEvent`s.
pub trait PlayerWidget {
    async fn load_by_id(&self, video_id: &str) -> anyhow::Result<()>;
    async fn play(&self) -> anyhow::Result<()>;
}

/// Builds the widget. The controller calls this exactly once per session,
/// lazily, with the first entry to load.
pub trait WidgetFactory {
    type Widget: PlayerWidget;

    async fn create(&mut self, initial_video_id: &str) -> anyhow::Result<Self::Widget>;
}
