use serde::{Deserialize, Serialize};

/// One playable item of the playlist, normalized from a raw API page item.
/// `video_id` is never empty; the fetcher drops raw items without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub title: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// Body of the `items-json` read operation.
#[derive(Debug, Serialize)]
pub struct PlaylistItemsResponse {
    #[serde(rename = "playlistItems")]
    pub playlist_items: Vec<PlaylistEntry>,
}

/// Generic error body emitted when the read operation fails.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_uses_wire_field_names() {
        let entry: PlaylistEntry =
            serde_json::from_str(r#"{"title":"Song","videoId":"abc123"}"#).unwrap();
        assert_eq!(entry.title, "Song");
        assert_eq!(entry.video_id, "abc123");

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["videoId"], "abc123");
    }

    #[test]
    fn response_wraps_entries_under_playlist_items() {
        let body = PlaylistItemsResponse {
            playlist_items: vec![PlaylistEntry {
                title: "Song".into(),
                video_id: "abc123".into(),
            }],
        };
        let out = serde_json::to_value(&body).unwrap();
        assert_eq!(out["playlistItems"][0]["videoId"], "abc123");
    }
}
