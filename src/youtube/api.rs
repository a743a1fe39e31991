use crate::config::YoutubeConfig;
use crate::youtube::models::PlaylistEntry;
use anyhow::Context;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

/// Page size cap of the upstream playlistItems endpoint.
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error reaching the playlist api: {0}")]
    Network(#[source] reqwest::Error),
    #[error("playlist api returned a bad response: {0}")]
    Upstream(String),
}

/// One page of the upstream playlistItems response. Transient; exists only
/// while the fetch loop runs.
#[derive(Debug, Deserialize)]
pub struct PlaylistItemsPage {
    items: Option<Vec<RawItem>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "resourceId")]
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_urls: Vec<String>,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl YoutubeClient {
    pub fn new(cfg: &YoutubeConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = cfg.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder.build().context("build http client")?;

        Ok(Self {
            http,
            base_urls: cfg.api_base_urls.clone(),
            api_key: cfg.api_key.clone(),
            access_token: cfg.access_token.clone(),
        })
    }

    /// Fetch every entry of the playlist, page by page, preserving upstream
    /// order within and across pages. Base urls are tried in turn until one
    /// answers; the last error wins when all fail. No retry against a single
    /// base url.
    pub async fn fetch_playlist_items(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistEntry>, FetchError> {
        let mut last_err = None;
        for base in &self.base_urls {
            match collect_pages(|token| self.fetch_page(base, playlist_id, token)).await {
                Ok(entries) => return Ok(entries),
                Err(e) => {
                    warn!("playlist fetch via {base} failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| FetchError::Upstream("no api base urls configured".to_string())))
    }

    async fn fetch_page(
        &self,
        base: &str,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<PlaylistItemsPage, FetchError> {
        let url = format!("{base}/playlistItems");
        let max_results = MAX_PAGE_SIZE.to_string();
        let mut req = self.http.get(&url).query(&[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ]);
        if let Some(token) = page_token.as_deref() {
            req = req.query(&[("pageToken", token)]);
        }
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("key", key)]);
        }
        if let Some(token) = self.access_token.as_deref() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(FetchError::Network)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(FetchError::Network)?;
        if !status.is_success() {
            return Err(FetchError::Upstream(format!("http status {status}")));
        }
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Upstream(format!("unparseable page body: {e}")))
    }
}

/// Drive the page loop: request pages strictly sequentially, accumulating
/// normalized entries, until the response stops supplying a continuation
/// token. A missing or empty token on any page, the first included, ends the
/// loop.
async fn collect_pages<F, Fut>(mut next_page: F) -> Result<Vec<PlaylistEntry>, FetchError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<PlaylistItemsPage, FetchError>>,
{
    let mut entries = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = next_page(token.take()).await?;
        let items = page
            .items
            .ok_or_else(|| FetchError::Upstream("response is missing the items array".into()))?;
        debug!("page carried {} raw items", items.len());

        for item in items {
            if let Some(entry) = normalize_item(item) {
                entries.push(entry);
            }
        }

        match page.next_page_token {
            Some(t) if !t.is_empty() => token = Some(t),
            _ => break,
        }
    }

    Ok(entries)
}

fn normalize_item(item: RawItem) -> Option<PlaylistEntry> {
    let snippet = item.snippet?;
    let video_id = snippet.resource_id?.video_id.filter(|id| !id.is_empty())?;
    Some(PlaylistEntry {
        title: snippet.title,
        video_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn page(v: serde_json::Value) -> PlaylistItemsPage {
        serde_json::from_value(v).unwrap()
    }

    fn item(title: &str, video_id: &str) -> serde_json::Value {
        json!({"snippet": {"title": title, "resourceId": {"videoId": video_id}}})
    }

    fn titles(entries: &[PlaylistEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    #[tokio::test]
    async fn accumulates_pages_until_token_runs_out() {
        let calls = RefCell::new(Vec::new());
        let entries = collect_pages(|token| {
            calls.borrow_mut().push(token.clone());
            let page = match token.as_deref() {
                None => page(json!({
                    "items": [item("A", "a1"), item("B", "b2")],
                    "nextPageToken": "t1",
                })),
                Some("t1") => page(json!({
                    "items": [item("C", "c3")],
                    "nextPageToken": "",
                })),
                other => panic!("unexpected page token {other:?}"),
            };
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(titles(&entries), vec!["A", "B", "C"]);
        assert_eq!(*calls.borrow(), vec![None, Some("t1".to_string())]);
    }

    #[tokio::test]
    async fn missing_token_stops_after_one_page() {
        let calls = RefCell::new(0);
        let entries = collect_pages(|_| {
            *calls.borrow_mut() += 1;
            let page = page(json!({"items": [item("A", "a1")]}));
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(titles(&entries), vec!["A"]);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn missing_items_array_is_an_upstream_error() {
        let result = collect_pages(|_| {
            let page = page(json!({"nextPageToken": "t1"}));
            async move { Ok(page) }
        })
        .await;

        assert!(matches!(result, Err(FetchError::Upstream(_))));
    }

    #[tokio::test]
    async fn raw_items_without_a_video_id_are_dropped() {
        let entries = collect_pages(|_| {
            let page = page(json!({
                "items": [
                    item("A", "a1"),
                    {"snippet": {"title": "no resource"}},
                    {"snippet": {"title": "empty id", "resourceId": {"videoId": ""}}},
                    {"id": "opaque"},
                    item("B", "b2"),
                ],
            }));
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(titles(&entries), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn page_errors_propagate() {
        let result = collect_pages(|_| async {
            Err::<PlaylistItemsPage, _>(FetchError::Upstream("http status 500".into()))
        })
        .await;

        assert!(matches!(result, Err(FetchError::Upstream(_))));
    }

    #[test]
    fn decodes_a_realistic_page() {
        let page = page(json!({
            "kind": "youtube#playlistItemListResponse",
            "nextPageToken": "CDIQAA",
            "pageInfo": {"totalResults": 120, "resultsPerPage": 50},
            "items": [{
                "kind": "youtube#playlistItem",
                "id": "UExM...",
                "snippet": {
                    "publishedAt": "2024-03-01T00:00:00Z",
                    "title": "Song",
                    "position": 0,
                    "resourceId": {"kind": "youtube#video", "videoId": "abc123"},
                },
            }],
        }));

        assert_eq!(page.next_page_token.as_deref(), Some("CDIQAA"));
        let items = page.items.unwrap();
        assert_eq!(items.len(), 1);
        let entry = normalize_item(items.into_iter().next().unwrap()).unwrap();
        assert_eq!(entry.video_id, "abc123");
    }
}
