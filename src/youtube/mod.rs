pub mod api;
pub mod models;

/// Accept either a bare playlist id or a playlist url and return the id.
///
/// Seen url forms:
/// - `https://www.youtube.com/playlist?list=PLxxxx`
/// - `https://www.youtube.com/watch?v=xxxx&list=PLxxxx`
pub fn extract_playlist_id(input: &str) -> anyhow::Result<String> {
    let input = input.trim();
    if let Some(pos) = input.find("list=") {
        let rest = &input[pos + 5..];
        let end = rest.find('&').unwrap_or(rest.len());
        let id = &rest[..end];
        anyhow::ensure!(!id.is_empty(), "empty playlist id in url");
        return Ok(id.to_string());
    }
    anyhow::ensure!(
        !input.is_empty() && !input.contains('/'),
        "not a playlist id or playlist url: {input}"
    );
    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_playlist_url() {
        let id =
            extract_playlist_id("https://www.youtube.com/playlist?list=PLLhUn-idcYtxgo").unwrap();
        assert_eq!(id, "PLLhUn-idcYtxgo");
    }

    #[test]
    fn accepts_watch_url_with_list_param() {
        let id =
            extract_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc&index=2")
                .unwrap();
        assert_eq!(id, "PLabc");
    }

    #[test]
    fn accepts_bare_id() {
        assert_eq!(extract_playlist_id(" PLabc ").unwrap(), "PLabc");
    }

    #[test]
    fn rejects_url_without_list_param() {
        assert!(extract_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_err());
        assert!(extract_playlist_id("").is_err());
    }
}
