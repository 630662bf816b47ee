use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtu\.be/|(?:youtube|youtube-nocookie)\.com/(?:watch\?v=|embed/|v/|.+\?v=))([^&=%\?/]{11})",
    )
    .expect("YouTube URL pattern is valid")
});

const YOUTUBE_HOSTS: &[&str] = &[
    "youtu.be",
    "www.youtu.be",
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
];

/// Pulls the 11 character video id out of a YouTube link.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();

    if let Some(id) = YOUTUBE_URL.captures(url).and_then(|c| c.get(1)) {
        return valid_id(id.as_str());
    }

    let parsed = if url.contains("://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("https://{}", url))
    }
    .ok()?;

    let host = parsed.host_str()?;
    if !YOUTUBE_HOSTS.contains(&host) {
        return None;
    }

    if host.ends_with("youtu.be") {
        return valid_id(parsed.path().trim_start_matches('/'));
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .and_then(|(_, id)| valid_id(&id))
}

fn valid_id(candidate: &str) -> Option<String> {
    let ok = candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then(|| candidate.to_string())
}

/// What we know about a video without asking YouTube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub watch_url: String,
}

impl VideoInfo {
    pub fn for_id(id: &str) -> Self {
        let prefix: String = id.chars().take(4).collect();
        Self {
            id: id.to_string(),
            title: format!("Video {}...", prefix),
            thumbnail_url: thumbnail_url(id),
            watch_url: watch_url(id),
        }
    }
}

pub fn thumbnail_url(id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/0.jpg", id)
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}
