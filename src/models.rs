//! Payload shapes returned by Invidious instances and by the instance
//! directory. These are plain data-transfer records: every field defaults
//! when the upstream omits it or sends `null`, and unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads an optional value and falls back to `T::default()` on `null`.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Video {
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub video_type: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub video_id: String,
    #[serde(deserialize_with = "nullable")]
    pub video_thumbnails: Vec<Thumbnail>,
    #[serde(deserialize_with = "nullable")]
    pub storyboards: Vec<Storyboard>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub description_html: String,
    #[serde(deserialize_with = "nullable")]
    pub published: i64,
    #[serde(deserialize_with = "nullable")]
    pub published_text: String,
    #[serde(deserialize_with = "nullable")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub view_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub like_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub dislike_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub paid: bool,
    #[serde(deserialize_with = "nullable")]
    pub premium: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_family_friendly: bool,
    #[serde(deserialize_with = "nullable")]
    pub allowed_regions: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub genre: String,
    pub genre_url: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub author: String,
    #[serde(deserialize_with = "nullable")]
    pub author_id: String,
    #[serde(deserialize_with = "nullable")]
    pub author_url: String,
    #[serde(deserialize_with = "nullable")]
    pub author_verified: bool,
    #[serde(deserialize_with = "nullable")]
    pub author_thumbnails: Vec<Thumbnail>,
    #[serde(deserialize_with = "nullable")]
    pub sub_count_text: String,
    #[serde(deserialize_with = "nullable")]
    pub length_seconds: i64,
    #[serde(deserialize_with = "nullable")]
    pub allow_ratings: bool,
    #[serde(deserialize_with = "nullable")]
    pub rating: f64,
    #[serde(deserialize_with = "nullable")]
    pub is_listed: bool,
    #[serde(deserialize_with = "nullable")]
    pub live_now: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_post_live_dvr: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_upcoming: bool,
    #[serde(deserialize_with = "nullable")]
    pub dash_url: String,
    #[serde(deserialize_with = "nullable")]
    pub adaptive_formats: Vec<Format>,
    #[serde(deserialize_with = "nullable")]
    pub format_streams: Vec<Format>,
    #[serde(deserialize_with = "nullable")]
    pub captions: Vec<Captions>,
    #[serde(deserialize_with = "nullable")]
    pub recommended_videos: Vec<RecommendedVideo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Format {
    pub init: Option<String>,
    pub index: Option<String>,
    pub bitrate: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub itag: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub format_type: String,
    pub clen: Option<String>,
    pub lmt: Option<String>,
    pub projection_type: Option<String>,
    pub container: Option<String>,
    pub encoding: Option<String>,
    pub audio_quality: Option<String>,
    pub audio_sample_rate: Option<u32>,
    pub audio_channels: Option<u32>,
    pub quality: Option<String>,
    pub fps: Option<u32>,
    pub size: Option<String>,
    pub resolution: Option<String>,
    pub quality_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Captions {
    #[serde(deserialize_with = "nullable")]
    pub label: String,
    #[serde(deserialize_with = "nullable")]
    pub language_code: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thumbnail {
    pub quality: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub width: u32,
    #[serde(deserialize_with = "nullable")]
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Storyboard {
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub template_url: String,
    #[serde(deserialize_with = "nullable")]
    pub width: u32,
    #[serde(deserialize_with = "nullable")]
    pub height: u32,
    #[serde(deserialize_with = "nullable")]
    pub count: u32,
    #[serde(deserialize_with = "nullable")]
    pub interval: u32,
    #[serde(deserialize_with = "nullable")]
    pub storyboard_width: u32,
    #[serde(deserialize_with = "nullable")]
    pub storyboard_height: u32,
    #[serde(deserialize_with = "nullable")]
    pub storyboard_count: u32,
}

/// Entry of `recommendedVideos`; a trimmed-down video.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendedVideo {
    #[serde(deserialize_with = "nullable")]
    pub video_id: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub video_thumbnails: Vec<Thumbnail>,
    #[serde(deserialize_with = "nullable")]
    pub author: String,
    #[serde(deserialize_with = "nullable")]
    pub author_id: String,
    #[serde(deserialize_with = "nullable")]
    pub author_url: String,
    #[serde(deserialize_with = "nullable")]
    pub author_verified: bool,
    #[serde(deserialize_with = "nullable")]
    pub length_seconds: i64,
    #[serde(deserialize_with = "nullable")]
    pub view_count_text: String,
    #[serde(deserialize_with = "nullable")]
    pub view_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResult {
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub result_type: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub video_id: String,
    #[serde(deserialize_with = "nullable")]
    pub author: String,
    #[serde(deserialize_with = "nullable")]
    pub author_id: String,
    #[serde(deserialize_with = "nullable")]
    pub author_url: String,
    #[serde(deserialize_with = "nullable")]
    pub author_verified: bool,
    #[serde(deserialize_with = "nullable")]
    pub video_thumbnails: Vec<Thumbnail>,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub description_html: String,
    #[serde(deserialize_with = "nullable")]
    pub view_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub view_count_text: String,
    #[serde(deserialize_with = "nullable")]
    pub published: i64,
    #[serde(deserialize_with = "nullable")]
    pub published_text: String,
    #[serde(deserialize_with = "nullable")]
    pub length_seconds: i64,
    #[serde(deserialize_with = "nullable")]
    pub live_now: bool,
    #[serde(deserialize_with = "nullable")]
    pub premium: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_upcoming: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_new: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_4k: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_8k: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_vr180: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_vr360: bool,
    #[serde(deserialize_with = "nullable")]
    pub is_3d: bool,
    #[serde(deserialize_with = "nullable")]
    pub has_captions: bool,
}

// Instance directory

/// Second element of each `[host, detail]` pair in the directory listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceDetail {
    pub flag: Option<String>,
    pub region: Option<String>,
    pub stats: Option<InstanceStats>,
    pub cors: Option<bool>,
    pub api: Option<bool>,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub instance_type: String,
    #[serde(deserialize_with = "nullable")]
    pub uri: String,
    pub monitor: Option<Monitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceStats {
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub software: Software,
    #[serde(deserialize_with = "nullable")]
    pub usage: Usage,
    #[serde(deserialize_with = "nullable")]
    pub metadata: StatsMetadata,
    pub playback: Option<Playback>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Software {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
    #[serde(deserialize_with = "nullable")]
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Usage {
    #[serde(deserialize_with = "nullable")]
    pub users: Users,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Users {
    #[serde(deserialize_with = "nullable")]
    pub total: i64,
    #[serde(rename = "activeHalfyear", deserialize_with = "nullable")]
    pub active_half_year: i64,
    #[serde(deserialize_with = "nullable")]
    pub active_month: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsMetadata {
    #[serde(deserialize_with = "nullable")]
    pub updated_at: i64,
    #[serde(deserialize_with = "nullable")]
    pub last_channel_refreshed_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Playback {
    pub total_requests: Option<i64>,
    pub successful_requests: Option<i64>,
    pub ratio: Option<f64>,
}

/// Uptime monitor attached to a directory record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Monitor {
    pub url: Option<String>,
    pub alias: Option<String>,
    pub last_status: Option<i64>,
    pub uptime: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub down: bool,
    pub down_since: Option<DateTime<Utc>>,
    pub up_since: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub period: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub enabled: bool,
    pub last_check_at: Option<DateTime<Utc>>,
    pub next_check_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_tolerates_missing_and_unknown_fields() {
        let video: Video = serde_json::from_str(
            r#"{
                "videoId": "qRY0m96ESZU",
                "title": "test",
                "isPostLiveDvr": true,
                "somethingNew": [1, 2, 3],
                "adaptiveFormats": [{"url": "https://x/videoplayback?expire=1", "type": "audio/mp4", "bitrate": "128000"}]
            }"#,
        )
        .unwrap();

        assert_eq!(video.video_id, "qRY0m96ESZU");
        assert!(video.is_post_live_dvr);
        assert_eq!(video.adaptive_formats.len(), 1);
        assert_eq!(video.adaptive_formats[0].format_type, "audio/mp4");
        assert!(video.captions.is_empty());
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let video: Video = serde_json::from_str(
            r#"{
                "videoId": "abc",
                "subCountText": null,
                "genre": null,
                "viewCount": null,
                "isListed": null,
                "keywords": null,
                "adaptiveFormats": [{"url": "https://x/videoplayback?expire=1", "itag": null}],
                "authorThumbnails": [{"url": "https://x/a.jpg", "width": null}]
            }"#,
        )
        .unwrap();

        assert_eq!(video.video_id, "abc");
        assert_eq!(video.sub_count_text, "");
        assert_eq!(video.view_count, 0);
        assert!(video.keywords.is_empty());
        assert_eq!(video.adaptive_formats[0].itag, "");
        assert_eq!(video.author_thumbnails[0].width, 0);

        let result: SearchResult = serde_json::from_str(
            r#"{"type": "channel", "title": null, "viewCount": null, "videoThumbnails": null}"#,
        )
        .unwrap();
        assert_eq!(result.result_type, "channel");
        assert_eq!(result.title, "");
        assert!(result.video_thumbnails.is_empty());
    }

    #[test]
    fn test_search_result_flag_names() {
        let result: SearchResult = serde_json::from_str(
            r#"{"type": "video", "videoId": "abc", "is4k": true, "isVr180": true, "is3d": true}"#,
        )
        .unwrap();

        assert_eq!(result.result_type, "video");
        assert!(result.is_4k && result.is_vr180 && result.is_3d);
        assert!(!result.is_8k);
    }

    #[test]
    fn test_instance_detail_keeps_api_flag_tristate() {
        let detail: InstanceDetail =
            serde_json::from_str(r#"{"type": "https", "uri": "https://a.example", "api": null}"#)
                .unwrap();
        assert_eq!(detail.api, None);
        assert_eq!(detail.instance_type, "https");
    }
}
