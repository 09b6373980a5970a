use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Caller-supplied platform API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Credential(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Same key without surrounding whitespace.
    pub fn trimmed(&self) -> Credential {
        Credential(self.0.trim().to_string())
    }

    /// Whether the key can travel in an HTTP header: visible ASCII only.
    pub fn is_sendable(&self) -> bool {
        self.0.bytes().all(|b| b.is_ascii_graphic())
    }

    /// Replaces every occurrence of the key inside `text`.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, "[REDACTED]")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Credential)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "shorts")]
    Short,
    #[serde(rename = "longform")]
    Long,
}

impl Category {
    pub fn parse(value: &str) -> Option<Category> {
        match value {
            "shorts" => Some(Category::Short),
            "longform" => Some(Category::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPeriod {
    #[default]
    All,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl UploadPeriod {
    pub fn parse(value: &str) -> Option<UploadPeriod> {
        match value {
            "all" => Some(UploadPeriod::All),
            "1month" => Some(UploadPeriod::OneMonth),
            "3months" => Some(UploadPeriod::ThreeMonths),
            "6months" => Some(UploadPeriod::SixMonths),
            "1year" => Some(UploadPeriod::OneYear),
            _ => None,
        }
    }

    /// Calendar months to look back; `None` means unbounded.
    pub fn months(&self) -> Option<u32> {
        match self {
            UploadPeriod::All => None,
            UploadPeriod::OneMonth => Some(1),
            UploadPeriod::ThreeMonths => Some(3),
            UploadPeriod::SixMonths => Some(6),
            UploadPeriod::OneYear => Some(12),
        }
    }
}

/// Raw request body. Every field is optional here so that a missing field
/// can be reported as such instead of as a shape error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub credential: Option<Credential>,
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub upload_period: Option<String>,
    pub min_view_count: Option<f64>,
    pub max_subscriber_count: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    pub min_view_count: Option<u64>,
    pub max_subscriber_count: Option<u64>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub credential: Credential,
    pub keyword: String,
    pub category: Category,
    pub upload_period: UploadPeriod,
    pub filters: Filters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetail {
    pub video_id: String,
    pub duration_encoded: String,
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetail {
    pub channel_id: String,
    pub subscriber_count: u64,
    pub total_video_count: u64,
    pub uploads_playlist_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreInfo {
    pub score: u8,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub view_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    pub subscriber_count: u64,
    pub total_video_count: u64,
    pub view_to_subscriber_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_to_subscriber_ratio: Option<f64>,
    pub duration_encoded: String,
    pub performance_score: ScoreInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution_score: Option<ScoreInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_average_views: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub videos: Vec<ResultRecord>,
    pub total: usize,
}

impl From<Vec<ResultRecord>> for SearchResponse {
    fn from(videos: Vec<ResultRecord>) -> Self {
        let total = videos.len();
        SearchResponse { videos, total }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
