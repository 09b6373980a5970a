use crate::error::{ApiError, ApiResult};
use crate::models::{ChannelDetail, Credential, SearchItem, SearchPage, VideoDetail};
use crate::services::duration::DurationBucket;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use url::Url;

/// Most ids the platform accepts in one `videos`/`channels` lookup.
pub const MAX_IDS_PER_CALL: usize = 50;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];
const KEY_REASONS: &[&str] = &["keyInvalid", "keyExpired"];

/// Search parameters for one page of one duration bucket.
#[derive(Debug, Clone)]
pub struct SearchParams<'a> {
    pub keyword: &'a str,
    pub bucket: DurationBucket,
    pub max_results: usize,
    pub published_after: Option<&'a str>,
    pub page_token: Option<&'a str>,
}

/// Typed access to the platform's Data API. Holds no credential; each call
/// receives the caller's key.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: Url,
    region_code: String,
    relevance_language: String,
}

impl YouTubeClient {
    pub fn new(base_url: Url, region_code: &str, relevance_language: &str) -> Self {
        YouTubeClient {
            http: Client::new(),
            base_url,
            region_code: region_code.to_string(),
            relevance_language: relevance_language.to_string(),
        }
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/search/list
    pub async fn search(
        &self,
        credential: &Credential,
        params: &SearchParams<'_>,
    ) -> ApiResult<SearchPage> {
        let max_results = params.max_results.clamp(1, MAX_IDS_PER_CALL).to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("q", params.keyword),
            ("videoDuration", params.bucket.as_query_value()),
            ("videoEmbeddable", "true"),
            ("regionCode", self.region_code.as_str()),
            ("relevanceLanguage", self.relevance_language.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(after) = params.published_after {
            query.push(("publishedAfter", after));
        }
        if let Some(token) = params.page_token {
            query.push(("pageToken", token));
        }

        let response: SearchListResponse = self.get_json(credential, "search", &query).await?;
        let items = response
            .items
            .into_iter()
            .filter_map(SearchResource::into_item)
            .collect();

        Ok(SearchPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/videos
    pub async fn video_details(
        &self,
        credential: &Credential,
        ids: &[String],
    ) -> ApiResult<Vec<VideoDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        check_batch_size(ids.len())?;

        let joined = ids.join(",");
        let query = [("part", "contentDetails,statistics"), ("id", joined.as_str())];
        let response: ListResponse<VideoResource> =
            self.get_json(credential, "videos", &query).await?;

        Ok(response
            .items
            .into_iter()
            .map(VideoResource::into_detail)
            .collect())
    }

    pub async fn channel_details(
        &self,
        credential: &Credential,
        ids: &[String],
    ) -> ApiResult<Vec<ChannelDetail>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        check_batch_size(unique.len())?;

        let joined = unique.join(",");
        let query = [
            ("part", "statistics,contentDetails"),
            ("id", joined.as_str()),
        ];
        let response: ListResponse<ChannelResource> =
            self.get_json(credential, "channels", &query).await?;

        Ok(response
            .items
            .into_iter()
            .map(ChannelResource::into_detail)
            .collect())
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/playlistItems
    pub async fn playlist_items(
        &self,
        credential: &Credential,
        playlist_id: &str,
        max_results: usize,
    ) -> ApiResult<Vec<String>> {
        let max_results = max_results.clamp(1, MAX_IDS_PER_CALL).to_string();
        let query = [
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        let response: ListResponse<PlaylistItemResource> =
            self.get_json(credential, "playlistItems", &query).await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.content_details.and_then(|c| c.video_id))
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| ApiError::Unknown(format!("invalid endpoint {endpoint}: {e}")))?;
        debug!("GET {url}");

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, credential.expose())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let is_builder = e.is_builder();
                error!("Request to {endpoint} failed: {}", e.without_url());
                if is_builder {
                    // Only a key that is not a valid header value fails here.
                    ApiError::InvalidCredential(
                        "the key contains characters that cannot be sent".to_string(),
                    )
                } else {
                    ApiError::NetworkError
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Reading {endpoint} response failed: {}", e.without_url());
            ApiError::NetworkError
        })?;

        if !status.is_success() {
            let mapped = map_platform_error(status, &body, credential);
            error!("{endpoint} returned {status}: {mapped}");
            return Err(mapped);
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Could not decode {endpoint} response: {e}");
            ApiError::Unknown(format!("unexpected response from {endpoint}"))
        })
    }
}

fn check_batch_size(len: usize) -> ApiResult<()> {
    if len > MAX_IDS_PER_CALL {
        return Err(ApiError::RequestMalformed(format!(
            "at most {MAX_IDS_PER_CALL} ids per lookup, got {len}"
        )));
    }
    Ok(())
}

/// Maps a non-success platform response onto the error taxonomy.
pub fn map_platform_error(status: StatusCode, body: &str, credential: &Credential) -> ApiError {
    let payload = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);

    let (message, reasons) = match payload {
        Some(payload) => {
            let reasons: Vec<String> = payload
                .errors
                .into_iter()
                .filter_map(|detail| detail.reason)
                .collect();
            (payload.message.unwrap_or_default(), reasons)
        }
        None => (String::new(), Vec::new()),
    };

    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        credential.redact(&message)
    };

    let malformed_key =
        has_any_reason(&reasons, KEY_REASONS) || message.contains("API key not valid");

    match status {
        StatusCode::BAD_REQUEST => ApiError::InvalidCredential(message),
        _ if malformed_key => ApiError::InvalidCredential(message),
        StatusCode::FORBIDDEN if has_any_reason(&reasons, QUOTA_REASONS) => {
            ApiError::QuotaExceeded(message)
        }
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Unknown(message),
    }
}

fn has_any_reason(reasons: &[String], candidates: &[&str]) -> bool {
    reasons.iter().any(|r| candidates.contains(&r.as_str()))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResource {
    id: Option<SearchResourceId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchResource {
    fn into_item(self) -> Option<SearchItem> {
        let video_id = self.id?.video_id.filter(|id| !id.is_empty())?;
        let snippet = self.snippet.unwrap_or_default();
        let thumbnails = snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();

        Some(SearchItem {
            video_id,
            channel_id: snippet.channel_id,
            title: snippet.title,
            channel_title: snippet.channel_title,
            published_at: snippet.published_at,
            thumbnail_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    content_details: Option<VideoContentDetails>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    duration: Option<String>,
}

// The platform encodes counters as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
}

impl VideoResource {
    fn into_detail(self) -> VideoDetail {
        let statistics = self.statistics.unwrap_or_default();
        VideoDetail {
            video_id: self.id,
            duration_encoded: self
                .content_details
                .and_then(|c| c.duration)
                .unwrap_or_default(),
            view_count: parse_count(statistics.view_count.as_deref()).unwrap_or(0),
            like_count: parse_count(statistics.like_count.as_deref()),
            comment_count: parse_count(statistics.comment_count.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    id: String,
    statistics: Option<ChannelStatistics>,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

impl ChannelResource {
    fn into_detail(self) -> ChannelDetail {
        let statistics = self.statistics.unwrap_or_default();
        ChannelDetail {
            channel_id: self.id,
            // Hidden subscriber counts are absent and treated as zero.
            subscriber_count: parse_count(statistics.subscriber_count.as_deref()).unwrap_or(0),
            total_video_count: parse_count(statistics.video_count.as_deref()).unwrap_or(0),
            uploads_playlist_id: self
                .content_details
                .and_then(|c| c.related_playlists)
                .and_then(|p| p.uploads)
                .filter(|id| !id.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: Option<String>,
}
