use crate::config::Settings;
use crate::error::ApiResult;
use crate::models::{ChannelDetail, Credential, ResultRecord, SearchItem, SearchQuery, VideoDetail};
use crate::services::channel_average::estimate_channel_averages;
use crate::services::duration::{search_buckets_for, DurationBucket};
use crate::services::ranking::build_ranked;
use crate::services::youtube_client::{SearchParams, YouTubeClient, MAX_IDS_PER_CALL};
use crate::utils::published_after;
use chrono::{DateTime, Utc};
use futures::future::{try_join, try_join_all};
use log::info;
use std::collections::HashSet;

/// Knobs of a pipeline run, taken from [`Settings`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub page_budget: usize,
    pub page_size: usize,
    pub result_budget: usize,
    pub channel_sample_size: usize,
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        PipelineOptions {
            page_budget: settings.search_page_budget,
            page_size: settings.search_page_size,
            result_budget: settings.result_budget,
            channel_sample_size: settings.channel_sample_size,
        }
    }
}

/// Runs a full search: candidates, details, channel averages, ranking.
/// `now` anchors the upload-period lower bound.
pub async fn run_search(
    client: &YouTubeClient,
    query: &SearchQuery,
    options: PipelineOptions,
    now: DateTime<Utc>,
) -> ApiResult<Vec<ResultRecord>> {
    let credential = &query.credential;
    let published_after = published_after(query.upload_period, now);
    let buckets = search_buckets_for(query.category);

    let pages = try_join_all(buckets.iter().map(|&bucket| {
        search_bucket(
            client,
            credential,
            &query.keyword,
            bucket,
            published_after.as_deref(),
            options,
        )
    }))
    .await?;
    let candidates = dedupe_by_video_id(pages.into_iter().flatten());
    info!(
        "Search '{}' ({:?}) found {} unique candidates across {} bucket(s)",
        query.keyword,
        query.category,
        candidates.len(),
        buckets.len()
    );
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let video_ids: Vec<String> = candidates.iter().map(|c| c.video_id.clone()).collect();
    let channel_ids = unique_channel_ids(&candidates);

    let (videos, channels) = try_join(
        fetch_video_details(client, credential, &video_ids),
        fetch_channel_details(client, credential, &channel_ids),
    )
    .await?;
    info!(
        "Fetched details for {} videos and {} channels",
        videos.len(),
        channels.len()
    );

    let averages = estimate_channel_averages(
        client,
        credential,
        &channels,
        query.category,
        options.channel_sample_size,
    )
    .await;

    let records = build_ranked(
        &candidates,
        &videos,
        &channels,
        query.category,
        &averages,
        &query.filters,
        options.result_budget,
    );
    info!("Returning {} ranked results", records.len());
    Ok(records)
}

/// First page, then follow-up pages while a token comes back and the page
/// budget allows. Pages depend on each other, so this is sequential.
async fn search_bucket(
    client: &YouTubeClient,
    credential: &Credential,
    keyword: &str,
    bucket: DurationBucket,
    published_after: Option<&str>,
    options: PipelineOptions,
) -> ApiResult<Vec<SearchItem>> {
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    for _ in 0..options.page_budget.max(1) {
        let page = client
            .search(
                credential,
                &SearchParams {
                    keyword,
                    bucket,
                    max_results: options.page_size,
                    published_after,
                    page_token: page_token.as_deref(),
                },
            )
            .await?;
        items.extend(page.items);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(items)
}

fn dedupe_by_video_id(items: impl IntoIterator<Item = SearchItem>) -> Vec<SearchItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.video_id.clone()))
        .collect()
}

fn unique_channel_ids(items: &[SearchItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| !item.channel_id.is_empty())
        .filter(|item| seen.insert(item.channel_id.as_str()))
        .map(|item| item.channel_id.clone())
        .collect()
}

async fn fetch_video_details(
    client: &YouTubeClient,
    credential: &Credential,
    ids: &[String],
) -> ApiResult<Vec<VideoDetail>> {
    let chunks = try_join_all(
        ids.chunks(MAX_IDS_PER_CALL)
            .map(|chunk| client.video_details(credential, chunk)),
    )
    .await?;
    Ok(chunks.into_iter().flatten().collect())
}

async fn fetch_channel_details(
    client: &YouTubeClient,
    credential: &Credential,
    ids: &[String],
) -> ApiResult<Vec<ChannelDetail>> {
    let chunks = try_join_all(
        ids.chunks(MAX_IDS_PER_CALL)
            .map(|chunk| client.channel_details(credential, chunk)),
    )
    .await?;
    Ok(chunks.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{Category, Filters, UploadPeriod};
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YouTubeClient {
        let base = crate::config::parse_base_url(&server.uri()).unwrap();
        YouTubeClient::new(base, "KR", "ko")
    }

    fn query(category: Category) -> SearchQuery {
        SearchQuery {
            credential: Credential::new("k"),
            keyword: "cats".to_string(),
            category,
            upload_period: UploadPeriod::All,
            filters: Filters::default(),
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions::from(&Settings::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn search_hit(video_id: &str, channel_id: &str) -> serde_json::Value {
        json!({
            "id": { "videoId": video_id },
            "snippet": {
                "channelId": channel_id,
                "title": format!("title {video_id}"),
                "channelTitle": format!("channel {channel_id}"),
                "publishedAt": "2024-05-01T00:00:00Z",
                "thumbnails": { "high": { "url": format!("http://img/{video_id}.jpg") } }
            }
        })
    }

    fn video_json(video_id: &str, duration: &str, views: u64) -> serde_json::Value {
        json!({
            "id": video_id,
            "contentDetails": { "duration": duration },
            "statistics": { "viewCount": views.to_string() }
        })
    }

    fn channel_json(channel_id: &str, subscribers: u64, uploads: &str) -> serde_json::Value {
        json!({
            "id": channel_id,
            "statistics": { "subscriberCount": subscribers.to_string(), "videoCount": "10" },
            "contentDetails": { "relatedPlaylists": { "uploads": uploads } }
        })
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let item = |video_id: &str, title: &str| SearchItem {
            video_id: video_id.to_string(),
            channel_id: "c".to_string(),
            title: title.to_string(),
            channel_title: String::new(),
            published_at: String::new(),
            thumbnail_url: String::new(),
        };
        let deduped = dedupe_by_video_id(vec![item("a", "first"), item("b", "b"), item("a", "second")]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
    }

    #[tokio::test]
    async fn long_form_unions_buckets_and_follows_one_extra_page() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .and(query_param("videoDuration", "medium"))
            .and(query_param("pageToken", "NEXT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_hit("m2", "c1")],
                "nextPageToken": "IGNORED"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/search"))
            .and(query_param("videoDuration", "medium"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_hit("m1", "c1")],
                "nextPageToken": "NEXT"
            })))
            .mount(&server)
            .await;
        Mock::given(path("/search"))
            .and(query_param("videoDuration", "long"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_hit("l1", "c1"), search_hit("m1", "c1")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    video_json("m1", "PT5M", 100),
                    video_json("m2", "PT6M", 300),
                    video_json("l1", "PT1H", 600)
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [channel_json("c1", 100, "UU1")]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/playlistItems"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let records = run_search(&client_for(&server), &query(Category::Long), options(), now())
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "m2", "m1"]);
        assert!(records.iter().all(|r| r.contribution_score.is_none()));
    }

    #[tokio::test]
    async fn details_are_fetched_in_chunks_of_fifty() {
        let server = MockServer::start().await;
        let hits: Vec<_> = (0..60).map(|i| search_hit(&format!("v{i}"), "c1")).collect();
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": hits })))
            .mount(&server)
            .await;
        Mock::given(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let records = run_search(&client_for(&server), &query(Category::Short), options(), now())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn upload_period_sets_lower_bound() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .and(query_param("publishedAfter", "2024-03-01T00:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let mut query = query(Category::Short);
        query.upload_period = UploadPeriod::ThreeMonths;
        let records = run_search(&client_for(&server), &query, options(), now())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn failed_detail_batch_aborts_the_run() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_hit("v1", "c1")]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "quota", "errors": [{ "reason": "quotaExceeded" }] }
            })))
            .mount(&server)
            .await;
        Mock::given(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [channel_json("c1", 10, "UU1")]
            })))
            .mount(&server)
            .await;

        let err = run_search(&client_for(&server), &query(Category::Short), options(), now())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::QuotaExceeded("quota".to_string()));
    }

    #[tokio::test]
    async fn independent_channel_failures_keep_base_records() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_hit("v1", "c1"), search_hit("v2", "c2")]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/videos"))
            .and(query_param("id", "v1,v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [video_json("v1", "PT1M", 500), video_json("v2", "PT2M", 900)]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [channel_json("c1", 100, "UU1"), channel_json("c2", 100, "UU2")]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/playlistItems"))
            .and(query_param("playlistId", "UU1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/playlistItems"))
            .and(query_param("playlistId", "UU2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let records = run_search(&client_for(&server), &query(Category::Short), options(), now())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].video_id, "v2");
        for record in &records {
            assert!(record.contribution_score.is_none());
            assert!(record.channel_average_views.is_none());
        }
    }
}
