use crate::error::ApiResult;
use crate::models::{Category, ChannelDetail, Credential};
use crate::services::duration::matches_category;
use crate::services::youtube_client::YouTubeClient;
use futures::future::join_all;
use log::{info, warn};
use std::collections::HashMap;

/// channelId -> mean views of recent same-category uploads. A missing entry
/// means the average is unknown.
pub type ChannelAverageViews = HashMap<String, u64>;

/// Samples the most recent uploads of a playlist and averages the view count
/// of those that match `category`. `Ok(None)` when nothing usable was found.
pub async fn estimate_channel_average(
    client: &YouTubeClient,
    credential: &Credential,
    uploads_playlist_id: &str,
    category: Category,
    sample_size: usize,
) -> ApiResult<Option<u64>> {
    let video_ids = client
        .playlist_items(credential, uploads_playlist_id, sample_size)
        .await?;
    if video_ids.is_empty() {
        return Ok(None);
    }

    let details = client.video_details(credential, &video_ids).await?;
    let views: Vec<u64> = details
        .iter()
        .filter(|detail| matches_category(&detail.duration_encoded, category))
        .map(|detail| detail.view_count)
        .collect();

    Ok(mean_rounded(&views))
}

fn mean_rounded(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let total: u128 = values.iter().map(|&v| v as u128).sum();
    Some((total as f64 / values.len() as f64).round() as u64)
}

/// Estimates averages for every channel with an uploads playlist, all at
/// once. A failing channel is logged and left out of the map.
pub async fn estimate_channel_averages(
    client: &YouTubeClient,
    credential: &Credential,
    channels: &[ChannelDetail],
    category: Category,
    sample_size: usize,
) -> ChannelAverageViews {
    let candidates: Vec<(&str, &str)> = channels
        .iter()
        .filter(|channel| channel.subscriber_count > 0)
        .filter_map(|channel| {
            channel
                .uploads_playlist_id
                .as_deref()
                .map(|playlist| (channel.channel_id.as_str(), playlist))
        })
        .collect();

    let estimates = join_all(candidates.iter().map(|&(channel_id, playlist_id)| async move {
        let outcome =
            estimate_channel_average(client, credential, playlist_id, category, sample_size).await;
        (channel_id, outcome)
    }))
    .await;

    let mut averages = ChannelAverageViews::new();
    for (channel_id, outcome) in estimates {
        match outcome {
            Ok(Some(average)) => {
                averages.insert(channel_id.to_string(), average);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Channel average unavailable for {channel_id}: {e}");
            }
        }
    }

    info!(
        "Estimated channel averages for {}/{} channels",
        averages.len(),
        candidates.len()
    );
    averages
}
