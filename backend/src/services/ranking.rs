use crate::models::{
    Category, ChannelDetail, Filters, ResultRecord, ScoreInfo, SearchItem, VideoDetail,
};
use crate::services::channel_average::ChannelAverageViews;
use crate::services::duration::matches_category;
use crate::utils::round_to;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_RESULT_BUDGET: usize = 30;

const TIERS: [(&str, &str); 5] = [
    ("Bad", "#ef4444"),
    ("Normal", "#f59e0b"),
    ("Good", "#22c55e"),
    ("Great", "#3b82f6"),
    ("Excellent", "#8b5cf6"),
];

fn score_info(score: u8) -> ScoreInfo {
    let (label, color) = TIERS[usize::from(score.clamp(1, 5)) - 1];
    ScoreInfo {
        score,
        label,
        color,
    }
}

/// Tier for views relative to subscribers.
pub fn performance_score(ratio: f64) -> ScoreInfo {
    let score = if ratio >= 5.0 {
        5
    } else if ratio >= 3.0 {
        4
    } else if ratio >= 1.0 {
        3
    } else if ratio >= 0.5 {
        2
    } else {
        1
    };
    score_info(score)
}

/// Tier for views relative to the channel's same-category average.
pub fn contribution_score(views: u64, channel_average: u64) -> Option<ScoreInfo> {
    if channel_average == 0 {
        return None;
    }
    let ratio = views as f64 / channel_average as f64;
    let score = if ratio >= 10.0 {
        5
    } else if ratio >= 5.0 {
        4
    } else if ratio >= 1.0 {
        3
    } else if ratio >= 0.5 {
        2
    } else {
        1
    };
    Some(score_info(score))
}

fn compare_ranked(a: &ResultRecord, b: &ResultRecord) -> Ordering {
    b.performance_score
        .score
        .cmp(&a.performance_score.score)
        .then_with(|| {
            b.view_to_subscriber_ratio
                .partial_cmp(&a.view_to_subscriber_ratio)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.view_count.cmp(&a.view_count))
        .then_with(|| a.video_id.cmp(&b.video_id))
}

/// Joins search hits with their details, drops everything the business rules
/// reject, scores the rest and returns at most `result_budget` records in rank
/// order.
pub fn build_ranked(
    search_items: &[SearchItem],
    video_details: &[VideoDetail],
    channel_details: &[ChannelDetail],
    category: Category,
    channel_averages: &ChannelAverageViews,
    filters: &Filters,
    result_budget: usize,
) -> Vec<ResultRecord> {
    let videos: HashMap<&str, &VideoDetail> = video_details
        .iter()
        .map(|detail| (detail.video_id.as_str(), detail))
        .collect();
    let channels: HashMap<&str, &ChannelDetail> = channel_details
        .iter()
        .map(|detail| (detail.channel_id.as_str(), detail))
        .collect();

    let mut records = Vec::new();
    for item in search_items {
        if records.len() >= result_budget {
            break;
        }

        let (Some(video), Some(channel)) = (
            videos.get(item.video_id.as_str()),
            channels.get(item.channel_id.as_str()),
        ) else {
            continue;
        };

        if !matches_category(&video.duration_encoded, category) {
            continue;
        }

        let subscribers = channel.subscriber_count;
        if subscribers == 0 {
            continue;
        }
        if filters
            .max_subscriber_count
            .is_some_and(|ceiling| subscribers > ceiling)
        {
            continue;
        }
        if video.view_count < subscribers {
            continue;
        }
        if filters
            .min_view_count
            .is_some_and(|floor| video.view_count < floor)
        {
            continue;
        }

        let view_ratio = round_to(video.view_count as f64 / subscribers as f64, 2);
        let like_ratio = video
            .like_count
            .map(|likes| round_to(likes as f64 / subscribers as f64, 4));
        let channel_average = channel_averages
            .get(&item.channel_id)
            .copied()
            .filter(|&avg| avg > 0);

        records.push(ResultRecord {
            video_id: item.video_id.clone(),
            title: item.title.clone(),
            thumbnail_url: item.thumbnail_url.clone(),
            channel_id: item.channel_id.clone(),
            channel_title: item.channel_title.clone(),
            published_at: item.published_at.clone(),
            view_count: video.view_count,
            like_count: video.like_count,
            subscriber_count: subscribers,
            total_video_count: channel.total_video_count,
            view_to_subscriber_ratio: view_ratio,
            like_to_subscriber_ratio: like_ratio,
            duration_encoded: video.duration_encoded.clone(),
            performance_score: performance_score(view_ratio),
            contribution_score: channel_average
                .and_then(|avg| contribution_score(video.view_count, avg)),
            channel_average_views: channel_average,
        });
    }

    records.sort_by(compare_ranked);
    records
}
