pub mod channel_average;
pub mod duration;
pub mod pipeline;
pub mod ranking;
pub mod youtube_client;
