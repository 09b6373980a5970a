pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::{create_cors, Settings};
use crate::services::youtube_client::YouTubeClient;
use rocket::{catchers, routes, Build, Rocket};

pub struct AppState {
    pub youtube: YouTubeClient,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let youtube = YouTubeClient::new(
            settings.api_base_url.clone(),
            &settings.region_code,
            &settings.relevance_language,
        );
        AppState { youtube, settings }
    }
}

pub fn build_rocket(settings: Settings) -> anyhow::Result<Rocket<Build>> {
    let cors = create_cors(&settings)?;

    Ok(rocket::build()
        .manage(AppState::new(settings))
        .mount("/api", routes![api::search_videos, api::health_check])
        .register(
            "/",
            catchers![
                api::bad_request,
                api::unprocessable,
                api::not_found,
                api::internal_error
            ],
        )
        .attach(cors))
}
