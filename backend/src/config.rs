use anyhow::{Context, Result};
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, warn, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

lazy_static! {
    pub static ref SETTINGS: Settings = Settings::from_env();
}

/// Process-wide, non-secret settings. The platform credential is never part
/// of this; it travels with each request.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: Url,
    pub region_code: String,
    pub relevance_language: String,
    pub search_page_budget: usize,
    pub search_page_size: usize,
    pub result_budget: usize,
    pub channel_sample_size: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base url is valid"),
            region_code: "KR".to_string(),
            relevance_language: "ko".to_string(),
            search_page_budget: 2,
            search_page_size: 50,
            result_budget: 30,
            channel_sample_size: 50,
            cors_allowed_origins: vec!["http://localhost:8080".to_string()],
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();

        let api_base_url = match env::var("YOUTUBE_API_BASE_URL") {
            Ok(raw) => parse_base_url(&raw).unwrap_or_else(|e| {
                warn!("Ignoring YOUTUBE_API_BASE_URL: {e:#}");
                defaults.api_base_url.clone()
            }),
            Err(_) => defaults.api_base_url.clone(),
        };

        Settings {
            api_base_url,
            region_code: env::var("YOUTUBE_REGION_CODE").unwrap_or(defaults.region_code),
            relevance_language: env::var("YOUTUBE_RELEVANCE_LANGUAGE")
                .unwrap_or(defaults.relevance_language),
            search_page_budget: env_or("SEARCH_PAGE_BUDGET", defaults.search_page_budget)
                .clamp(1, 5),
            search_page_size: env_or("SEARCH_PAGE_SIZE", defaults.search_page_size).clamp(1, 50),
            result_budget: env_or("RESULT_BUDGET", defaults.result_budget).max(1),
            channel_sample_size: env_or("CHANNEL_SAMPLE_SIZE", defaults.channel_sample_size)
                .clamp(1, 50),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.cors_allowed_origins),
        }
    }
}

/// Endpoint paths are joined onto the base, so it must end with a slash.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("invalid base url {raw}"))
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Could not parse {key}={raw}, using default {default}");
            default
        }),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

pub fn init_logger() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| LevelFilter::from_str(&raw).ok())
        .unwrap_or(LevelFilter::Info);
    Builder::new().filter_level(level).init();
    info!("Starting videoscout backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_cors(settings: &Settings) -> Result<rocket_cors::Cors> {
    let origins: Vec<&str> = settings
        .cors_allowed_origins
        .iter()
        .map(String::as_str)
        .collect();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&origins))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
