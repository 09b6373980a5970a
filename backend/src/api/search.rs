use crate::error::{ApiError, ApiResult};
use crate::models::{Category, Filters, SearchQuery, SearchRequest, SearchResponse, UploadPeriod};
use crate::services::pipeline::{run_search, PipelineOptions};
use crate::AppState;
use log::{error, info};
use rocket::serde::json::{self, Json};
use rocket::{post, State};

#[post("/search", data = "<request>")]
pub async fn search_videos(
    request: Result<Json<SearchRequest>, json::Error<'_>>,
    state: &State<AppState>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = request.map_err(|e| {
        // The raw body may hold the credential, so only the error kind is logged.
        match e {
            json::Error::Io(io) => info!("Rejected search body: {:?}", io.kind()),
            json::Error::Parse(_, parse) => {
                info!("Rejected search body: {:?}", parse.classify())
            }
        }
        ApiError::RequestMalformed("request body is not valid JSON for a search".to_string())
    })?;
    let query = validate_request(request.into_inner()).map_err(|e| {
        log_failure("Rejected search request", &e);
        e
    })?;

    info!(
        "Search request: keyword='{}' category={:?} period={:?}",
        query.keyword, query.category, query.upload_period
    );

    let options = PipelineOptions::from(&state.settings);
    match run_search(&state.youtube, &query, options, chrono::Utc::now()).await {
        Ok(records) => Ok(Json(SearchResponse::from(records))),
        Err(e) => {
            log_failure(&format!("Search for '{}' failed", query.keyword), &e);
            Err(e)
        }
    }
}

fn log_failure(context: &str, e: &ApiError) {
    if e.is_validation() {
        info!("{context}: {e}");
    } else {
        error!("{context}: {e}");
    }
}

/// Turns a raw body into a query, or the first validation error found.
pub fn validate_request(request: SearchRequest) -> ApiResult<SearchQuery> {
    let credential = request
        .credential
        .filter(|c| !c.is_blank())
        .ok_or_else(|| ApiError::InputMissing("credential".to_string()))?
        .trimmed();
    if !credential.is_sendable() {
        return Err(ApiError::InvalidCredential(
            "the key contains characters that cannot be sent".to_string(),
        ));
    }

    let keyword = request
        .keyword
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::InputMissing("keyword".to_string()))?;

    let category = match request.category.as_deref() {
        None => return Err(ApiError::InputMissing("category".to_string())),
        Some(raw) => Category::parse(raw).ok_or_else(|| {
            ApiError::RequestMalformed(format!(
                "category must be 'shorts' or 'longform', got '{raw}'"
            ))
        })?,
    };

    let upload_period = match request.upload_period.as_deref() {
        None => UploadPeriod::All,
        Some(raw) => UploadPeriod::parse(raw).ok_or_else(|| {
            ApiError::RequestMalformed(format!("unsupported uploadPeriod '{raw}'"))
        })?,
    };

    let filters = Filters {
        min_view_count: non_negative("minViewCount", request.min_view_count)?,
        max_subscriber_count: non_negative("maxSubscriberCount", request.max_subscriber_count)?,
    };

    Ok(SearchQuery {
        credential,
        keyword,
        category,
        upload_period,
        filters,
    })
}

/// JSON numbers such as `1e6` or `1000.0` are accepted when they hold a whole count.
fn non_negative(field: &str, value: Option<f64>) -> ApiResult<Option<u64>> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 => {
            Ok(Some(v as u64))
        }
        Some(_) => Err(ApiError::RequestMalformed(format!(
            "{field} must be a non-negative whole number"
        ))),
    }
}
