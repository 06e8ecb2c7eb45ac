//! Media link handler: one logical route per configured platform.

use super::MediaQuery;
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::extract;
use crate::runner::invoke_with_alternate;
use crate::types::MediaResponse;
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// GET /api/:platform - Resolve a post URL to a media download link
#[utoipa::path(
    get,
    path = "/api/{platform}",
    tag = "media",
    params(
        ("platform" = String, Path, description = "Platform name, e.g. tiktok"),
        ("url" = Option<String>, Query, description = "Post URL to resolve")
    ),
    responses(
        (status = 200, description = "Extracted media link and raw first record", body = MediaResponse),
        (status = 400, description = "No URL provided", body = crate::error::ApiError),
        (status = 404, description = "Unknown platform or no items returned", body = crate::error::ApiError),
        (status = 500, description = "Server misconfigured or invocation failed", body = crate::error::ApiError)
    )
)]
pub async fn fetch_media(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<MediaResponse>> {
    let outcome = resolve_media(&state, &platform, query).await;

    if let Err(e) = &outcome {
        let task = state
            .config
            .platform(&platform)
            .map(|p| p.task_id.to_string())
            .unwrap_or_default();
        tracing::error!(platform = %platform, task = %task, error = %e, "Media request failed");
    }

    outcome.map(Json)
}

async fn resolve_media(state: &AppState, platform: &str, query: MediaQuery) -> Result<MediaResponse> {
    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::InvalidInput("No URL provided".to_string()))?;

    let route = state
        .config
        .platform(platform)
        .ok_or_else(|| Error::UnknownPlatform(platform.to_string()))?;

    let token = state
        .config
        .runner
        .token
        .as_deref()
        .ok_or_else(|| Error::Config {
            message: "runner token not set".to_string(),
            key: Some("APIFY_TOKEN".to_string()),
        })?;

    let url = state.resolver.resolve(&url).await;

    let records = invoke_with_alternate(state.invoker.as_ref(), &route.task_id, token, &url)
        .await
        .map_err(|(task, source)| Error::Invocation {
            task: task.to_string(),
            source,
        })?;

    let extraction = extract::extract_media(records)?;

    tracing::info!(
        platform,
        task = %route.task_id,
        field = extraction.field.unwrap_or("none"),
        found = extraction.video.is_some(),
        "Media request served"
    );

    Ok(extraction.into())
}
