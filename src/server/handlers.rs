//! Request handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, Endpoint};
use super::AppState;
use crate::asset::ImageAsset;
use crate::assets::ThemeDescriptor;
use crate::badge::{BadgeSet, BadgeStats, DEFAULT_STYLE};
use crate::compositor::{compose, RenderedImage};
use crate::error::FrameResult;
use crate::recommend::recommend;
use crate::request::{validate_identifier, LenientQuery, RenderQuery, RenderRequest};

const CACHE_CONTROL: &str = "public, max-age=3600";

// ============================================================================
// Rendering
// ============================================================================

/// Runs the compositor on the blocking pool.
async fn render(
    request: RenderRequest,
    avatar: ImageAsset,
    frame: Option<ImageAsset>,
) -> Result<FrameResult<RenderedImage>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || compose(&request, &avatar, frame.as_ref())).await
}

fn image_response(rendered: RenderedImage, filename: Option<String>) -> Response {
    let mut response = (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(rendered.content_type())),
            (header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
        ],
        rendered.bytes,
    )
        .into_response();

    if let Some(filename) = filename {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
            response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
    }
    response
}

/// `GET /api/framed-avatar/:identifier`
pub async fn framed_avatar(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Response, ApiError> {
    let endpoint = Endpoint::FramedAvatar;
    let request = query
        .into_request(&identifier)
        .map_err(|err| ApiError::from_frame(err, endpoint))?;

    // An unknown theme is reported before any upstream request is made.
    let frame = state
        .store
        .load_frame(&request.theme)
        .await
        .map_err(|err| ApiError::from_frame(err, endpoint))?;
    let avatar = state
        .github
        .fetch_avatar(&request.identifier, request.size, state.config.avatar_timeout())
        .await
        .map_err(|err| ApiError::from_frame(err, endpoint))?;

    let filename = request.filename();
    let (identifier, theme, size, format) =
        (request.identifier.clone(), request.theme.clone(), request.size, request.format);

    let rendered = render(request, avatar, Some(frame))
        .await
        .map_err(|err| ApiError::internal(endpoint, err))?
        .map_err(|err| ApiError::from_frame(err, endpoint))?;

    tracing::info!(%identifier, %theme, size, ?format, bytes = rendered.bytes.len(), "rendered framed avatar");
    Ok(image_response(rendered, Some(filename)))
}

/// `GET /api/frames`
///
/// Never fails because of the avatar or the theme: a missing avatar is
/// replaced by the fallback image, a missing theme skips the frame and a
/// failed render serves the fallback image as is.
pub async fn frames(
    State(state): State<AppState>,
    Query(query): Query<LenientQuery>,
) -> Result<Response, ApiError> {
    let endpoint = Endpoint::Frames;
    let request = query
        .into_request()
        .map_err(|err| ApiError::from_frame(err, endpoint))?;

    tracing::info!(identifier = %request.identifier, theme = %request.theme, size = request.size, "fetching avatar");

    let (frame, avatar) = tokio::join!(
        state.store.load_frame(&request.theme),
        state.github.fetch_avatar(
            &request.identifier,
            request.size,
            state.config.lenient_timeout()
        ),
    );

    let avatar = match avatar {
        Ok(avatar) => avatar,
        Err(err) => {
            tracing::warn!(identifier = %request.identifier, error = %err, "avatar fetch failed, using fallback");
            state
                .store
                .load_fallback()
                .await
                .map_err(|err| ApiError::from_frame(err, endpoint))?
        }
    };
    let frame = match frame {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(theme = %request.theme, error = %err, "frame unavailable, skipping");
            None
        }
    };

    let failure = match render(request, avatar, frame).await {
        Ok(Ok(rendered)) => return Ok(image_response(rendered, None)),
        Ok(Err(err)) => err.to_string(),
        Err(err) => err.to_string(),
    };

    tracing::warn!(error = %failure, "render failed, serving fallback image");
    let fallback = state
        .store
        .load_fallback()
        .await
        .map_err(|err| ApiError::from_frame(err, endpoint))?;
    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
        fallback.bytes().to_vec(),
    )
        .into_response())
}

// ============================================================================
// Profile endpoints
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartFrameResponse {
    pub username: String,
    pub recommended_frame: String,
    pub accent_color: String,
    pub emojis: Vec<String>,
    #[serde(rename = "previewURL")]
    pub preview_url: String,
}

/// `GET /api/smart-frame/:identifier`
pub async fn smart_frame(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<SmartFrameResponse>, ApiError> {
    let endpoint = Endpoint::SmartFrame;
    let username = validate_identifier(&identifier).map_err(|err| ApiError::from_frame(err, endpoint))?;

    let (profile, repos) = tokio::join!(
        state.github.fetch_profile(&username),
        state.github.fetch_repos_or_empty(&username),
    );
    let profile = profile.map_err(|err| ApiError::from_frame(err, endpoint))?;

    let recommendation = recommend(&profile, &repos);
    let preview_url = recommendation
        .preview_url(&state.config.public_base_url, &username)
        .ok_or_else(|| ApiError::internal(endpoint, "public base URL is not a valid base URL"))?;

    tracing::info!(%username, frame = %recommendation.recommended_frame, "recommended frame");
    Ok(Json(SmartFrameResponse {
        username,
        recommended_frame: recommendation.recommended_frame,
        accent_color: recommendation.accent_color,
        emojis: recommendation.emojis,
        preview_url: preview_url.to_string(),
    }))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgeQuery {
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeResponse {
    pub username: String,
    pub badges: BadgeSet,
    pub stats: BadgeStats,
}

/// `GET /api/badge/:identifier`
pub async fn badge(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(query): Query<BadgeQuery>,
) -> Result<Json<BadgeResponse>, ApiError> {
    let endpoint = Endpoint::Badge;
    let username = validate_identifier(&identifier).map_err(|err| ApiError::from_frame(err, endpoint))?;
    let style = query
        .style
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    let profile = state
        .github
        .fetch_profile(&username)
        .await
        .map_err(|err| ApiError::from_frame(err, endpoint))?;

    let badges = BadgeSet::build(&state.config.badge_base_url, &username, &style)
        .ok_or_else(|| ApiError::internal(endpoint, "badge base URL is not a valid base URL"))?;

    Ok(Json(BadgeResponse {
        username,
        badges,
        stats: BadgeStats::from(&profile),
    }))
}

// ============================================================================
// Service endpoints
// ============================================================================

/// `GET /api/themes`
pub async fn themes(State(state): State<AppState>) -> Result<Json<Vec<ThemeDescriptor>>, ApiError> {
    state
        .store
        .list_themes()
        .await
        .map(Json)
        .map_err(|err| ApiError::from_frame(err, Endpoint::Themes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
}

/// `GET /api/health`
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Any other `/api/*` path.
pub async fn api_not_found() -> ApiError {
    ApiError::not_found("API endpoint not found.")
}

/// Serves the entry document for paths with no static file behind them.
pub async fn spa_index(index: std::path::PathBuf) -> Response {
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => (StatusCode::OK, Html(html)).into_response(),
        Err(_) => ApiError::not_found("Page not found.").into_response(),
    }
}
