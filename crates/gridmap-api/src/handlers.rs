//! Route handler functions for all API endpoints.
//!
//! Each handler extracts query/path parameters via axum extractors,
//! interacts with AppState services, and returns JSON responses.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use gridmap_chat::{annotate, referenced_ids, render, ResolverMode, RenderNode, Segment};
use gridmap_core::{ChatMessage, Role, Station, Zone, ZoneFilter};
use gridmap_view::{Camera, Marker};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StationParams {
    pub q: Option<String>,
    /// `ALL` or a zone key such as `WEST`.
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupedParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub station_id: String,
    /// Client viewport width in pixels, used to collapse the sidebar on phones.
    pub viewport_width: Option<u32>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub assistant_mode: String,
    pub station_count: usize,
}

#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<Station>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ZoneGroupResponse {
    pub zone: Zone,
    pub label: &'static str,
    pub color: &'static str,
    pub count: usize,
    /// Whether the sidebar section is expanded.
    pub open: bool,
    pub stations: Vec<Station>,
}

#[derive(Debug, Serialize)]
pub struct GroupedResponse {
    pub groups: Vec<ZoneGroupResponse>,
    /// Set when a search term matched nothing.
    pub empty: bool,
}

/// A message plus its display nodes. Only model messages carry nodes.
#[derive(Debug, Serialize)]
pub struct RenderedMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<RenderNode>>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub session_id: Uuid,
    pub mode: ResolverMode,
    pub busy: bool,
    pub messages: Vec<RenderedMessage>,
}

#[derive(Debug, Serialize)]
pub struct AnnotateResponse {
    pub segments: Vec<Segment>,
    pub nodes: Vec<RenderNode>,
    pub station_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub station: Option<Station>,
    pub sidebar_open: bool,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub filter: ZoneFilter,
    pub open_sections: Vec<Zone>,
    pub sidebar_open: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkersResponse {
    pub filter: ZoneFilter,
    pub markers: Vec<Marker>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - liveness plus assistant mode.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        assistant_mode: state.chat.mode().to_string(),
        station_count: state.directory.len(),
    })
}

/// GET /stations - search by name/code and optionally restrict to one zone.
pub async fn list_stations(
    State(state): State<AppState>,
    Query(params): Query<StationParams>,
) -> Result<Json<StationsResponse>, ApiError> {
    let filter = match params.zone.as_deref() {
        Some(key) => ZoneFilter::from_key(key)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown zone: {}", key)))?,
        None => ZoneFilter::All,
    };

    let stations: Vec<Station> = state
        .directory
        .search(params.q.as_deref().unwrap_or_default())
        .into_iter()
        .filter(|s| filter == ZoneFilter::All || filter.is_zone(s.zone))
        .cloned()
        .collect();

    Ok(Json(StationsResponse {
        total: stations.len(),
        stations,
    }))
}

/// GET /stations/grouped - sidebar listing, one group per zone.
pub async fn grouped_stations(
    State(state): State<AppState>,
    Query(params): Query<GroupedParams>,
) -> Json<GroupedResponse> {
    let term = params.q.unwrap_or_default();
    let sidebar = state.workspace.sidebar();

    let groups: Vec<ZoneGroupResponse> = state
        .workspace
        .grouped(&term)
        .into_iter()
        .map(|group| ZoneGroupResponse {
            zone: group.zone,
            label: group.zone.label(),
            color: gridmap_view::map::zone_color(group.zone),
            count: group.stations.len(),
            open: sidebar.is_section_open(group.zone),
            stations: group.stations.into_iter().cloned().collect(),
        })
        .collect();

    Json(GroupedResponse {
        empty: groups.iter().all(|g| g.count == 0),
        groups,
    })
}

/// GET /stations/{id}
pub async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Station>, ApiError> {
    state
        .directory
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Station not found: {}", id)))
}

/// POST /chat - ask the assistant. Rejected with 409 while a query is pending.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<RenderedMessage>, ApiError> {
    let reply = state.chat.submit(&req.message).await?;
    Ok(Json(rendered(&state, reply)))
}

/// GET /chat/history
pub async fn chat_history(
    State(state): State<AppState>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
    let messages = state
        .chat
        .history()?
        .into_iter()
        .map(|message| rendered(&state, message))
        .collect();

    Ok(Json(ChatHistoryResponse {
        session_id: state.chat.id(),
        mode: state.chat.mode(),
        busy: state.chat.is_busy(),
        messages,
    }))
}

/// POST /annotate - split arbitrary reply text into segments and display nodes.
pub async fn annotate_text(
    State(state): State<AppState>,
    Json(req): Json<AnnotateRequest>,
) -> Json<AnnotateResponse> {
    let segments = annotate(&req.text);
    let nodes = render(&segments, &state.directory);
    let station_ids = referenced_ids(&segments)
        .into_iter()
        .map(String::from)
        .collect();
    Json(AnnotateResponse {
        segments,
        nodes,
        station_ids,
    })
}

/// GET /selection
pub async fn get_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(selection_response(&state))
}

/// POST /selection - select a station from the sidebar or a reply action.
pub async fn select_station(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SelectionResponse>, ApiError> {
    state
        .workspace
        .select_station(&req.station_id, req.viewport_width)?;
    Ok(Json(selection_response(&state)))
}

/// GET /filter
pub async fn get_filter(State(state): State<AppState>) -> Json<FilterResponse> {
    Json(filter_response(&state))
}

/// POST /sections/{zone}/toggle - expand or collapse a sidebar section.
pub async fn toggle_section(
    State(state): State<AppState>,
    Path(zone): Path<String>,
) -> Result<Json<FilterResponse>, ApiError> {
    let zone =
        Zone::from_key(&zone).ok_or_else(|| ApiError::NotFound(format!("Unknown zone: {}", zone)))?;
    state.workspace.toggle_section(zone);
    Ok(Json(filter_response(&state)))
}

/// POST /sidebar/toggle - open or collapse the sidebar panel.
pub async fn toggle_sidebar(State(state): State<AppState>) -> Json<SelectionResponse> {
    state.workspace.sidebar().toggle();
    Json(selection_response(&state))
}

/// GET /map/markers - marker styles for the current filter and selection.
pub async fn map_markers(State(state): State<AppState>) -> Json<MarkersResponse> {
    Json(MarkersResponse {
        filter: state.workspace.filter().current(),
        markers: state.workspace.markers(),
    })
}

/// GET /map/camera
pub async fn map_camera(State(state): State<AppState>) -> Json<Camera> {
    Json(state.workspace.camera())
}

/// GET /stream - SSE stream of map events.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event(event.name()).data(data)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "SSE subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// =============================================================================
// Helpers
// =============================================================================

fn rendered(state: &AppState, message: ChatMessage) -> RenderedMessage {
    let nodes = (message.role == Role::Model)
        .then(|| render(&annotate(&message.text), &state.directory));
    RenderedMessage { message, nodes }
}

fn selection_response(state: &AppState) -> SelectionResponse {
    SelectionResponse {
        station: state.workspace.selection().current(),
        sidebar_open: state.workspace.sidebar().is_open(),
    }
}

fn filter_response(state: &AppState) -> FilterResponse {
    let sidebar = state.workspace.sidebar();
    FilterResponse {
        filter: state.workspace.filter().current(),
        open_sections: sidebar.open_sections(),
        sidebar_open: sidebar.is_open(),
    }
}
