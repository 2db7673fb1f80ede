//! REST API handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use netree_core::{parse_device, DeviceId, DeviceUpdate, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::state::AppState;

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ApiError::new(msg))).into_response()
}

/// Unwrap an `{id}` path segment, answering `status` if it is not an integer
fn device_id(
    path: Result<Path<i64>, PathRejection>,
    status: StatusCode,
    msg: &str,
) -> Result<DeviceId, Response> {
    match path {
        Ok(Path(id)) => Ok(DeviceId(id)),
        Err(e) => {
            debug!(error = %e, "Rejected device path");
            Err(error_response(status, msg))
        }
    }
}

fn message(msg: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": msg }))
}

/// Get the whole tree, nested from the root
pub async fn get_tree(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tree = state.tree.read().await;
    match tree.get_tree() {
        Some(root) => Json(root).into_response(),
        None => Json(serde_json::json!({})).into_response(),
    }
}

/// List every device, each with its nested subtree
pub async fn list_devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tree = state.tree.read().await;
    Json(tree.list())
}

/// Get a specific device by ID
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match device_id(path, StatusCode::NOT_FOUND, "Device not found") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let tree = state.tree.read().await;
    match tree.view(id) {
        Some(device) => Json(device).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Device not found"),
    }
}

/// Add a new device
pub async fn add_device(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid device data: expected a JSON body");
    };

    let record = match parse_device(body) {
        Ok(record) => record,
        Err(e) => {
            debug!(error = %e, "Rejected device data");
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid device data: {}", e));
        }
    };

    let id = record.id;
    let mut tree = state.tree.write().await;
    match tree.add_node(record) {
        Ok(()) => {
            state.persist(&tree);
            info!(device = %id, "Device added");
            (StatusCode::CREATED, message("Device added")).into_response()
        }
        Err(e) => {
            debug!(device = %id, error = %e, "Add rejected");
            error_response(StatusCode::BAD_REQUEST, format!("Failed to add device: {}", e))
        }
    }
}

/// Update request body; every field is optional
///
/// A `null` or absent `parent_id` leaves the device where it is.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub parent_id: Option<DeviceId>,
    pub status: Option<String>,
}

impl UpdateDeviceRequest {
    /// Empty strings count as absent
    fn into_update(self) -> Result<DeviceUpdate, ValidationError> {
        Ok(DeviceUpdate {
            kind: self
                .kind
                .filter(|kind| !kind.is_empty())
                .map(|kind| kind.parse())
                .transpose()?,
            name: self.name,
            parent_id: self.parent_id,
            status: self
                .status
                .filter(|status| !status.is_empty())
                .map(|status| status.parse())
                .transpose()?,
        })
    }
}

/// Update a device's attributes or move it in the tree
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let id = match device_id(path, StatusCode::BAD_REQUEST, "Failed to update device: invalid id") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            debug!(device = %id, error = %e, "Rejected update body");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to update device: {}", e.body_text()),
            );
        }
    };

    let update = match req.into_update() {
        Ok(update) => update,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Failed to update device: {}", e))
        }
    };

    let mut tree = state.tree.write().await;
    match tree.update_node(id, update) {
        Ok(()) => {
            state.persist(&tree);
            info!(device = %id, "Device updated");
            message("Device updated").into_response()
        }
        Err(e) => {
            debug!(device = %id, error = %e, "Update rejected");
            error_response(StatusCode::BAD_REQUEST, format!("Failed to update device: {}", e))
        }
    }
}

/// Delete a device and its subtree
pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let id = match device_id(path, StatusCode::NOT_FOUND, "Device not found") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut tree = state.tree.write().await;
    match tree.delete_node(id) {
        Ok(removed) => {
            state.persist(&tree);
            info!(device = %id, removed, "Device deleted");
            message("Device deleted").into_response()
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, "Device not found"),
    }
}

/// Run a DFS or BFS traversal from the root
pub async fn traverse(
    State(state): State<Arc<AppState>>,
    Path(method): Path<String>,
) -> impl IntoResponse {
    let tree = state.tree.read().await;
    match method.to_lowercase().as_str() {
        "dfs" => Json(tree.dfs()).into_response(),
        "bfs" => Json(tree.bfs()).into_response(),
        _ => error_response(StatusCode::BAD_REQUEST, "Invalid traversal method"),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

/// Search devices by ID or name
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Query parameter required");
    };

    let tree = state.tree.read().await;
    Json(tree.search(&query)).into_response()
}
