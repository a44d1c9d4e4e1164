//! In-process stand-in for the renaming backend.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
pub(crate) struct UploadedPart {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub(crate) struct MockState {
    hits: Arc<Mutex<HashMap<&'static str, usize>>>,
    failures: Arc<Mutex<HashMap<&'static str, (StatusCode, String)>>>,
    pub list_bodies: Arc<Mutex<Vec<Value>>>,
    pub rename_bodies: Arc<Mutex<Vec<Value>>>,
    pub download_selected_bodies: Arc<Mutex<Vec<Value>>>,
    pub download_all_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub open_folder_bodies: Arc<Mutex<Vec<Value>>>,
    pub uploads: Arc<Mutex<Vec<UploadedPart>>>,
    pub listing: Arc<Mutex<Value>>,
    pub rename_summary: Arc<Mutex<Value>>,
    pub pick_base_response: Arc<Mutex<Value>>,
}

pub(crate) fn listing_with(names: &[&str]) -> Value {
    let items: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            json!({
                "name": name,
                "url": format!("/api/image?path=Util/{name}"),
                "proposed": format!("UTIL_20240101_Lote01_Frontal_{:03}.jpg", index + 1),
            })
        })
        .collect();
    json!({
        "count": items.len(),
        "folder": "/srv/uploads/Util",
        "items": items,
    })
}

impl MockState {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            list_bodies: Arc::new(Mutex::new(Vec::new())),
            rename_bodies: Arc::new(Mutex::new(Vec::new())),
            download_selected_bodies: Arc::new(Mutex::new(Vec::new())),
            download_all_queries: Arc::new(Mutex::new(Vec::new())),
            open_folder_bodies: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            listing: Arc::new(Mutex::new(listing_with(&["a.jpg", "b.jpg", "c.jpg"]))),
            rename_summary: Arc::new(Mutex::new(
                json!({ "renamed": 2, "skipped": 1, "errors": 0 }),
            )),
            pick_base_response: Arc::new(Mutex::new(json!({ "ok": true, "base": "/data/dataset" }))),
        }
    }

    pub async fn hits(&self, endpoint: &'static str) -> usize {
        self.hits.lock().await.get(endpoint).copied().unwrap_or(0)
    }

    pub async fn total_hits(&self) -> usize {
        self.hits.lock().await.values().sum()
    }

    pub async fn fail(&self, endpoint: &'static str, status: StatusCode, body: &str) {
        self.failures
            .lock()
            .await
            .insert(endpoint, (status, body.to_string()));
    }

    pub async fn set_listing(&self, listing: Value) {
        *self.listing.lock().await = listing;
    }

    async fn enter(&self, endpoint: &'static str) -> Option<Response> {
        *self.hits.lock().await.entry(endpoint).or_insert(0) += 1;
        self.failures
            .lock()
            .await
            .get(endpoint)
            .cloned()
            .map(|(status, body)| (status, body).into_response())
    }
}

async fn handle_upload(State(state): State<MockState>, mut multipart: Multipart) -> Response {
    if let Some(failure) = state.enter("upload").await {
        return failure;
    }

    let mut folder = String::new();
    let mut saved = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default().to_vec();

        if field_name == "subcarpeta" {
            folder = String::from_utf8_lossy(&bytes).into_owned();
        } else if let Some(name) = &file_name {
            saved.push(json!({ "name": name, "rel_path": format!("Util/{name}") }));
        }
        state.uploads.lock().await.push(UploadedPart {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    Json(json!({ "ok": true, "folder": format!("/srv/uploads/{folder}"), "saved": saved }))
        .into_response()
}

async fn handle_list(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.enter("list").await {
        return failure;
    }
    state.list_bodies.lock().await.push(body);
    Json(state.listing.lock().await.clone()).into_response()
}

async fn handle_rename(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.enter("rename-selected").await {
        return failure;
    }
    state.rename_bodies.lock().await.push(body);
    Json(state.rename_summary.lock().await.clone()).into_response()
}

async fn handle_download_selected(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.enter("download-selected").await {
        return failure;
    }
    state.download_selected_bodies.lock().await.push(body);
    (
        [(header::CONTENT_TYPE, "application/zip")],
        b"PK\x03\x04selected".to_vec(),
    )
        .into_response()
}

async fn handle_download_all(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(failure) = state.enter("download-all").await {
        return failure;
    }
    state.download_all_queries.lock().await.push(query);
    (
        [(header::CONTENT_TYPE, "application/zip")],
        b"PK\x03\x04all".to_vec(),
    )
        .into_response()
}

async fn handle_pick_base(State(state): State<MockState>, Json(_body): Json<Value>) -> Response {
    if let Some(failure) = state.enter("pick-base").await {
        return failure;
    }
    Json(state.pick_base_response.lock().await.clone()).into_response()
}

async fn handle_open_folder(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.enter("open-folder").await {
        return failure;
    }
    state.open_folder_bodies.lock().await.push(body);
    Json(json!({ "ok": true })).into_response()
}

pub(crate) async fn spawn_backend(state: MockState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/list", post(handle_list))
        .route("/api/rename-selected", post(handle_rename))
        .route("/api/download-selected", post(handle_download_selected))
        .route("/api/download-all", get(handle_download_all))
        .route("/api/pick-base", post(handle_pick_base))
        .route("/api/open-folder", post(handle_open_folder))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Address nothing listens on, for transport failures.
pub(crate) async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
