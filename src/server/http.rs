use crate::app::dto::*;
use crate::app::engine::XrefEngine;
use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct HttpState {
    pub engine: XrefEngine,
}

#[derive(Debug, Clone, Deserialize)]
struct DiagnosticsQuery {
    #[serde(default)]
    resource: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct XrefQuery {
    project: String,
    element: String,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ApiErrorBody {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> impl IntoResponse {
    (status, Json(ApiErrorBody { error: msg.into() }))
}

pub fn build_router(engine: XrefEngine) -> Router {
    let state = Arc::new(HttpState { engine });

    Router::new()
        .route("/health", get(health))
        .route("/changes", post(changes))
        .route("/model/{project}", get(model))
        .route("/diagnostics", get(diagnostics))
        .route("/xref", get(xref))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(engine: XrefEngine, addr: SocketAddr) -> Result<()> {
    let app = build_router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(state.engine.health())
}

async fn changes(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SubmitChangesRequest>,
) -> impl IntoResponse {
    let wait = req.wait;
    match state.engine.submit_changes(req).await {
        Ok(res) if wait => Json(res).into_response(),
        Ok(res) => (StatusCode::ACCEPTED, Json(res)).into_response(),
        Err(e) => api_error(StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn model(
    State(state): State<Arc<HttpState>>,
    Path(project): Path<String>,
) -> impl IntoResponse {
    Json(state.engine.model(&project))
}

async fn diagnostics(
    State(state): State<Arc<HttpState>>,
    Query(q): Query<DiagnosticsQuery>,
) -> impl IntoResponse {
    Json(state.engine.diagnostics(q.resource.as_deref()))
}

async fn xref(State(state): State<Arc<HttpState>>, Query(q): Query<XrefQuery>) -> impl IntoResponse {
    let req = XrefRequest {
        project: q.project,
        element: q.element,
    };
    match state.engine.xref(req) {
        Ok(res) => Json(res).into_response(),
        Err(e) => api_error(StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}
