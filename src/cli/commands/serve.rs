//! HTTP API server.
//!
//! Serves the query and catalog endpoints, plus the static frontend when
//! `server.frontend_dir` exists.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::course::Source;
use crate::orchestrator::RagSystem;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub rag: RagSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    load_docs: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let docs_dir = settings.docs_dir();
    let frontend_dir = settings.frontend_dir();

    let rag = RagSystem::new(settings)?;

    if load_docs {
        if docs_dir.is_dir() {
            let spinner = Output::spinner(&format!("Loading courses from {}...", docs_dir.display()));
            let summary = rag.add_course_folder(&docs_dir, false).await;
            spinner.finish_and_clear();
            match summary {
                Ok(s) => Output::success(&format!(
                    "Loaded {} courses with {} chunks ({} already indexed)",
                    s.courses, s.chunks, s.skipped
                )),
                Err(e) => Output::warning(&format!("Could not load course documents: {}", e)),
            }
        } else {
            warn!("Docs folder {} not found, skipping startup load", docs_dir.display());
        }
    }

    let frontend = frontend_dir.is_dir().then_some(frontend_dir.as_path());
    if let Some(dir) = frontend {
        info!("Serving frontend from {}", dir.display());
    }
    let app = router(Arc::new(AppState { rag }), frontend);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Lectern API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Query", "POST   /api/query");
    Output::kv("Courses", "GET    /api/courses");
    Output::kv("Clear session", "DELETE /api/sessions/{id}");
    Output::kv("Health", "GET    /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router. Unmatched paths are served from `frontend_dir`
/// when given, otherwise answered with a JSON 404.
pub fn router(state: Arc<AppState>, frontend_dir: Option<&std::path::Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/sessions/{session_id}", delete(clear_session));

    let api = match frontend_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.fallback(not_found),
    };

    api.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceInfo>,
    session_id: String,
}

#[derive(Serialize)]
struct SourceInfo {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

impl From<Source> for SourceInfo {
    fn from(source: Source) -> Self {
        Self {
            text: source.label,
            link: source.link,
        }
    }
}

#[derive(Serialize)]
struct CourseStats {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn internal_error(e: impl std::fmt::Display) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> impl IntoResponse {
    match state.rag.query(&req.query, req.session_id.as_deref()).await {
        Ok(answer) => Json(QueryResponse {
            answer: answer.answer,
            sources: answer.sources.into_iter().map(SourceInfo::from).collect(),
            session_id: answer.session_id,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.rag.course_analytics().await {
        Ok(analytics) => Json(CourseStats {
            total_courses: analytics.total_courses,
            course_titles: analytics.course_titles,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.rag.session_manager().clear_session(&session_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            detail: "Not Found".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::error::LecternError;
    use crate::llm::ChatResponse;
    use crate::test_support::{tool_call, HashEmbedder, ScriptedChatModel, MCP_COURSE};
    use crate::vector_store::MemoryVectorStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(model: ScriptedChatModel) -> (Router, Arc<AppState>) {
        let rag = RagSystem::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(HashEmbedder::default()),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(model),
        );
        let state = Arc::new(AppState { rag });
        (router(state.clone(), None), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app_with(ScriptedChatModel::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_query_creates_session() {
        let (app, _) = app_with(ScriptedChatModel::new(vec![ChatResponse::text("An answer")]));
        let response = app
            .oneshot(post_json("/api/query", json!({"query": "What is MCP?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "An answer");
        assert_eq!(body["sources"], json!([]));
        assert!(!body["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_keeps_given_session_and_returns_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("mcp.txt"), MCP_COURSE).unwrap();

        let (app, state) = app_with(ScriptedChatModel::new(vec![
            tool_call("call_1", "search_course_content", json!({"query": "tools", "lesson_number": 1})),
            ChatResponse::text("Servers expose tools."),
        ]));
        state.rag.add_course_folder(dir.path(), false).await.unwrap();

        let response = app
            .oneshot(post_json(
                "/api/query",
                json!({"query": "What do servers expose?", "session_id": "session_1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["session_id"], "session_1");
        assert_eq!(
            body["sources"],
            json!([{"text": "Introduction to MCP Servers - Lesson 1", "link": "https://example.com/mcp/1"}])
        );
        assert_eq!(state.rag.session_manager().history("session_1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_missing_field_is_rejected() {
        let (app, _) = app_with(ScriptedChatModel::default());
        let response = app
            .oneshot(post_json("/api/query", json!({"session_id": "x"})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_query_error_is_500_with_detail() {
        let (app, _) = app_with(ScriptedChatModel::failing(LecternError::OpenAI(
            "RAG system error".to_string(),
        )));
        let response = app
            .oneshot(post_json("/api/query", json!({"query": "q"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("RAG system error"));
    }

    #[tokio::test]
    async fn test_courses() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("mcp.txt"), MCP_COURSE).unwrap();
        let (app, state) = app_with(ScriptedChatModel::default());
        state.rag.add_course_folder(dir.path(), false).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/api/courses").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"total_courses": 1, "course_titles": ["Introduction to MCP Servers"]})
        );
    }

    #[tokio::test]
    async fn test_clear_session() {
        let (app, state) = app_with(ScriptedChatModel::default());
        state
            .rag
            .session_manager()
            .add_exchange("s1", "q", "a")
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/sessions/s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.rag.session_manager().history("s1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frontend_dir_is_served() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Lectern</h1>").unwrap();

        let rag = RagSystem::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(HashEmbedder::default()),
            Arc::new(MemoryVectorStore::new()),
            Arc::new(ScriptedChatModel::default()),
        );
        let app = router(Arc::new(AppState { rag }), Some(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Lectern</h1>");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _) = app_with(ScriptedChatModel::default());
        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "Not Found");
    }
}
