//! Session lifecycle endpoints: start, point reads, ordered listings,
//! completion, and the per-agent session index.

use actix_web::{web, HttpResponse, Responder};

use crate::models::{CompleteSessionRequest, StartSessionRequest};
use crate::AppState;

async fn start_session(
    data: web::Data<AppState>,
    body: web::Json<StartSessionRequest>,
) -> impl Responder {
    match data.watcher.start_session(&body.agent_id, &body.user_query) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => {
            log::error!("Failed to start session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_session(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.get_session(&session_id) {
        Ok(Some(session)) => HttpResponse::Ok().json(session),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Session not found"
        })),
        Err(e) => {
            log::error!("Failed to get session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_session_thoughts(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.get_session_thoughts(&session_id) {
        Ok(thoughts) => HttpResponse::Ok().json(thoughts),
        Err(e) => {
            log::error!("Failed to get session thoughts: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_session_actions(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.get_session_actions(&session_id) {
        Ok(actions) => HttpResponse::Ok().json(actions),
        Err(e) => {
            log::error!("Failed to get session actions: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_session_metrics(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.get_session_metrics(&session_id) {
        Ok(metrics) => HttpResponse::Ok().json(metrics),
        Err(e) => {
            log::error!("Failed to get session metrics: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_session_timeline(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.get_session_timeline(&session_id) {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => {
            log::error!("Failed to get session timeline: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn complete_session(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CompleteSessionRequest>,
) -> impl Responder {
    let session_id = path.into_inner();

    match data.watcher.complete_session(&session_id, &body.final_response) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(e) => {
            log::error!("Failed to complete session: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn get_agent_sessions(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let agent_id = path.into_inner();

    match data.watcher.get_agent_sessions(&agent_id) {
        Ok(sessions) => HttpResponse::Ok().json(sessions),
        Err(e) => {
            log::error!("Failed to list agent sessions: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/sessions")
            .route("/start", web::post().to(start_session))
            .route("/agent/{agentId}", web::get().to(get_agent_sessions))
            .route("/{sessionId}", web::get().to(get_session))
            .route("/{sessionId}/thoughts", web::get().to(get_session_thoughts))
            .route("/{sessionId}/actions", web::get().to(get_session_actions))
            .route("/{sessionId}/metrics", web::get().to(get_session_metrics))
            .route("/{sessionId}/timeline", web::get().to(get_session_timeline))
            .route("/{sessionId}/complete", web::post().to(complete_session)),
    );
}
