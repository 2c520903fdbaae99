//! Live event stream subscriptions against the agent-hosting API.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeRequest {
    #[serde(default)]
    agent_id: String,
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsubscribeRequest {
    #[serde(default)]
    session_id: String,
}

async fn subscribe(data: web::Data<AppState>, body: web::Json<SubscribeRequest>) -> impl Responder {
    if data.config.openai_api_key.is_none() {
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": "OPENAI_API_KEY is not configured"
        }));
    }

    if data.streams.subscribe(&body.agent_id, &body.session_id) {
        HttpResponse::Ok().json(serde_json::json!({
            "subscribed": body.session_id
        }))
    } else {
        HttpResponse::Conflict().json(serde_json::json!({
            "error": "Session already has an active subscription"
        }))
    }
}

async fn unsubscribe(
    data: web::Data<AppState>,
    body: web::Json<UnsubscribeRequest>,
) -> impl Responder {
    if data.streams.unsubscribe(&body.session_id) {
        HttpResponse::Ok().json(serde_json::json!({
            "unsubscribed": body.session_id
        }))
    } else {
        HttpResponse::NotFound().json(serde_json::json!({
            "error": "No active subscription for session"
        }))
    }
}

async fn list_subscriptions(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "sessions": data.streams.active_sessions()
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/stream")
            .route("/subscribe", web::post().to(subscribe))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("", web::get().to(list_subscriptions)),
    );
}
