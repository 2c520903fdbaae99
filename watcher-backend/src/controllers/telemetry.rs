//! Telemetry ingestion endpoints: the generic event envelope plus the three
//! narrow thought/action/metric shapes. All of them acknowledge with a plain
//! 200 body; a malformed event is dropped by the parser, not rejected here.

use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;

use crate::models::{LogActionRequest, LogMetricRequest, LogThoughtRequest};
use crate::AppState;

/// Submit a generic telemetry event. The envelope carries agentId/sessionId
/// next to the event's own `type` and variant fields.
async fn submit_event(data: web::Data<AppState>, body: web::Json<Value>) -> impl Responder {
    let event = body.into_inner();

    let agent_id = event
        .get("agentId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let session_id = event
        .get("sessionId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("?");

    log::info!(
        "Received telemetry event: type={}, agent={}, session={}",
        event_type,
        agent_id,
        session_id
    );

    data.parser.process_event(&agent_id, &session_id, event);
    HttpResponse::Ok().body("Event received")
}

async fn log_thought(
    data: web::Data<AppState>,
    body: web::Json<LogThoughtRequest>,
) -> impl Responder {
    match data.watcher.log_thought(
        &body.agent_id,
        &body.session_id,
        &body.thought_type,
        &body.content,
        body.confidence,
    ) {
        Ok(_) => HttpResponse::Ok().body("Thought logged"),
        Err(e) => {
            log::error!("Failed to log thought: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn log_action(
    data: web::Data<AppState>,
    body: web::Json<LogActionRequest>,
) -> impl Responder {
    match data.watcher.start_action(
        &body.agent_id,
        &body.session_id,
        &body.action_type,
        &body.action_name,
        body.input_data.as_deref(),
    ) {
        Ok(_) => HttpResponse::Ok().body("Action logged"),
        Err(e) => {
            log::error!("Failed to log action: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

async fn log_metric(
    data: web::Data<AppState>,
    body: web::Json<LogMetricRequest>,
) -> impl Responder {
    match data.watcher.log_telemetry(
        &body.agent_id,
        &body.session_id,
        &body.metric_name,
        body.metric_value,
        &body.metric_unit,
        &body.metric_type,
    ) {
        Ok(()) => HttpResponse::Ok().body("Metric logged"),
        Err(e) => {
            log::error!("Failed to log metric: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/telemetry")
            .route("/events", web::post().to(submit_event))
            .route("/thoughts", web::post().to(log_thought))
            .route("/actions", web::post().to(log_action))
            .route("/metrics", web::post().to(log_metric)),
    );
}
