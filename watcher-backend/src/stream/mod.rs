//! Outbound subscription to the agent-hosting API's live event feed.
//!
//! Each subscription is a cancellable long-lived task that pulls a
//! line-delimited JSON event stream and feeds every event through the event
//! parser. Connection errors are logged and retried with exponential backoff;
//! they never escalate past the task.

use dashmap::DashMap;
use futures_util::StreamExt;
use reqwest::header;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::events::EventParser;

const INITIAL_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 60;

pub struct StreamManager {
    client: reqwest::Client,
    parser: Arc<EventParser>,
    api_url: String,
    api_key: String,
    /// Active subscriptions keyed by session id
    subscriptions: DashMap<String, CancellationToken>,
}

impl StreamManager {
    pub fn new(parser: Arc<EventParser>, api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            parser,
            api_url,
            api_key,
            subscriptions: DashMap::new(),
        }
    }

    /// Start streaming events for an agent into the given session. Returns
    /// false when the session already has an active subscription.
    pub fn subscribe(self: &Arc<Self>, agent_id: &str, session_id: &str) -> bool {
        if self.subscriptions.contains_key(session_id) {
            return false;
        }

        let token = CancellationToken::new();
        self.subscriptions
            .insert(session_id.to_string(), token.clone());

        let manager = Arc::clone(self);
        let agent_id = agent_id.to_string();
        let session_id = session_id.to_string();
        // The task only exits on cancellation, and unsubscribe() already
        // removed the registry entry by then.
        tokio::spawn(async move {
            manager.run_subscription(&agent_id, &session_id, token).await;
        });

        true
    }

    /// Cancel the subscription for a session. Returns false when none exists.
    pub fn unsubscribe(&self, session_id: &str) -> bool {
        if let Some((_, token)) = self.subscriptions.remove(session_id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Session ids with an active subscription
    pub fn active_sessions(&self) -> Vec<String> {
        self.subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    async fn run_subscription(&self, agent_id: &str, session_id: &str, token: CancellationToken) {
        log::info!(
            "Starting event stream for agent: {}, session: {}",
            agent_id,
            session_id
        );

        let mut backoff = INITIAL_BACKOFF_SECS;
        loop {
            let attempt = tokio::select! {
                _ = token.cancelled() => {
                    log::info!("Event stream cancelled for session: {}", session_id);
                    return;
                }
                result = self.stream_once(agent_id, session_id) => result,
            };

            match attempt {
                Ok(processed) if processed > 0 => {
                    log::info!(
                        "Event stream for session {} ended after {} events, reconnecting",
                        session_id,
                        processed
                    );
                    backoff = INITIAL_BACKOFF_SECS;
                }
                Ok(_) => {
                    log::debug!("Event stream for session {} yielded no events", session_id);
                }
                Err(e) => {
                    log::error!("Error streaming events for session {}: {}", session_id, e);
                }
            }

            tokio::select! {
                _ = token.cancelled() => {
                    log::info!("Event stream cancelled for session: {}", session_id);
                    return;
                }
                _ = tokio::time::sleep(Duration::from_secs(backoff)) => {}
            }
            backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
        }
    }

    /// One connection attempt: consume the feed until it closes or errors.
    /// Returns the number of events handed to the parser.
    async fn stream_once(&self, agent_id: &str, session_id: &str) -> Result<u64, reqwest::Error> {
        let response = self
            .client
            .get(format!("{}/agents/{}/events", self.api_url, agent_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?
            .error_for_status()?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut processed = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Accept both raw JSON lines and SSE "data:" framing
                let payload = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
                if payload == "[DONE]" {
                    continue;
                }

                match serde_json::from_str::<Value>(payload) {
                    Ok(event) => {
                        log::debug!(
                            "Received event for session {}: {}",
                            session_id,
                            event.get("type").and_then(Value::as_str).unwrap_or("?")
                        );
                        self.parser.process_event(agent_id, session_id, event);
                        processed += 1;
                    }
                    Err(e) => log::warn!(
                        "Skipping malformed stream line for session {}: {}",
                        session_id,
                        e
                    ),
                }
            }
        }

        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::watcher::WatcherService;
    use tempfile::tempdir;

    fn test_manager() -> (tempfile::TempDir, Arc<StreamManager>) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let watcher = Arc::new(WatcherService::new(Arc::new(db)));
        let parser = Arc::new(EventParser::new(watcher));
        let manager = Arc::new(StreamManager::new(
            parser,
            // Unroutable endpoint; the task just backs off in the background
            "http://127.0.0.1:9".to_string(),
            "test-key".to_string(),
        ));
        (dir, manager)
    }

    #[tokio::test]
    async fn test_subscribe_is_tracked_and_deduplicated() {
        let (_dir, manager) = test_manager();

        assert!(manager.subscribe("agent-1", "sess-1"));
        assert!(!manager.subscribe("agent-1", "sess-1"));
        assert_eq!(manager.active_sessions(), vec!["sess-1".to_string()]);
    }

    #[tokio::test]
    async fn test_unsubscribe_cancels_and_clears() {
        let (_dir, manager) = test_manager();

        manager.subscribe("agent-1", "sess-1");
        assert!(manager.unsubscribe("sess-1"));
        assert!(manager.active_sessions().is_empty());
        assert!(!manager.unsubscribe("sess-1"));
    }
}
