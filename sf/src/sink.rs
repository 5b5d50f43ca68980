//! Session logging sink
//!
//! Fire-and-forget HTTP POST of session snapshots to an externally configured
//! endpoint (e.g. a spreadsheet web app). Each record runs on its own task;
//! failures are logged there and never reach the interview flow. Disabled
//! unless an endpoint is configured.

use chrono::Utc;
use reqwest::Client;
use serde_json::{Map, Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SinkConfig;
use crate::domain::{Session, SpecDocument};

/// Posts session snapshots without waiting for the outcome
#[derive(Clone)]
pub struct SessionSink {
    endpoint: Option<String>,
    http: Client,
}

impl SessionSink {
    pub fn from_config(config: &SinkConfig) -> Self {
        debug!(endpoint = ?config.endpoint, "SessionSink::from_config: called");
        Self {
            endpoint: config.endpoint.clone().filter(|e| !e.trim().is_empty()),
            http: Client::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            http: Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Record a payload, stamped with the current time
    ///
    /// Returns the spawned task, or None when the sink is disabled. Callers are
    /// free to drop the handle.
    pub fn record(&self, payload: Value) -> Option<JoinHandle<()>> {
        let body = stamp(payload);
        info!(payload = %body, "Recording session data");

        let Some(endpoint) = self.endpoint.clone() else {
            debug!("SessionSink::record: no endpoint configured");
            return None;
        };

        let http = self.http.clone();
        Some(tokio::spawn(async move {
            match http.post(&endpoint).json(&body).send().await {
                Ok(response) => {
                    debug!(status = %response.status(), "SessionSink::record: delivered");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to save session data");
                }
            }
        }))
    }
}

/// Add a `timestamp` field to an object payload
fn stamp(payload: Value) -> Value {
    let mut fields = match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    fields.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    Value::Object(fields)
}

/// Preliminary data captured when an interview starts
pub fn start_payload(session: &Session) -> Value {
    json!({
        "userId": session.user_id,
        "email": session.email,
        "initialIdea": session.initial_idea,
        "experienceLevel": session.experience_level,
    })
}

/// Final data captured when a document is generated
pub fn result_payload(session: &Session, document: &SpecDocument) -> Value {
    json!({
        "userId": session.user_id,
        "email": session.email,
        "generatedSpec": document,
    })
}
