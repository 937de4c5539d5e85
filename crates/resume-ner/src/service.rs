//! HTTP surface: a single `POST /parse-resume` route.

use crate::error::ModelError;
use crate::model::{EntityRecognizer, EntitySpan, GazetteerModel};
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

// ── Context ──────────────────────────────────────────────────────────────────

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct ServiceContext {
    model: Arc<dyn EntityRecognizer>,
}

impl ServiceContext {
    pub fn new(model: Arc<dyn EntityRecognizer>) -> Self {
        Self { model }
    }

    /// Load the default [`GazetteerModel`] from a model directory.
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model = GazetteerModel::load(model_dir)?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn model(&self) -> &Arc<dyn EntityRecognizer> {
        &self.model
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("model", &"<dyn EntityRecognizer>")
            .finish()
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

impl ParseRequest {
    /// Lenient decode: anything other than an object with a string `text`
    /// is an empty document.
    pub fn from_body(body: &[u8]) -> Self {
        // Go through `Value`: a derived struct would also accept `["..."]`.
        let text = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .as_ref()
            .and_then(serde_json::Value::as_object)
            .and_then(|fields| fields.get("text"))
            .filter(|v| !v.is_null())
            .cloned();
        Self { text }
    }

    pub fn text(&self) -> &str {
        self.text
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub entities: Vec<EntitySpan>,
}

// ── Routes ───────────────────────────────────────────────────────────────────

pub fn router(ctx: ServiceContext) -> Router {
    Router::new()
        .route("/parse-resume", post(parse_resume))
        .with_state(ctx)
}

async fn parse_resume(State(ctx): State<ServiceContext>, body: Bytes) -> Json<ParseResponse> {
    let request = ParseRequest::from_body(&body);
    let text = request.text();
    if request.text.is_none() && !body.is_empty() {
        debug!("Request without a usable 'text' field ({} bytes)", body.len());
    }
    let entities = ctx.model.recognize(text);
    info!("Tagged {} entities in {} chars", entities.len(), text.chars().count());
    Json(ParseResponse { entities })
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            model_dir: PathBuf::from("resume_ner_model"),
        }
    }
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Serve on an already-bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, ctx: ServiceContext) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{addr}");
    }
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            // Without a signal handler the server just runs until killed.
            warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_request_decoding() {
        assert_eq!(ParseRequest::from_body(br#"{"text":"Rust"}"#).text(), "Rust");
        assert_eq!(ParseRequest::from_body(br#"{"text":null}"#).text(), "");
        assert_eq!(ParseRequest::from_body(br#"{"text":42}"#).text(), "");
        assert_eq!(ParseRequest::from_body(b"{}").text(), "");
        assert_eq!(ParseRequest::from_body(b"not json").text(), "");
        assert_eq!(ParseRequest::from_body(b"").text(), "");
        assert_eq!(ParseRequest::from_body(b"[1,2]").text(), "");
        assert_eq!(ParseRequest::from_body(br#"["Jane Doe"]"#).text(), "");
        assert_eq!(ParseRequest::from_body(br#""Jane Doe""#).text(), "");
        assert!(ParseRequest::from_body(br#"["Jane Doe"]"#).text.is_none());
    }

    #[test]
    fn default_config_matches_published_address() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.model_dir, PathBuf::from("resume_ner_model"));
    }

    #[test]
    fn response_shape() {
        let r = ParseResponse {
            entities: vec![EntitySpan {
                text: "Rust".into(),
                label: "Skills".into(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"entities":[{"text":"Rust","label":"Skills"}]}"#
        );
    }
}
