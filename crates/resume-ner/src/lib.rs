//! # resume-ner
//!
//! Tag entities (names, contact details, skills, employers, degrees) in
//! plain resume text and serve them over HTTP.
//!
//! ```text
//! POST /parse-resume   {"text": "..."}
//!   → {"entities": [{"text": "Rust", "label": "Skills"}, ...]}
//! ```
//!
//! The model is loaded once at startup from a directory holding
//! `model.json` (see [`model`]) and shared read-only by every request.
//! Malformed or missing input is an empty document, never an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_ner::{serve, ServiceConfig, ServiceContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::default();
//!     let ctx = ServiceContext::load(&config.model_dir)?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//!     serve(listener, ctx).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod model;
pub mod service;

pub use error::ModelError;
pub use model::{EntityRecognizer, EntitySpan, GazetteerModel, ModelSpec, NameRule, MODEL_FILE};
pub use service::{router, serve, ParseRequest, ParseResponse, ServiceConfig, ServiceContext};
