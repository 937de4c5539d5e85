//! Drive the `/parse-resume` router in-process and over a real socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use resume_ner::{router, serve, EntityRecognizer, EntitySpan, ParseResponse, ServiceContext};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const RESUME: &str = "Jane Doe\n\
jane.doe@example.com | +1 555-123-4567\n\
Senior Software Engineer at Google, Seattle\n\
Skills: Rust, Python, Kubernetes\n\
Bachelor of Science, Stanford University 2012 - 2016\n";

fn bundled() -> ServiceContext {
    ServiceContext::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("resume_ner_model")).unwrap()
}

/// Counts calls and tags nothing.
#[derive(Default)]
struct CountingModel {
    calls: AtomicUsize,
}

impl EntityRecognizer for CountingModel {
    fn recognize(&self, _text: &str) -> Vec<EntitySpan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Vec::new()
    }
}

async fn post(ctx: ServiceContext, body: &str) -> (StatusCode, ParseResponse) {
    let response = router(ctx)
        .oneshot(
            Request::post("/parse-resume")
                .header("content-type", "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn empty_inputs_yield_no_entities() {
    for body in [
        r#"{"text":""}"#,
        "{}",
        r#"{"text":null}"#,
        r#"{"text":7}"#,
        r#"["Jane Doe"]"#,
        "garbage",
        "",
    ] {
        let (status, parsed) = post(bundled(), body).await;
        assert_eq!(status, StatusCode::OK, "body {body:?}");
        assert!(parsed.entities.is_empty(), "body {body:?}: {parsed:?}");
    }
}

#[tokio::test]
async fn resume_entities_are_verbatim_substrings() {
    let body = serde_json::json!({ "text": RESUME }).to_string();
    let (status, parsed) = post(bundled(), &body).await;
    assert_eq!(status, StatusCode::OK);

    for e in &parsed.entities {
        assert!(RESUME.contains(&e.text), "{e:?} not in input");
        assert!(!e.label.is_empty());
    }

    let has = |text: &str, label: &str| {
        parsed
            .entities
            .iter()
            .any(|e| e.text == text && e.label == label)
    };
    assert!(has("Jane Doe", "Name"), "{:?}", parsed.entities);
    assert!(has("jane.doe@example.com", "Email Address"));
    assert!(has("Senior Software Engineer", "Designation"));
    assert!(has("Google", "Companies worked at"));
    assert!(has("Rust", "Skills"));
    assert!(has("Stanford University", "College Name"));
    assert!(!has("Software Engineer", "Designation"));

    let positions: Vec<usize> = parsed
        .entities
        .iter()
        .map(|e| RESUME.find(&e.text).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] <= w[1]), "{positions:?}");
}

#[tokio::test]
async fn model_is_shared_across_requests() {
    let model = Arc::new(CountingModel::default());
    let ctx = ServiceContext::new(model.clone());
    post(ctx.clone(), r#"{"text":"a"}"#).await;
    post(ctx, r#"{"text":"b"}"#).await;
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn only_post_parse_resume_is_routed() {
    let response = router(bundled())
        .oneshot(Request::get("/parse-resume").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = router(bundled())
        .oneshot(Request::post("/parse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn serves_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, bundled()));

    let parsed: ParseResponse = reqwest::Client::new()
        .post(format!("http://{addr}/parse-resume"))
        .json(&serde_json::json!({ "text": "Skilled in Rust and Docker" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let texts: Vec<&str> = parsed.entities.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Rust", "Docker"]);
}

#[test]
fn missing_model_dir_fails_to_load() {
    let err = ServiceContext::load("/no/such/resume_ner_model").unwrap_err();
    assert!(err.to_string().contains("Model not found"), "{err}");
}
