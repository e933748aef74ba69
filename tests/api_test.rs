// HTTP API tests driven through the axum router with tower's oneshot

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use common::*;
use healnav::ml::EncodingPolicy;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn chest_pain_json() -> Value {
    json!({
        "age": 45,
        "gender": "Male",
        "chest_pain": "Yes",
        "breathlessness": "No",
        "fever": "Yes",
        "pain_level": "severe",
        "symptom_duration_days": 3,
        "existing_disease": "None",
        "severity_level": "High"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = router(processor(EncodingPolicy::Safe));

    let (status, body) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["encoding_policy"], "safe");
}

#[tokio::test]
async fn test_predict_returns_priority_level_only() {
    let processor = processor(EncodingPolicy::Safe);
    let app = router(processor.clone());

    let (status, body) = send(app, post_json("/predict", &chest_pain_json())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "priority_level": "High" }));
    assert!(processor.queue().is_empty());
}

#[tokio::test]
async fn test_predict_accepts_numeric_flags() {
    let app = router(processor(EncodingPolicy::Strict));

    let mut request = chest_pain_json();
    request["chest_pain"] = json!(1);
    request["breathlessness"] = json!(0);
    request["fever"] = json!(true);

    let (status, body) = send(app, post_json("/predict", &request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priority_level"], "High");
}

#[tokio::test]
async fn test_triage_queues_the_case() {
    let processor = processor(EncodingPolicy::Safe);

    let (status, body) = send(
        router(processor.clone()),
        post_json("/v1/triage", &chest_pain_json()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["priority_level"], "High");
    assert_eq!(body["case"]["age"], 45);
    assert_eq!(body["case"]["existing_disease"], "None");
    assert_eq!(body["message"]["icon"], "🔴");
    assert_eq!(body["substitutions"], json!([]));
    assert_eq!(processor.queue().len(), 1);
}

#[tokio::test]
async fn test_queue_lists_most_urgent_first() {
    let processor = processor(EncodingPolicy::Safe);

    let mild = serde_json::to_value(mild_record()).unwrap();
    let moderate = serde_json::to_value(moderate_record()).unwrap();
    for request in [&mild, &chest_pain_json(), &moderate] {
        let (status, _) = send(router(processor.clone()), post_json("/v1/triage", request)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(router(processor), get("/v1/queue")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let priorities: Vec<&str> = body["cases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["priority"].as_str().unwrap())
        .collect();
    assert_eq!(priorities, vec!["High", "Medium", "Low"]);
}

#[tokio::test]
async fn test_missing_field_is_client_error() {
    let processor = processor(EncodingPolicy::Safe);

    let mut request = chest_pain_json();
    request.as_object_mut().unwrap().remove("severity_level");

    let (status, _) = send(router(processor.clone()), post_json("/v1/triage", &request)).await;

    assert!(status.is_client_error());
    assert!(processor.queue().is_empty());
}

#[tokio::test]
async fn test_unknown_category_is_client_error() {
    let app = router(processor(EncodingPolicy::Safe));

    let mut request = chest_pain_json();
    request["pain_level"] = json!("excruciating");

    let (status, _) = send(app, post_json("/predict", &request)).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_out_of_range_age_is_rejected() {
    let app = router(processor(EncodingPolicy::Safe));

    let mut request = chest_pain_json();
    request["age"] = json!(140);

    let (status, body) = send(app, post_json("/predict", &request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_metrics_endpoint_reports_predictions() {
    let _ = healnav::metrics::init_metrics();
    let processor = processor(EncodingPolicy::Safe);

    send(router(processor.clone()), post_json("/predict", &chest_pain_json())).await;

    let response = router(processor).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("healnav_predictions_total"));
}
