mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{app_with, upload_request};
use http_body_util::BodyExt;
use mp3_extractor::config::AppConfig;
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn test_missing_transcoder_refuses_uploads() {
    let (app, _) = app_with(AppConfig::development(), false);

    let response = app
        .clone()
        .oneshot(upload_request("/convert", None, &[("clip.mp4", "a")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "ffmpeg is not installed in this environment.");

    let response = app
        .clone()
        .oneshot(upload_request("/convert/stream", None, &[("clip.mp4", "a")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_index_reports_upload_disabled() {
    let (app, _) = app_with(AppConfig::development(), false);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["upload_enabled"], false);
    assert_eq!(json["error"], "ffmpeg is not installed in this environment.");
    assert_eq!(json["ffmpeg_settings"], "-vn -ac 1 -ar 16000 -b:a 96k");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/session").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["phase"], "idle");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["transcoder"], "missing");
}

#[tokio::test]
async fn test_available_transcoder_enables_uploads() {
    let (app, _) = app_with(AppConfig::development(), true);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["upload_enabled"], true);
    assert!(json["error"].is_null());
    assert_eq!(json["accepted_extensions"][0], "mp4");
}
