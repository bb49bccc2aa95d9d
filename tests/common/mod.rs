#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use mp3_extractor::config::AppConfig;
use mp3_extractor::services::transcoder::{TranscodeOutput, Transcoder};
use mp3_extractor::{AppState, create_app};
use std::path::Path;
use std::sync::Arc;

pub const BOUNDARY: &str = "---------------------------974767299852498929531610575";

/// Stand-in for ffmpeg. Inputs whose content is `corrupt` fail with a
/// diagnostic, `empty` exits cleanly but leaves a zero-byte output,
/// everything else yields a small mp3.
pub struct FakeTranscoder {
    pub available: bool,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn health_check(&self) -> bool {
        self.available
    }

    async fn transcode(&self, input: &Path, output: &Path) -> anyhow::Result<TranscodeOutput> {
        let data = tokio::fs::read(input).await?;
        if data == b"corrupt" {
            return Ok(TranscodeOutput {
                exit_ok: false,
                exit_code: Some(1),
                stderr: b"Invalid data found when processing input".to_vec(),
            });
        }

        if data == b"empty" {
            tokio::fs::write(output, b"").await?;
            return Ok(TranscodeOutput {
                exit_ok: true,
                exit_code: Some(0),
                stderr: Vec::new(),
            });
        }

        let mut mp3 = b"ID3".to_vec();
        mp3.extend_from_slice(&data);
        tokio::fs::write(output, mp3).await?;
        Ok(TranscodeOutput {
            exit_ok: true,
            exit_code: Some(0),
            stderr: Vec::new(),
        })
    }
}

pub fn app_with(config: AppConfig, available: bool) -> (axum::Router, AppState) {
    let _ = tracing_subscriber::fmt::try_init();
    let state = AppState::new(config, Arc::new(FakeTranscoder { available }));
    (create_app(state.clone()), state)
}

/// `files` parts, one per `(filename, content)`
pub fn multipart_body(files: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (filename, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
            Content-Type: video/mp4\r\n\r\n\
            {content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

pub fn upload_request(uri: &str, token: Option<&str>, files: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(files))).unwrap()
}

pub fn unlock_request(password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/session/unlock")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "password": password }).to_string(),
        ))
        .unwrap()
}
