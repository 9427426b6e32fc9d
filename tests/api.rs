use adgen::config::{AppConfig, GeminiConfig, PollConfig};
use adgen::media::MediaKind;
use adgen::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn offline_state() -> Arc<AppState> {
    Arc::new(AppState::new(AppConfig::default()))
}

fn state_for(server: &MockServer) -> Arc<AppState> {
    let config = AppConfig {
        gemini: GeminiConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
            retry_max_elapsed: Duration::from_millis(200),
            ..Default::default()
        },
        poll: PollConfig {
            interval: Duration::from_millis(10),
            timeout: Some(Duration::from_secs(5)),
        },
        ..Default::default()
    };
    Arc::new(AppState::new(config))
}

fn form() -> Value {
    json!({
        "productDescription": "An eco-friendly, solar-powered backpack",
        "productImages": [],
        "celebrityImages": [],
        "campaignGoals": "Increase brand awareness",
        "brandGuidelines": "",
        "tone": "Energetic",
        "channels": ["Instagram"],
        "regions": "Japan"
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
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

#[tokio::test]
async fn test_form_page_is_served() {
    let app = build_router(offline_state());
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Generate Ad Package"));
}

#[tokio::test]
async fn test_generate_without_key_is_unavailable() {
    let app = build_router(offline_state());
    let (status, body) = send(&app, post_json("/api/generate", &form())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "API_KEY environment variable is not set");
}

#[tokio::test]
async fn test_generate_rejects_blank_required_fields() {
    let app = build_router(offline_state());
    let mut request = form();
    request["tone"] = json!("   ");
    request["regions"] = json!("");

    let (status, body) = send(&app, post_json("/api/generate", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("tone"));
    assert!(message.contains("regions"));
}

#[tokio::test]
async fn test_removing_upload_revokes_preview() {
    let state = offline_state();
    let entry = state
        .media
        .insert(MediaKind::Upload, "shoe.png", "image/png", vec![1, 2, 3])
        .await;
    let app = build_router(state);

    let (status, body) = send(&app, get(&entry.preview_url())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, vec![1, 2, 3]);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/uploads/{}", entry.id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&entry.preview_url())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_returns_package_from_model() {
    let server = MockServer::start().await;
    let package = json!({
        "campaign_brief": {"title": "Carry the Sun", "hook": "Power on the trail", "value_props": ["Solar"]},
        "variants": [{"id": "v1", "channel": "Instagram", "aspect_ratio": "9:16", "duration_s": 15}]
    });
    Mock::given(method("POST"))
        .and(path_regex(r":generateContent$"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": package.to_string()}], "role": "model"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_router(state_for(&server));
    let (status, body) = send(&app, post_json("/api/generate", &form())).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["campaign_brief"]["title"], "Carry the Sun");
    assert_eq!(body["variants"][0]["channel"], "Instagram");
}

#[tokio::test]
async fn test_generate_with_unknown_upload_is_bad_request() {
    let server = MockServer::start().await;
    let app = build_router(state_for(&server));
    let mut request = form();
    request["productImages"] = json!(["missing-id"]);

    let (status, _) = send(&app, post_json("/api/generate", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

async fn mount_video_mocks(server: &MockServer, download_delay: Duration) {
    Mock::given(method("POST"))
        .and(path_regex(r":predictLongRunning$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-1"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": format!("{}/files/clip", server.uri())}}
            ]}}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/clip"))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(vec![0u8, 0, 0, 24])
                .set_delay(download_delay),
        )
        .mount(server)
        .await;
}

async fn start_video_job(app: &Router, scene_id: &str) -> String {
    let scene = json!({"scene_id": scene_id, "shot_type": "Wide", "action": "Hiker reaches the summit"});
    let (status, body) = send(app, post_json("/api/scenes/video", &scene)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    serde_json::from_slice::<Value>(&body).unwrap()["job_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Poll the job until `done` accepts it, or give up after a few seconds.
async fn wait_for_job(app: &Router, job_id: &str, done: impl Fn(&Value) -> bool) -> Value {
    let mut job = Value::Null;
    for _ in 0..250 {
        let (_, body) = send(app, get(&format!("/api/jobs/{}", job_id))).await;
        job = serde_json::from_slice(&body).unwrap();
        if done(&job) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    job
}

fn is_finished(job: &Value) -> bool {
    matches!(job["status"].as_str(), Some("completed" | "failed" | "cancelled"))
}

#[tokio::test]
async fn test_scene_video_job_runs_to_completion() {
    let server = MockServer::start().await;
    mount_video_mocks(&server, Duration::ZERO).await;

    let app = build_router(state_for(&server));
    let job_id = start_video_job(&app, "v1-1").await;

    let job = wait_for_job(&app, &job_id, is_finished).await;
    assert_eq!(job["status"], "completed", "job ended as {}", job);

    let (status, video) = send(&app, get(job["media_url"].as_str().unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(video, vec![0u8, 0, 0, 24]);
}

#[tokio::test]
async fn test_released_video_stops_resolving() {
    let server = MockServer::start().await;
    mount_video_mocks(&server, Duration::ZERO).await;

    let state = state_for(&server);
    let app = build_router(state.clone());
    let job_id = start_video_job(&app, "v1-1").await;
    let job = wait_for_job(&app, &job_id, is_finished).await;
    let media_url = job["media_url"].as_str().unwrap().to_string();

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete(&media_url)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, get(&media_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.media.len().await, 0);

    // uploads are removed through /api/uploads, not here
    let upload = state
        .media
        .insert(MediaKind::Upload, "shoe.png", "image/png", vec![1])
        .await;
    let (status, _) = send(&app, delete(&upload.preview_url())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(state.media.get(&upload.id).await.is_some());
}

#[tokio::test]
async fn test_cleanup_releases_finished_job_videos() {
    let server = MockServer::start().await;
    mount_video_mocks(&server, Duration::ZERO).await;

    let state = state_for(&server);
    let app = build_router(state.clone());

    let mut job_ids = Vec::new();
    for i in 0..5 {
        job_ids.push(start_video_job(&app, &format!("v1-{}", i)).await);
    }
    for job_id in &job_ids {
        let job = wait_for_job(&app, job_id, is_finished).await;
        assert_eq!(job["status"], "completed", "job ended as {}", job);
    }
    assert_eq!(state.media.len().await, 5);

    state.cleanup_expired(0).await;

    assert_eq!(state.media.len().await, 0);
    let (status, _) = send(&app, get(&format!("/api/jobs/{}", job_ids[0]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_finished_after_cancel_is_discarded() {
    let server = MockServer::start().await;
    mount_video_mocks(&server, Duration::from_millis(400)).await;

    let state = state_for(&server);
    let app = build_router(state.clone());
    let job_id = start_video_job(&app, "v1-1").await;

    let job = wait_for_job(&app, &job_id, |job| {
        job["current_step"] == "Downloading video..." || is_finished(job)
    })
    .await;
    assert_eq!(job["current_step"], "Downloading video...", "job was {}", job);

    let cancel = Request::builder()
        .method("POST")
        .uri(format!("/api/jobs/{}/cancel", job_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, cancel).await;
    assert_eq!(status, StatusCode::OK);

    // the download still completes; its video must not linger
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(state.media.len().await, 0);
    let job = wait_for_job(&app, &job_id, is_finished).await;
    assert_eq!(job["status"], "cancelled");
}

const BOUNDARY: &str = "adgen-test-boundary";

fn multipart_upload(files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (file_name, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_returns_previews() {
    let state = offline_state();
    let app = build_router(state.clone());

    let request = multipart_upload(&[
        ("front.png", "image/png", &b"png-bytes"[..]),
        ("side.jpg", "application/octet-stream", &b"jpg-bytes"[..]),
    ]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let uploaded: Value = serde_json::from_slice(&body).unwrap();
    let uploaded = uploaded.as_array().unwrap();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0]["file_name"], "front.png");
    assert_eq!(uploaded[0]["mime_type"], "image/png");
    assert_eq!(uploaded[1]["mime_type"], "image/jpeg");
    assert_eq!(uploaded[1]["size"], 9);

    let (status, preview) = send(&app, get(uploaded[0]["preview_url"].as_str().unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview, b"png-bytes".to_vec());
}

#[tokio::test]
async fn test_upload_rejects_non_images_without_storing_any() {
    let state = offline_state();
    let app = build_router(state.clone());

    let request = multipart_upload(&[
        ("front.png", "image/png", &b"png-bytes"[..]),
        ("notes.txt", "text/plain", &b"hello"[..]),
    ]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("notes.txt"));
    assert_eq!(state.media.len().await, 0);
}

#[tokio::test]
async fn test_upload_enforces_per_file_limit() {
    let config = AppConfig {
        max_upload_bytes: 16,
        ..Default::default()
    };
    let state = Arc::new(AppState::new(config));
    let app = build_router(state.clone());

    let request = multipart_upload(&[("huge.png", "image/png", &[7u8; 32][..])]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "'huge.png' is larger than the 16 bytes limit");
    assert_eq!(state.media.len().await, 0);
}

#[tokio::test]
async fn test_malformed_json_body_gets_error_shape() {
    let app = build_router(offline_state());
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header("content-type", "application/json")
        .body(Body::from("{\"productDescription\": "))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    let scene = Request::builder()
        .method("POST")
        .uri("/api/scenes/image")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, scene).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(serde_json::from_slice::<Value>(&body).unwrap()["error"].is_string());
}

#[tokio::test]
async fn test_scene_video_without_key_is_unavailable() {
    let app = build_router(offline_state());
    let scene = json!({"scene_id": "1", "shot_type": "Wide", "action": "Run"});
    let (status, _) = send(&app, post_json("/api/scenes/video", &scene)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = build_router(offline_state());
    let (status, _) = send(&app, get("/api/jobs/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let cancel = Request::builder()
        .method("POST")
        .uri("/api/jobs/does-not-exist/cancel")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, cancel).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
