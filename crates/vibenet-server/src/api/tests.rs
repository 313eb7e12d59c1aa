use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use chrono::{NaiveDate, Utc};
use tower::ServiceExt;
use vibenet_core::{ScoredPost, SentimentLabel};
use vibenet_reddit::RedditSearchClient;
use vibenet_sentiment::{aggregate_monthly, aggregate_yearly, RunManifest};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

// 2023-02-01T00:00:00Z, the `before` cursor for January 2023.
const JAN_2023_END: &str = "1675209600";
const JAN_10_2023: f64 = 1_673_308_800.0;

/// Nothing listens on the discard port, so any stray request fails fast.
const UNREACHABLE: &str = "http://127.0.0.1:9";

fn state_with(store: ArtifactStore, reddit_url: &str, tei_url: &str) -> AppState {
    let client = RedditSearchClient::with_base_url(5, "vibenet-test", reddit_url).expect("client");
    let collector = Collector::new(client, Duration::ZERO);
    let model = TeiClassifier::new(tei_url, 5).expect("tei client");
    AppState::new(collector, Classifier::new(model, 0.55, 128), store, 100, 300)
}

fn offline_state(store: ArtifactStore) -> AppState {
    state_with(store, UNREACHABLE, UNREACHABLE)
}

fn scored(day: u32, month: u32, label: SentimentLabel, score: f64, engagement: u64) -> ScoredPost {
    ScoredPost {
        date: NaiveDate::from_ymd_opt(2023, month, day).unwrap(),
        text: format!("post {month}-{day}"),
        engagement,
        sentiment_label: label,
        sentiment_score: score,
    }
}

fn seed_run(store: &ArtifactStore, stage: RunStage) {
    let posts = vec![
        scored(3, 1, SentimentLabel::Positive, 0.9, 10),
        scored(9, 1, SentimentLabel::Negative, -0.6, 5),
        scored(1, 2, SentimentLabel::Neutral, 0.0, 0),
    ];
    store.write_scored(&posts).unwrap();
    store
        .write_aggregates(&aggregate_monthly(&posts), &aggregate_yearly(&posts))
        .unwrap();
    store
        .write_manifest(&RunManifest {
            topic: "bitcoin".to_string(),
            year: 2023,
            stage,
            post_count: posts.len(),
            updated_at: Utc::now(),
        })
        .unwrap();
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).expect("json body");
    (status, json)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn analyze_req(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 25);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(-5)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("conflict", StatusCode::CONFLICT),
        ("no_data", StatusCode::UNPROCESSABLE_ENTITY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_reports_no_run_on_empty_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(offline_state(ArtifactStore::new(dir.path())));

    let (status, json) = send(app, get_req("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["data"]["last_run"].is_null());
    assert_eq!(json["data"]["analysis_running"], false);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn results_are_not_found_without_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(ArtifactStore::new(dir.path()));

    for uri in [
        "/api/v1/summary",
        "/api/v1/monthly",
        "/api/v1/yearly",
        "/api/v1/posts",
    ] {
        let (status, json) = send(build_app(state.clone()), get_req(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn unfinished_run_is_not_served() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    seed_run(&store, RunStage::Classified);

    let (status, _) = send(build_app(offline_state(store)), get_req("/api/v1/summary")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_reflects_completed_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    seed_run(&store, RunStage::Complete);

    let (status, json) = send(build_app(offline_state(store)), get_req("/api/v1/summary")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["topic"], "bitcoin");
    assert_eq!(data["year"], 2023);
    assert_eq!(data["mentions"], 3);
    // Jan mean 0.15, Feb mean 0.0 → 0.075 average.
    assert_eq!(data["signal"], "neutral");
    assert_eq!(data["distribution"]["positive"], 1);
    assert_eq!(data["distribution"]["negative"], 1);
    assert_eq!(data["distribution"]["neutral"], 1);
}

#[tokio::test]
async fn monthly_serialises_zero_engagement_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    seed_run(&store, RunStage::Complete);

    let (status, json) = send(build_app(offline_state(store)), get_req("/api/v1/monthly")).await;

    assert_eq!(status, StatusCode::OK);
    let months = json["data"].as_array().expect("array");
    assert_eq!(months.len(), 2);
    assert_eq!(months[0]["period"], "2023-01");
    assert_eq!(months[0]["total_engagement"], 15);
    assert!(months[1]["weighted_sentiment"].is_null());
}

#[tokio::test]
async fn posts_preview_honours_limit() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    seed_run(&store, RunStage::Complete);

    let (status, json) = send(
        build_app(offline_state(store)),
        get_req("/api/v1/posts?limit=2"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn analyze_rejects_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(ArtifactStore::new(dir.path()));

    for body in [
        r#"{"topic": "  ", "year": 2023}"#,
        r#"{"topic": "bitcoin", "year": 1999}"#,
        r#"{"topic": "bitcoin"}"#,
        "not json",
    ] {
        let (status, json) = send(build_app(state.clone()), analyze_req(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn analyze_conflicts_while_a_run_is_active() {
    let dir = tempfile::tempdir().unwrap();
    let state = offline_state(ArtifactStore::new(dir.path()));
    let _held = state.run_lock.clone().lock_owned().await;

    let (status, json) = send(
        build_app(state),
        analyze_req(r#"{"topic": "bitcoin", "year": 2023}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[tokio::test]
async fn analyze_runs_pipeline_and_serves_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("before", JAN_2023_END))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "children": [
                { "data": { "created_utc": JAN_10_2023, "title": "Bitcoin rallies", "selftext": "", "score": 40 } }
            ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "label": "positive", "score": 0.9 },
            { "label": "neutral", "score": 0.07 },
            { "label": "negative", "score": 0.03 }
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = state_with(ArtifactStore::new(dir.path()), &server.uri(), &server.uri());

    let (status, json) = send(
        build_app(state.clone()),
        analyze_req(r#"{"topic": "bitcoin", "year": 2023}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["post_count"], 1);
    assert_eq!(json["data"]["month_count"], 1);

    let (status, json) = send(build_app(state), get_req("/api/v1/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["signal"], "bullish");
    assert_eq!(json["data"]["mentions"], 1);
}

#[tokio::test]
async fn analyze_with_no_posts_is_unprocessable_and_keeps_previous_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "children": [] }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    seed_run(&store, RunStage::Complete);
    let state = state_with(store, &server.uri(), UNREACHABLE);

    let (status, json) = send(
        build_app(state.clone()),
        analyze_req(r#"{"topic": "nothing-here", "year": 2023}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "no_data");

    let (status, json) = send(build_app(state), get_req("/api/v1/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["topic"], "bitcoin");
}

#[tokio::test]
async fn analyze_finishes_after_the_client_goes_away() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("before", JAN_2023_END))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(serde_json::json!({
                    "data": { "children": [
                        { "data": { "created_utc": JAN_10_2023, "title": "Bitcoin rallies", "selftext": "", "score": 40 } }
                    ] }
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "label": "positive", "score": 0.9 },
            { "label": "neutral", "score": 0.07 },
            { "label": "negative", "score": 0.03 }
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = state_with(ArtifactStore::new(dir.path()), &server.uri(), &server.uri());

    let client = tokio::spawn(send(
        build_app(state.clone()),
        analyze_req(r#"{"topic": "bitcoin", "year": 2023}"#),
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.abort();
    assert!(client.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let complete = matches!(
                state.store.read_manifest(),
                Ok(Some(ref m)) if m.stage == RunStage::Complete
            );
            if complete && state.run_lock.try_lock().is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("run should complete and release the lock without its client");

    let (status, json) = send(build_app(state), get_req("/api/v1/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["mentions"], 1);
}
