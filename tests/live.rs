use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use ciceron_back::{
    build_router, config::AppConfig, dao::debate_store::memory::MemoryDebateStore,
    state::AppState,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn app() -> Router {
    let state = AppState::new(AppConfig {
        upload_dir: std::env::temp_dir().join(format!("ciceron-live-{}", Uuid::new_v4())),
        ..AppConfig::default()
    });
    state
        .install_debate_store(Arc::new(MemoryDebateStore::new()))
        .await;
    build_router(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Debate whose every turn lasts two seconds.
async fn short_debate(app: &Router) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/debates",
        Some(json!({
            "config": {
                "teamAName": "Cicerón",
                "teamBName": "Catilina",
                "debateTopic": "La república está en peligro",
                "roundDurations": {
                    "introduccion": 2,
                    "primerRefutador": 2,
                    "segundoRefutador": 2,
                    "conclusion": 2
                }
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_owned()
}

async fn live(app: &Router, id: &str, action: &str) -> (StatusCode, Value) {
    call(app, Method::POST, &format!("/api/debates/{id}/live/{action}"), None).await
}

#[tokio::test(start_paused = true)]
async fn session_opens_once_in_setup() {
    let app = app().await;
    let id = short_debate(&app).await;
    let uri = format!("/api/debates/{id}/live");

    let (status, body) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["debateId"], id.as_str());
    assert_eq!(body["data"]["phase"], "setup");
    assert_eq!(body["data"]["timeRemaining"], 2);
    assert_eq!(body["data"]["currentTeamName"], "Cicerón");

    let (status, body) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "LIVE_SESSION_EXISTS");
}

#[tokio::test(start_paused = true)]
async fn unknown_debate_cannot_go_live() {
    let app = app().await;
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/debates/{}/live", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DEBATE_NOT_FOUND");
}

#[tokio::test(start_paused = true)]
async fn illegal_transitions_conflict_without_changing_state() {
    let app = app().await;
    let id = short_debate(&app).await;
    call(&app, Method::POST, &format!("/api/debates/{id}/live"), None).await;

    let (status, body) = live(&app, &id, "pause").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (_, body) = call(&app, Method::GET, &format!("/api/debates/{id}/live"), None).await;
    assert_eq!(body["data"]["phase"], "setup");
    assert_eq!(body["data"]["version"], 0);

    let (status, body) = live(&app, &id, "rewind").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test(start_paused = true)]
async fn last_turn_expiry_completes_the_debate() {
    let app = app().await;
    let id = short_debate(&app).await;
    call(&app, Method::POST, &format!("/api/debates/{id}/live"), None).await;

    let (status, body) = live(&app, &id, "start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phase"], "running");
    for _ in 0..7 {
        let (status, _) = live(&app, &id, "skip").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/debates/{id}/live/advance/B"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_TURN_AHEAD");

    let (_, body) = call(&app, Method::GET, &format!("/api/debates/{id}/live"), None).await;
    assert_eq!(body["data"]["isLastRound"], true);
    assert_eq!(body["data"]["currentRound"]["roundType"], "Conclusión");

    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let (_, body) = call(&app, Method::GET, &format!("/api/debates/{id}/live"), None).await;
    assert_eq!(body["data"]["phase"], "finished");
    assert_eq!(body["data"]["timeRemaining"], 0);
    assert_eq!(body["data"]["recordings"].as_array().unwrap().len(), 8);

    let (_, body) = call(&app, Method::GET, &format!("/api/debates/{id}"), None).await;
    assert_eq!(body["data"]["status"], "completed");

    let (status, _) = live(&app, &id, "finish").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = live(&app, &id, "start").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test(start_paused = true)]
async fn closing_removes_the_session() {
    let app = app().await;
    let id = short_debate(&app).await;
    let uri = format!("/api/debates/{id}/live");
    call(&app, Method::POST, &uri, None).await;

    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LIVE_SESSION_NOT_FOUND");
}

#[tokio::test(start_paused = true)]
async fn events_stream_starts_with_current_snapshot() {
    let app = app().await;
    let id = short_debate(&app).await;
    call(&app, Method::POST, &format!("/api/debates/{id}/live"), None).await;

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/debates/{id}/live/events"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.starts_with("event: session.snapshot\n"), "{text}");
    assert!(text.contains("\"phase\":\"setup\""), "{text}");
}
