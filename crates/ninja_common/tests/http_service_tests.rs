//! HTTP progression service against an in-process API server.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use ninja_common::config::ApiConfig;
use ninja_common::{
    HttpProgressionService, Level, MemoryXpCache, NinjaError, ProgressionEngine,
    ProgressionService, Rank, XpEvent,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    users: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn stats_ok(
    State(rec): State<Recorded>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.users.lock().unwrap().push(user);
    rec.auth.lock().unwrap().push(auth_header(&headers));
    Json(json!({"xp": 1200, "level": 3, "rank": "genin", "nextLevelXp": 1600, "progress": 57.1}))
}

async fn award_ok(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.bodies.lock().unwrap().push(body);
    Json(json!({
        "status": "ok",
        "xpAdded": 700,
        "totalXp": 1600,
        "oldLevel": 3,
        "newLevel": 4,
        "leveledUp": true,
        "rank": "genin"
    }))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn service(base_url: &str, token: Option<&str>) -> HttpProgressionService {
    HttpProgressionService::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        token: token.map(str::to_string),
    })
    .unwrap()
}

fn happy_app(rec: Recorded) -> Router {
    Router::new()
        .route("/api/meta/stats/:user_id", get(stats_ok))
        .route("/api/meta/xp", post(award_ok))
        .with_state(rec)
}

#[tokio::test]
async fn test_fetch_stats() {
    let rec = Recorded::default();
    let base = serve(happy_app(rec.clone())).await;
    let svc = service(&base, Some("tok"));

    let stats = svc.fetch_stats("user 42").await.unwrap();
    assert_eq!(stats.xp, 1200);
    assert_eq!(stats.level, Some(Level(3)));
    assert_eq!(stats.rank, Some(Rank::Genin));

    assert_eq!(rec.users.lock().unwrap().as_slice(), ["user 42".to_string()]);
    assert_eq!(
        rec.auth.lock().unwrap().as_slice(),
        [Some("Bearer tok".to_string())]
    );
}

#[tokio::test]
async fn test_no_token_no_auth_header() {
    let rec = Recorded::default();
    let base = serve(happy_app(rec.clone())).await;

    service(&base, None).fetch_stats("u1").await.unwrap();
    assert_eq!(rec.auth.lock().unwrap().as_slice(), [None::<String>]);
}

#[tokio::test]
async fn test_submit_award() {
    let rec = Recorded::default();
    let base = serve(happy_app(rec.clone())).await;
    let svc = service(&base, None);

    let receipt = svc
        .submit_award(&XpEvent::new("u1", 700, "weekly streak"))
        .await
        .unwrap();
    assert_eq!(receipt.total_xp, 1600);
    assert!(receipt.leveled_up);
    assert_eq!(receipt.new_level, Some(Level(4)));

    assert_eq!(
        rec.bodies.lock().unwrap().as_slice(),
        [json!({"userId": "u1", "amount": 700, "action": "weekly streak"})]
    );
}

#[tokio::test]
async fn test_error_status_in_body() {
    let app = Router::new().route(
        "/api/meta/xp",
        post(|| async { Json(json!({"status": "error", "error": "User not found"})) }),
    );
    let base = serve(app).await;

    let err = service(&base, None)
        .submit_award(&XpEvent::new("u1", 10, "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, NinjaError::Rejected(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_http_error_status() {
    let app = Router::new()
        .route(
            "/api/meta/stats/:user_id",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Supabase not configured"})),
                )
            }),
        )
        .route(
            "/api/meta/xp",
            post(|| async { (StatusCode::UNAUTHORIZED, "no token") }),
        );
    let base = serve(app).await;
    let svc = service(&base, None);

    match svc.fetch_stats("u1").await {
        Err(NinjaError::Status { code, body }) => {
            assert_eq!(code, 500);
            assert!(body.contains("Supabase"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    match svc.submit_award(&XpEvent::new("u1", 1, "x")).await {
        Err(NinjaError::Status { code, .. }) => assert_eq!(code, 401),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let app = Router::new().route("/api/meta/stats/:user_id", get(|| async { "not json" }));
    let base = serve(app).await;

    let err = service(&base, None).fetch_stats("u1").await.unwrap_err();
    assert!(matches!(err, NinjaError::MalformedResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = service(&format!("http://{}", addr), None)
        .fetch_stats("u1")
        .await
        .unwrap_err();
    assert!(err.is_unreachable(), "got {:?}", err);
}

#[tokio::test]
async fn test_engine_over_http_falls_back_on_server_error() {
    let app = Router::new()
        .route(
            "/api/meta/stats/:user_id",
            get(|| async { Json(json!({"xp": 350, "level": 1, "rank": "ronin"})) }),
        )
        .route(
            "/api/meta/xp",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    let base = serve(app).await;
    let engine = ProgressionEngine::new(
        Arc::new(service(&base, None)),
        Arc::new(MemoryXpCache::new()),
    );

    let loaded = engine.load("u1").await;
    assert!(loaded.is_authoritative());
    // "ronin" is not a rank we know, so it is derived from the level
    assert_eq!(engine.state().rank, Rank::Genin);

    let awarded = engine.award("u1", 500, "trade").await;
    assert!(awarded.is_fallback());
    let state = engine.state();
    assert_eq!(state.xp, 850);
    assert_eq!(state.level, Level(2));
    assert!(state.just_leveled_up);
}
