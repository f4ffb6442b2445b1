//! Integration tests driving the real client against an in-process mock of
//! the SmartPlate service bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use chrono::NaiveDate;
use serde_json::{json, Value};

use smartplate::api::types::{LogMealRequest, ManualMacros, MetricsRange, NutritionTargets};
use smartplate::{ApiClient, App, Session, SessionStore, SmartPlateError};

const TOKEN: &str = "t1";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    meals: Vec<Value>,
    targets: Option<Value>,
    profile: Option<Value>,
    next_id: u32,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid token" })))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "a@b.com" && body["password"] == "x" {
        (
            StatusCode::OK,
            Json(json!({ "name": "A", "email": "a@b.com", "token": TOKEN })),
        )
    } else {
        unauthorized()
    }
}

async fn register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "taken@b.com" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "email already registered" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "name": body["name"],
            "email": body["email"],
            "token": TOKEN
        })),
    )
}

async fn get_profile(State(state): State<MockState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    match state.inner.lock().unwrap().profile.clone() {
        Some(p) => (StatusCode::OK, Json(p)),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no profile" }))),
    }
}

async fn save_profile(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["age"].as_u64().unwrap_or(0) > 130 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "age out of range" })),
        );
    }
    state.inner.lock().unwrap().profile = Some(body.clone());
    (StatusCode::OK, Json(body))
}

fn generated_targets() -> Value {
    json!({
        "target_calories": 2400.0,
        "protein_target_g": 160.0,
        "carbs_target_g": 250.0,
        "fat_target_g": 80.0,
        "sleep_hours_target": 7.5
    })
}

async fn get_targets(State(state): State<MockState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    match state.inner.lock().unwrap().targets.clone() {
        Some(t) => (StatusCode::OK, Json(t)),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no insights yet" }))),
    }
}

async fn generate_targets(State(state): State<MockState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let targets = generated_targets();
    state.inner.lock().unwrap().targets = Some(targets.clone());
    (StatusCode::OK, Json(targets))
}

async fn override_targets(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.inner.lock().unwrap().targets = Some(body.clone());
    (StatusCode::OK, Json(body))
}

async fn log_meal(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.inner.lock().unwrap();
    inner.next_id += 1;
    let id = format!("m-{}", inner.next_id);
    let date = body["mealDate"].as_str().unwrap_or("2026-08-27").to_string();

    // AI path: pretend to analyze the decoded photo. Manual path: echo the
    // submitted macros back, renamed to the response casing.
    let (calories, protein, carbs, fat, explanation) = if let Some(b64) = body["imageBytes"].as_str() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .expect("client must send valid base64");
        (
            640.0,
            45.0,
            70.0,
            18.0,
            Some(format!("analyzed {} bytes", bytes.len())),
        )
    } else {
        (
            body["calories"].as_f64().unwrap_or(0.0),
            body["proteinG"].as_f64().unwrap_or(0.0),
            body["carbsG"].as_f64().unwrap_or(0.0),
            body["fatG"].as_f64().unwrap_or(0.0),
            None,
        )
    };

    let mut meal = json!({
        "id": id,
        "mealName": body["mealName"],
        "description": body["description"],
        "meal_date": date,
        "meal_time": "12:00",
        "calories": calories,
        "protein_g": protein,
        "carbs_g": carbs,
        "fat_g": fat
    });
    if let Some(explanation) = explanation {
        meal["explanation"] = json!(explanation);
        meal["advice"] = json!("watch the sodium");
    }
    inner.meals.push(meal.clone());
    (StatusCode::OK, Json(meal))
}

async fn meals_for_date(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(date) = params.get("Date") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "missing Date" })));
    };
    let meals: Vec<Value> = state
        .inner
        .lock()
        .unwrap()
        .meals
        .iter()
        .filter(|m| m["meal_date"] == date.as_str())
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(meals)))
}

async fn meal_by_id(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = params.get("MealId").cloned().unwrap_or_default();
    match state
        .inner
        .lock()
        .unwrap()
        .meals
        .iter()
        .find(|m| m["id"] == id.as_str())
    {
        Some(meal) => (StatusCode::OK, Json(meal.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "meal not found" }))),
    }
}

async fn delete_meal(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let id = body["MealId"].as_str().unwrap_or_default().to_string();
    let mut inner = state.inner.lock().unwrap();
    let before = inner.meals.len();
    inner.meals.retain(|m| m["id"] != id.as_str());
    if inner.meals.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "meal not found" })));
    }
    (StatusCode::OK, Json(json!({})))
}

async fn meal_metrics(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    match params.get("Range").map(String::as_str) {
        Some("week") | Some("month") => (
            StatusCode::OK,
            Json(json!([
                {
                    "meal_date": "2026-08-26",
                    "calories_total": 2100.0,
                    "protein_g_total": 150.0,
                    "carbs_g_total": 210.0,
                    "fat_g_total": 70.0
                },
                {
                    "meal_date": "2026-08-27",
                    "calories_total": 2350.0,
                    "protein_g_total": 162.0,
                    "carbs_g_total": 240.0,
                    "fat_g_total": 75.0
                }
            ])),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad Range" }))),
    }
}

async fn body_metrics(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    match params.get("Range").map(String::as_str) {
        Some("week") | Some("month") => (
            StatusCode::OK,
            Json(json!([
                { "entry_date": "2026-08-25", "weight_kg": 82.8 },
                { "entry_date": "2026-08-27", "weight_kg": 82.4 }
            ])),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "message": "bad Range" }))),
    }
}

/// Bind the mock service on an ephemeral localhost port and return its base
/// URL. The server task lives until the test process exits.
async fn start_mock_server() -> String {
    let state = MockState::default();
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/user/userdata", get(get_profile).post(save_profile))
        .route(
            "/userinsights/userinsights",
            get(get_targets).post(generate_targets).put(override_targets),
        )
        .route(
            "/usermeals/usermeal",
            get(meals_for_date).post(log_meal).delete(delete_meal),
        )
        .route("/usermeals/usermealById", get(meal_by_id))
        .route("/usermetrics/mealmetrics", get(meal_metrics))
        .route("/usermetrics/bodymetrics", get(body_metrics))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("mock server error: {e:?}");
        }
    });
    format!("http://{addr}")
}

struct TestApp {
    app: App,
    _dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let base = start_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::at(dir.path().join("session.json"));
    TestApp {
        app: App::new(store, ApiClient::new(base)),
        _dir: dir,
    }
}

#[tokio::test]
async fn login_persists_matching_session() {
    let t = test_app().await;
    let session = t.app.login("a@b.com", "x").await.unwrap();

    let expected = Session {
        name: "A".to_string(),
        email: "a@b.com".to_string(),
        token: "t1".to_string(),
    };
    assert_eq!(session, expected);
    assert_eq!(t.app.session(), Some(expected));
}

#[tokio::test]
async fn wrong_password_is_unauthorized_and_nothing_is_stored() {
    let t = test_app().await;
    let err = t.app.login("a@b.com", "wrong").await.unwrap_err();
    assert!(matches!(err, SmartPlateError::Unauthorized));
    assert_eq!(t.app.session(), None);
}

#[tokio::test]
async fn register_conflict_surfaces_server_message() {
    let t = test_app().await;
    let err = t.app.register("B", "taken@b.com", "pw").await.unwrap_err();
    match err {
        SmartPlateError::RequestFailed { status, message } => {
            assert_eq!(status, Some(409));
            assert_eq!(message, "email already registered");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_token_yields_unauthorized_and_clears_session() {
    let t = test_app().await;
    t.app
        .store()
        .persist(&Session {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            token: "expired".to_string(),
        })
        .unwrap();

    let err = t.app.profile().await.unwrap_err();
    assert!(matches!(err, SmartPlateError::Unauthorized));
    assert_eq!(t.app.session(), None, "401 must clear the stored session");

    // Follow-up calls fail the same way without network I/O.
    let err = t.app.targets().await.unwrap_err();
    assert!(matches!(err, SmartPlateError::Unauthorized));
}

#[tokio::test]
async fn unauthorized_is_distinct_from_other_failures() {
    let t = test_app().await;
    // 401 from the API, not wrapped in any other error kind.
    let err = t.app.client().targets("bad-token").await.unwrap_err();
    assert!(matches!(err, SmartPlateError::Unauthorized));

    // 404 with a message body is a RequestFailed, never Unauthorized.
    t.app.login("a@b.com", "x").await.unwrap();
    let err = t.app.targets().await.unwrap_err();
    match err {
        SmartPlateError::RequestFailed { status, message } => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "no insights yet");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn manual_meal_round_trips_exact_macros() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let req = LogMealRequest::manual(
        "Lunch",
        "leftovers",
        ManualMacros {
            calories: 500.0,
            protein_g: 30.0,
            carbs_g: 50.0,
            fat_g: 20.0,
        },
    )
    .unwrap()
    .on_date(today());

    let logged = t.app.log_meal(&req).await.unwrap();
    let fetched = t.app.meal(&logged.id).await.unwrap();
    assert_eq!(fetched, logged);
    assert_eq!(fetched.calories, 500.0);
    assert_eq!(fetched.protein_g, 30.0);
    assert_eq!(fetched.carbs_g, 50.0);
    assert_eq!(fetched.fat_g, 20.0);
}

#[tokio::test]
async fn photo_meal_is_analyzed_server_side() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let image = vec![0u8; 1024];
    let req = LogMealRequest::photo("Dinner", "pasta", &image)
        .unwrap()
        .on_date(today());
    let meal = t.app.log_meal(&req).await.unwrap();

    // The mock reports how many bytes it decoded, which proves the base64
    // payload survived the trip intact.
    assert_eq!(meal.explanation.as_deref(), Some("analyzed 1024 bytes"));
    assert!(meal.calories > 0.0);
    assert_eq!(meal.meal_name, "Dinner");
}

#[tokio::test]
async fn deleted_meal_disappears_from_its_date() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let macros = ManualMacros {
        calories: 400.0,
        protein_g: 25.0,
        carbs_g: 40.0,
        fat_g: 15.0,
    };
    let first = t
        .app
        .log_meal(&LogMealRequest::manual("Breakfast", "", macros).unwrap().on_date(today()))
        .await
        .unwrap();
    let second = t
        .app
        .log_meal(&LogMealRequest::manual("Snack", "", macros).unwrap().on_date(today()))
        .await
        .unwrap();

    t.app.delete_meal(&first.id).await.unwrap();

    let remaining = t.app.meals_on(today()).await.unwrap();
    let ids: Vec<&str> = remaining.iter().map(|m| m.id.as_str()).collect();
    assert!(!ids.contains(&first.id.as_str()));
    assert!(ids.contains(&second.id.as_str()));
}

#[tokio::test]
async fn dashboard_generates_targets_when_none_exist() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let dash = t.app.dashboard(today()).await.unwrap();
    assert_eq!(dash.targets.target_calories, 2400.0);
    assert!(dash.meals.is_empty());

    // The generated targets are now stored server-side.
    let targets = t.app.targets().await.unwrap();
    assert_eq!(targets, dash.targets);
}

#[tokio::test]
async fn overridden_targets_round_trip() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let custom = NutritionTargets {
        target_calories: 1800.0,
        protein_target_g: 140.0,
        carbs_target_g: 160.0,
        fat_target_g: 60.0,
        sleep_hours_target: None,
    };
    let saved = t.app.set_targets(&custom).await.unwrap();
    assert_eq!(saved, custom);
    assert_eq!(t.app.targets().await.unwrap(), custom);
}

#[tokio::test]
async fn profile_save_rejection_carries_message() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let mut profile: smartplate::api::types::UserProfile = serde_json::from_value(json!({
        "weightKg": 82.5,
        "heightCm": 180.0,
        "age": 31,
        "biologicalSex": "Male",
        "workoutsPerWeek": 4,
        "trainingType": "Strength",
        "trainingIntensity": "Moderate",
        "dailyActivityLevel": "LightlyActive",
        "goal": "MuscleGain",
        "sleepQuality": 4,
        "stressLevel": 2,
        "routineConsistency": 5
    }))
    .unwrap();

    let saved = t.app.save_profile(&profile).await.unwrap();
    assert_eq!(saved, profile);
    assert_eq!(t.app.profile().await.unwrap(), profile);

    profile.age = 200;
    let err = t.app.save_profile(&profile).await.unwrap_err();
    match err {
        SmartPlateError::RequestFailed { status, message } => {
            assert_eq!(status, Some(422));
            assert_eq!(message, "age out of range");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn metrics_parse_for_both_ranges() {
    let t = test_app().await;
    t.app.login("a@b.com", "x").await.unwrap();

    let days = t.app.meal_metrics(MetricsRange::Week).await.unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[1].meal_date, today());
    assert_eq!(days[1].calories_total, 2350.0);

    let body = t.app.body_metrics(MetricsRange::Month).await.unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[1].weight_kg, 82.4);
}

#[tokio::test]
async fn transport_failure_is_request_failed_without_status() {
    // Nothing listens on this port.
    let client = ApiClient::new("http://127.0.0.1:1");
    let err = client.targets("t1").await.unwrap_err();
    match err {
        SmartPlateError::RequestFailed { status, .. } => assert_eq!(status, None),
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}
