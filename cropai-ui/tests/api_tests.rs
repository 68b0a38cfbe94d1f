//! Router-level tests
//!
//! Drive the full router in-process with `oneshot`, backed by the in-memory
//! collaborators in `helpers`.

mod helpers;

use axum::http::{header, StatusCode};
use cropai_common::events::CropEvent;
use cropai_common::Error;
use cropai_ui::session::SessionLimits;
use helpers::*;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

fn late_blight() -> ScriptedPredictor {
    ScriptedPredictor::new(vec![Ok(vec![
        prediction("Late Blight", 92.5),
        prediction("Leaf Mold", 40.0),
    ])])
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::seeded(late_blight());

    let response = app.get("/health", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "cropai-ui");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_first_visit_sets_cookie_once() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;
    assert!(cookie.starts_with("cropai_session="));

    let again = app.get("/", &cookie).await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(session_cookie(&again).is_none());

    let state = app.state(&cookie).await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["active_screen"], "analyze");
    assert_eq!(state["signed_in"], false);
}

#[tokio::test]
async fn test_analysis_flow_records_history() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app.post_image(&cookie, "image/jpeg", JPEG).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));

    app.wait_for_phase(&cookie, "completed").await;
    let state = app.wait_for_history(&cookie, 1).await;
    assert_eq!(state["is_analyzing"], false);
    assert!(state["error"].is_null());
    assert_eq!(state["predictions"][0]["disease"], "Late Blight");
    assert_eq!(state["predictions"][0]["confidence"], 92.5);
    assert_eq!(state["predictions"].as_array().unwrap().len(), 2);
    assert_eq!(state["history"][0]["disease_detected"], "Late Blight");
    assert_eq!(app.store.history_len(), 1);

    let page = body_string(app.get("/", &cookie).await).await;
    assert!(page.contains("Late Blight"));
    assert!(page.contains("92.5%"));
    assert!(page.contains("High Confidence"));
    assert!(page.contains("Dark water-soaked lesions"));

    let handle = state["selected_image"].as_str().unwrap().to_string();
    let image = app.get(&format!("/image/{}", handle), &cookie).await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(image.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn test_reset_clears_cycle_and_image() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    app.post_image(&cookie, "image/jpeg", JPEG).await;
    app.wait_for_phase(&cookie, "completed").await;
    let state = app.wait_for_history(&cookie, 1).await;
    let handle = state["selected_image"].as_str().unwrap().to_string();

    let response = app.post("/reset", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let state = app.state(&cookie).await;
    assert_eq!(state["phase"], "idle");
    assert!(state["predictions"].as_array().unwrap().is_empty());
    assert_eq!(state["history"].as_array().unwrap().len(), 1);

    let image = app.get(&format!("/image/{}", handle), &cookie).await;
    assert_eq!(image.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_submission_while_analyzing_is_rejected() {
    let app = TestApp::seeded(ScriptedPredictor::gated(vec![Ok(vec![prediction(
        "Late Blight",
        92.5,
    )])]));
    let cookie = app.open_session().await;

    let first = app.post_image(&cookie, "image/jpeg", JPEG).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state(&cookie).await["phase"], "submitted");

    let second = app.post_image(&cookie, "image/jpeg", JPEG).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json: serde_json::Value = serde_json::from_str(&body_string(second).await).unwrap();
    assert_eq!(json["error"]["code"], "CONFLICT");

    app.predictor.release();
    app.wait_for_phase(&cookie, "completed").await;
    app.wait_for_history(&cookie, 1).await;
    assert_eq!(app.predictor.calls(), 1);
    assert_eq!(app.store.history_len(), 1);
}

#[tokio::test]
async fn test_reset_during_analysis_discards_late_result() {
    let app = TestApp::seeded(ScriptedPredictor::gated(vec![Ok(vec![prediction(
        "Late Blight",
        92.5,
    )])]));
    let cookie = app.open_session().await;
    let mut events = app.event_bus.subscribe();

    app.post_image(&cookie, "image/jpeg", JPEG).await;
    app.post("/reset", &cookie).await;
    app.predictor.release();

    let discarded = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(CropEvent::AnalysisDiscarded { .. }) = events.recv().await {
                break;
            }
        }
    })
    .await;
    assert!(discarded.is_ok(), "late result was not discarded");

    let state = app.state(&cookie).await;
    assert_eq!(state["phase"], "idle");
    assert!(state["predictions"].as_array().unwrap().is_empty());
    assert_eq!(app.store.history_len(), 0);
}

#[tokio::test]
async fn test_prediction_failure_shows_message() {
    let app = TestApp::seeded(ScriptedPredictor::new(vec![Err(Error::Service {
        status: 500,
        message: "model offline".to_string(),
    })]));
    let cookie = app.open_session().await;

    app.post_image(&cookie, "image/jpeg", JPEG).await;
    let state = app.wait_for_phase(&cookie, "failed").await;
    assert_eq!(state["error"], "Failed to analyze image. Please try again.");
    assert!(state["predictions"].as_array().unwrap().is_empty());
    assert_eq!(app.store.history_len(), 0);

    let page = body_string(app.get("/", &cookie).await).await;
    assert!(page.contains("Failed to analyze image. Please try again."));
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app.post_image(&cookie, "text/plain", b"hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.state(&cookie).await["phase"], "idle");
    assert_eq!(app.predictor.calls(), 0);
}

#[tokio::test]
async fn test_navigation_toggles_screens() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app.post("/navigate/library", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state(&cookie).await["active_screen"], "library");
    let page = body_string(app.get("/", &cookie).await).await;
    assert!(page.contains("Disease Library"));
    assert!(page.contains("Early Blight"));

    app.post("/navigate/library", &cookie).await;
    assert_eq!(app.state(&cookie).await["active_screen"], "analyze");

    app.post("/navigate/learn_more", &cookie).await;
    assert_eq!(app.state(&cookie).await["active_screen"], "learn_more");

    let unknown = app.post("/navigate/settings", &cookie).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_requires_sign_in() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    app.post("/navigate/dashboard", &cookie).await;
    assert_eq!(app.state(&cookie).await["active_screen"], "analyze");

    let response = app.get("/dashboard", &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("Sign In Required"));
}

#[tokio::test]
async fn test_library_filter_and_cache() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let page = body_string(app.get("/library?crop=Tomato&q=blight", &cookie).await).await;
    assert!(page.contains("Late Blight"));
    assert!(!page.contains("Early Blight"));
    assert!(!page.contains("Leaf Mold"));

    let page = body_string(app.get("/library?q=rings", &cookie).await).await;
    assert!(page.contains("Early Blight"));

    let page = body_string(app.get("/library?crop=Corn", &cookie).await).await;
    assert!(page.contains("No diseases found matching your criteria"));

    assert_eq!(app.store.list_disease_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_library_detail() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app.get("/library/2", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("Early Blight"));
    assert!(page.contains("Concentric brown rings"));

    let missing = app.get("/library/999", &cookie).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guidance_from_store_and_fallback() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let stored = body_string(app.get("/guidance?disease=Late%20Blight", &cookie).await).await;
    assert!(stored.contains("Remove infected foliage"));

    let fallback = body_string(app.get("/guidance?disease=Rust", &cookie).await).await;
    assert!(fallback.contains("Immediate Actions"));

    let missing = app.get("/guidance", &cookie).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_up_validation_message() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app
        .post_form(
            "/auth/signup",
            &cookie,
            &[("full_name", ""), ("email", "a@farm.test"), ("password", "secret1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Please enter your full name"));

    let response = app
        .post_form(
            "/auth/signup",
            &cookie,
            &[("full_name", "Ada"), ("email", "a@farm.test"), ("password", "abc")],
        )
        .await;
    assert!(body_string(response)
        .await
        .contains("Password must be at least 6 characters"));

    assert_eq!(app.auth.sign_up_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.state(&cookie).await["signed_in"], false);
}

#[tokio::test]
async fn test_sign_up_then_dashboard() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app
        .post_form(
            "/auth/signup",
            &cookie,
            &[("full_name", "Ada Farmer"), ("email", "ada@farm.test"), ("password", "secret1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.state(&cookie).await["signed_in"], true);

    let page = body_string(app.get("/dashboard", &cookie).await).await;
    assert!(page.contains("My Dashboard"));
    assert!(page.contains("Ada Farmer"));

    app.post("/auth/signout", &cookie).await;
    assert_eq!(app.state(&cookie).await["signed_in"], false);
}

#[tokio::test]
async fn test_sign_in_failure_shows_provider_message() {
    let app = TestApp::new(
        late_blight(),
        MemoryStore::seeded(),
        FakeAuth::with_account("ada@farm.test", "secret1", "Ada Farmer"),
    );
    let cookie = app.open_session().await;

    let response = app
        .post_form(
            "/auth/signin",
            &cookie,
            &[("email", "ada@farm.test"), ("password", "wrong-pass")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("Invalid login credentials"));
    assert!(page.contains("ada@farm.test"));
    assert_eq!(app.state(&cookie).await["signed_in"], false);
}

#[tokio::test]
async fn test_treatment_logging() {
    let app = TestApp::new(
        late_blight(),
        MemoryStore::seeded(),
        FakeAuth::with_account("ada@farm.test", "secret1", "Ada Farmer"),
    );
    let cookie = app.open_session().await;

    let anonymous = app
        .post_form("/treatments", &cookie, &[("treatment_type", "organic")])
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_form(
            "/auth/signin",
            &cookie,
            &[("email", "ada@farm.test"), ("password", "secret1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .post_form(
            "/treatments",
            &cookie,
            &[
                ("analysis_id", ""),
                ("treatment_type", "organic"),
                ("products_used", "Neem oil, Copper soap"),
                ("application_date", "2026-05-01"),
                ("cost", "12.5"),
                ("field_size_treated", "2"),
                ("effectiveness_rating", "4"),
                ("notes", "Evening spray"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/dashboard?tab=treatments"));

    {
        let stored = app.store.treatments.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, "user-ada@farm.test");
        assert_eq!(stored[0].products_used, vec!["Neem oil", "Copper soap"]);
        assert_eq!(stored[0].effectiveness_rating, Some(4));
        assert!(stored[0].analysis_id.is_none());
    }

    let page = body_string(app.get("/dashboard?tab=treatments", &cookie).await).await;
    assert!(page.contains("Neem oil"));

    let invalid = app
        .post_form(
            "/treatments",
            &cookie,
            &[("treatment_type", "organic"), ("effectiveness_rating", "9")],
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::OK);
    assert!(body_string(invalid)
        .await
        .contains("Effectiveness rating must be between 0 and 5"));
    assert_eq!(app.store.treatments.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_event_stream_headers() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;

    let response = app.get("/api/events", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_session_count_stays_within_limit() {
    let limits = SessionLimits {
        max_sessions: 3,
        ..SessionLimits::default()
    };
    let app = TestApp::with_limits(late_blight(), MemoryStore::seeded(), FakeAuth::default(), limits);

    let mut cookies = Vec::new();
    for _ in 0..6 {
        cookies.push(app.open_session().await);
    }
    assert_eq!(app.sessions.len().await, 3);

    let health = app.get("/health", "").await;
    let json: serde_json::Value = serde_json::from_str(&body_string(health).await).unwrap();
    assert_eq!(json["sessions"], 3);

    // Newest browser kept, oldest dropped
    let newest = app.get("/", cookies.last().unwrap()).await;
    assert!(session_cookie(&newest).is_none());
    let oldest = app.get("/", &cookies[0]).await;
    assert!(session_cookie(&oldest).is_some());
    assert_eq!(app.sessions.len().await, 3);
}

#[tokio::test]
async fn test_idle_sessions_are_dropped() {
    let app = TestApp::seeded(late_blight());
    let cookie = app.open_session().await;
    assert_eq!(app.sessions.len().await, 1);

    // Recently seen sessions survive a sweep
    assert_eq!(app.sessions.evict_idle().await, 0);

    let later = Instant::now() + app.sessions.limits().idle_timeout + Duration::from_secs(1);
    assert_eq!(app.sessions.evict_idle_at(later).await, 1);
    assert!(app.sessions.is_empty().await);

    let revisit = app.get("/", &cookie).await;
    assert_eq!(revisit.status(), StatusCode::OK);
    let fresh = session_cookie(&revisit).expect("dropped session gets a new cookie");
    assert_ne!(fresh, cookie);
}

#[tokio::test]
async fn test_history_unavailable_on_first_visit() {
    let store = MemoryStore::seeded();
    store.fail_history.store(true, Ordering::SeqCst);
    let app = TestApp::new(late_blight(), store, FakeAuth::default());

    let cookie = app.open_session().await;
    let state = app.state(&cookie).await;
    assert_eq!(state["phase"], "idle");
    assert!(state["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_history_refresh_keeps_previous_list() {
    let app = TestApp::seeded(ScriptedPredictor::new(vec![
        Ok(vec![prediction("Late Blight", 92.5)]),
        Ok(vec![prediction("Leaf Mold", 61.0)]),
    ]));
    let cookie = app.open_session().await;

    app.post_image(&cookie, "image/jpeg", JPEG).await;
    app.wait_for_phase(&cookie, "completed").await;
    app.wait_for_history(&cookie, 1).await;

    app.store.fail_history.store(true, Ordering::SeqCst);
    app.post("/reset", &cookie).await;
    app.post_image(&cookie, "image/jpeg", JPEG).await;
    app.wait_for_phase(&cookie, "completed").await;
    for _ in 0..200 {
        if app.store.history_len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.store.history_len(), 2);

    let state = app.state(&cookie).await;
    assert_eq!(state["phase"], "completed");
    assert_eq!(state["predictions"][0]["disease"], "Leaf Mold");
    let history = state["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["disease_detected"], "Late Blight");
}
