//! Test Helper Utilities
//!
//! In-memory stand-ins for the hosted backend plus request helpers for
//! driving the router with `oneshot`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use cropai_common::events::EventBus;
use cropai_common::models::{
    AnalysisRecord, AuthSession, AuthUser, DiseaseInfo, NewAnalysisRecord, NewTreatmentLog,
    Prediction, Priority, Solution, TreatmentLog,
};
use cropai_common::{Error, Result};
use cropai_ui::api::session::SESSION_COOKIE;
use cropai_ui::session::{SessionLimits, SessionRegistry};
use cropai_ui::services::{
    AuthService, ImageUpload, PersistenceService, PredictionService, SignUpOutcome,
};
use cropai_ui::{build_router, AppState, EVENT_BUS_CAPACITY};
use http_body_util::BodyExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "cropai-test-boundary";

/// Predictor that answers from a script; optionally waits for `release()`
pub struct ScriptedPredictor {
    replies: Mutex<VecDeque<Result<Vec<Prediction>>>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl ScriptedPredictor {
    pub fn new(replies: Vec<Result<Vec<Prediction>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(replies: Vec<Result<Vec<Prediction>>>) -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::new(replies)
        }
    }

    /// Let one waiting prediction finish
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionService for ScriptedPredictor {
    async fn predict(&self, _image: &ImageUpload) -> Result<Vec<Prediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Store backed by vectors
#[derive(Default)]
pub struct MemoryStore {
    pub history: Mutex<Vec<AnalysisRecord>>,
    pub diseases: Vec<DiseaseInfo>,
    pub solutions: Vec<Solution>,
    pub treatments: Mutex<Vec<TreatmentLog>>,
    pub list_disease_calls: AtomicUsize,
    /// When set, `list_history` fails like an unreachable store
    pub fail_history: AtomicBool,
}

impl MemoryStore {
    pub fn seeded() -> Self {
        Self {
            diseases: vec![
                disease("1", "Late Blight", "Tomato", "Dark water-soaked lesions"),
                disease("2", "Early Blight", "Potato", "Concentric brown rings"),
                disease("3", "Leaf Mold", "Tomato", "Yellow patches on upper leaf"),
            ],
            solutions: vec![
                solution("Late Blight", "organic", "Copper spray", Priority::Medium),
                solution("Late Blight", "immediate", "Remove infected foliage", Priority::High),
            ],
            ..Self::default()
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

pub fn disease(id: &str, name: &str, crop: &str, symptoms: &str) -> DiseaseInfo {
    DiseaseInfo {
        id: id.to_string(),
        name: name.to_string(),
        crop_type: crop.to_string(),
        symptoms: symptoms.to_string(),
        causes: "Fungal pathogen".to_string(),
        prevention: "Rotate crops".to_string(),
        treatment: "Apply fungicide".to_string(),
        severity: "High".to_string(),
        affected_parts: vec!["Leaves".to_string()],
        optimal_conditions: "Cool and wet".to_string(),
    }
}

pub fn solution(disease: &str, category: &str, title: &str, priority: Priority) -> Solution {
    Solution {
        id: format!("{}-{}", category, title),
        disease_name: disease.to_string(),
        category: category.to_string(),
        title: title.to_string(),
        description: String::new(),
        items: vec!["Step one".to_string()],
        priority,
    }
}

pub fn prediction(disease: &str, confidence: f64) -> Prediction {
    Prediction {
        disease: disease.to_string(),
        confidence,
    }
}

#[async_trait]
impl PersistenceService for MemoryStore {
    async fn insert_analysis(&self, record: &NewAnalysisRecord) -> Result<Option<AnalysisRecord>> {
        let mut history = self.history.lock().unwrap();
        let stored = AnalysisRecord {
            id: format!("a{}", history.len() + 1),
            disease_detected: record.disease_detected.clone(),
            confidence: record.confidence,
            analyzed_at: Utc::now(),
        };
        history.insert(0, stored.clone());
        Ok(Some(stored))
    }

    async fn list_history(&self) -> Result<Vec<AnalysisRecord>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Error::Service {
                status: 503,
                message: "history unavailable".to_string(),
            });
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn list_diseases(&self) -> Result<Vec<DiseaseInfo>> {
        self.list_disease_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.diseases.clone())
    }

    async fn disease_by_name(&self, name: &str) -> Result<Option<DiseaseInfo>> {
        Ok(self.diseases.iter().find(|d| d.name == name).cloned())
    }

    async fn search_diseases(&self, query: &str) -> Result<Vec<DiseaseInfo>> {
        let needle = query.to_lowercase();
        Ok(self
            .diseases
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn solutions_for(&self, disease_name: &str) -> Result<Vec<Solution>> {
        Ok(self
            .solutions
            .iter()
            .filter(|s| s.disease_name == disease_name)
            .cloned()
            .collect())
    }

    async fn insert_treatment(
        &self,
        caller: &AuthSession,
        log: &NewTreatmentLog,
    ) -> Result<Option<TreatmentLog>> {
        let mut treatments = self.treatments.lock().unwrap();
        let stored = TreatmentLog {
            id: format!("t{}", treatments.len() + 1),
            user_id: caller.user.id.clone(),
            analysis_id: log.analysis_id.clone(),
            treatment_type: log.treatment_type,
            products_used: log.products_used.clone(),
            application_date: log.application_date,
            cost: log.cost,
            field_size_treated: log.field_size_treated,
            effectiveness_rating: log.effectiveness_rating,
            notes: log.notes.clone(),
            created_at: Utc::now(),
        };
        treatments.push(stored.clone());
        Ok(Some(stored))
    }

    async fn list_treatments(
        &self,
        caller: &AuthSession,
        analysis_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TreatmentLog>> {
        let mut logs: Vec<TreatmentLog> = self
            .treatments
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == caller.user.id)
            .filter(|t| analysis_id.map_or(true, |id| t.analysis_id.as_deref() == Some(id)))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.application_date.cmp(&a.application_date));
        logs.truncate(limit);
        Ok(logs)
    }
}

/// Auth provider with an in-memory account table
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    pub require_confirmation: bool,
    pub sign_up_calls: AtomicUsize,
}

impl FakeAuth {
    pub fn with_account(email: &str, password: &str, full_name: &str) -> Self {
        let auth = Self::default();
        auth.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), user(email, full_name)),
        );
        auth
    }
}

fn user(email: &str, full_name: &str) -> AuthUser {
    AuthUser {
        id: format!("user-{}", email),
        email: Some(email.to_string()),
        full_name: Some(full_name.to_string()),
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<SignUpOutcome> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(Error::Service {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let new_user = user(email, full_name);
        accounts.insert(email.to_string(), (password.to_string(), new_user.clone()));
        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        Ok(SignUpOutcome::SignedIn(AuthSession {
            access_token: format!("token-{}", email),
            user: new_user,
        }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => Ok(AuthSession {
                access_token: format!("token-{}", email),
                user: user.clone(),
            }),
            _ => Err(Error::Service {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_out(&self, _session: &AuthSession) -> Result<()> {
        Ok(())
    }
}

/// Router plus handles on its collaborators
pub struct TestApp {
    pub router: Router,
    pub predictor: Arc<ScriptedPredictor>,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<FakeAuth>,
    pub event_bus: EventBus,
    pub sessions: SessionRegistry,
}

impl TestApp {
    pub fn new(predictor: ScriptedPredictor, store: MemoryStore, auth: FakeAuth) -> Self {
        Self::with_limits(predictor, store, auth, SessionLimits::default())
    }

    pub fn with_limits(
        predictor: ScriptedPredictor,
        store: MemoryStore,
        auth: FakeAuth,
        limits: SessionLimits,
    ) -> Self {
        let predictor = Arc::new(predictor);
        let store = Arc::new(store);
        let auth = Arc::new(auth);
        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
        let state = AppState::new(
            predictor.clone(),
            store.clone(),
            auth.clone(),
            event_bus.clone(),
            limits,
        );
        let sessions = state.sessions.clone();
        Self {
            router: build_router(state),
            predictor,
            store,
            auth,
            event_bus,
            sessions,
        }
    }

    pub fn seeded(predictor: ScriptedPredictor) -> Self {
        Self::new(predictor, MemoryStore::seeded(), FakeAuth::default())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, cookie: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_image(&self, cookie: &str, content_type: &str, bytes: &[u8]) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body("leaf.jpg", content_type, bytes)))
            .unwrap();
        self.send(request).await
    }

    /// Open a session and return its cookie header value
    pub async fn open_session(&self) -> String {
        let response = self
            .send(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response).expect("first visit sets the session cookie")
    }

    pub async fn state(&self, cookie: &str) -> serde_json::Value {
        let response = self.get("/api/state", cookie).await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    /// Poll `/api/state` until `phase` matches
    pub async fn wait_for_phase(&self, cookie: &str, phase: &str) -> serde_json::Value {
        for _ in 0..200 {
            let state = self.state(cookie).await;
            if state["phase"] == phase {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached phase {}", phase);
    }

    /// Poll `/api/state` until the history holds `len` records
    ///
    /// The store write and history refresh run after the phase flips to
    /// `completed`, so tests that check history wait here.
    pub async fn wait_for_history(&self, cookie: &str, len: usize) -> serde_json::Value {
        for _ in 0..200 {
            let state = self.state(cookie).await;
            if state["history"].as_array().map(Vec::len) == Some(len) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("history never reached {} records", len);
    }
}

/// `name=value` pair for a `Cookie` header, taken from `Set-Cookie`
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            other => format!("%{:02X}", other),
        })
        .collect()
}

pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn multipart_body(file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{f}\"\r\nContent-Type: {c}\r\n\r\n",
        b = BOUNDARY,
        f = file_name,
        c = content_type,
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
