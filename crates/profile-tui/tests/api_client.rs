use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};

use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use profile_shared::api::{AuthResponse, LoginRequest, RefreshRequest};
use profile_tui::api::{ApiAdapter, ApiClient, AuthTokens, ApiError, ProfileSource, SessionService, SignOutOptions};
use profile_tui::nav::{Navigator, Route};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

async fn login(Json(req): Json<LoginRequest>) -> Result<Json<AuthResponse>, StatusCode> {
    if req.password != "secret" {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let access_token = match req.email.as_str() {
        "stale@x.com" => "stale".to_string(),
        "expiring@x.com" => expiring_jwt(),
        _ => "access-1".to_string(),
    };
    Ok(Json(AuthResponse {
        access_token,
        refresh_token: "refresh-1".to_string(),
        user_id: "u1".to_string(),
    }))
}

/// JWT whose `exp` falls inside the client's refresh window
fn expiring_jwt() -> String {
    let exp = chrono::Utc::now().timestamp() + 5;
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
}

async fn spawn_server(profile_body: Value, refresh_ok: bool) -> SocketAddr {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route(
            "/api/auth/refresh",
            post(move |Json(req): Json<RefreshRequest>| async move {
                if !refresh_ok || req.refresh_token != "refresh-1" {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(AuthResponse {
                    access_token: "access-1".to_string(),
                    refresh_token: "refresh-2".to_string(),
                    user_id: "u1".to_string(),
                }))
            }),
        )
        .route("/api/auth/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/user/profile",
            get(move |headers: HeaderMap| {
                let body = profile_body.clone();
                async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer access-1");
                    if authorized {
                        Ok(Json(body))
                    } else {
                        Err(StatusCode::UNAUTHORIZED)
                    }
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn ana_json() -> Value {
    json!({
        "userId": "u1",
        "firstName": "Ana",
        "lastName": "Diaz",
        "email": "ana@x.com",
        "createdAt": "2023-03-15T00:00:00Z"
    })
}

fn client_for(addr: SocketAddr, dir: &tempfile::TempDir) -> ApiClient {
    ApiClient::new(&format!("http://{}", addr), dir.path().join("auth.json"))
}

#[tokio::test]
async fn login_then_fetch_profile_with_bearer_token() {
    let addr = spawn_server(ana_json(), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    client.login("ana@x.com", "secret").await.unwrap();
    assert!(client.is_authenticated());
    assert_eq!(client.user_id(), Some("u1"));
    assert!(dir.path().join("auth.json").exists());

    let profile = client.fetch_profile().await.unwrap();
    assert_eq!(profile.display_name(), "Ana Diaz");
    assert_eq!(profile.phone(), None);

    // Tokens survive a restart
    let mut restarted = client_for(addr, &dir);
    assert!(restarted.load_tokens().unwrap());
    assert_eq!(restarted.fetch_profile().await.unwrap().user_id, "u1");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let addr = spawn_server(ana_json(), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    let err = client.login("ana@x.com", "nope").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let addr = spawn_server(ana_json(), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    client.login("stale@x.com", "secret").await.unwrap();
    let err = client.fetch_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn incomplete_profile_payload_is_a_decode_error() {
    let addr = spawn_server(json!({ "userId": "u1", "firstName": "Ana" }), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    client.login("ana@x.com", "secret").await.unwrap();
    let err = client.fetch_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn expiring_token_is_refreshed_before_fetch() {
    let addr = spawn_server(ana_json(), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    client.login("expiring@x.com", "secret").await.unwrap();
    let profile = client.fetch_profile().await.unwrap();
    assert_eq!(profile.user_id, "u1");

    let stored = AuthTokens::load(&dir.path().join("auth.json")).unwrap().unwrap();
    assert_eq!(stored.access_token, "access-1");
    assert_eq!(stored.refresh_token, "refresh-2");
}

#[tokio::test]
async fn rejected_refresh_is_unauthorized() {
    let addr = spawn_server(ana_json(), false).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);

    client.login("expiring@x.com", "secret").await.unwrap();
    let err = client.fetch_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut client = ApiClient::new("http://127.0.0.1:1", dir.path().join("auth.json"));

    let err = client.login("ana@x.com", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[derive(Default)]
struct RecordingNavigator(StdMutex<Vec<Route>>);

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.0.lock().unwrap().push(route);
    }
}

#[tokio::test]
async fn adapter_fetches_and_signs_out() {
    let addr = spawn_server(ana_json(), true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = client_for(addr, &dir);
    client.login("ana@x.com", "secret").await.unwrap();

    let client = Arc::new(Mutex::new(client));
    let navigator = Arc::new(RecordingNavigator::default());
    let adapter = ApiAdapter::new(client.clone(), navigator.clone());

    let profile = adapter.fetch_profile().await.unwrap();
    assert_eq!(profile.email, "ana@x.com");

    adapter
        .sign_out(SignOutOptions { redirect: false })
        .await
        .unwrap();
    assert!(navigator.0.lock().unwrap().is_empty());
    assert!(!client.lock().await.is_authenticated());
    assert!(!dir.path().join("auth.json").exists());

    adapter
        .sign_out(SignOutOptions { redirect: true })
        .await
        .unwrap();
    assert_eq!(*navigator.0.lock().unwrap(), vec![Route::Login]);

    let err = adapter.fetch_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}
