use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gatekeep::{
    config::{Config, HasherConfig},
    repositories::memory::MemoryStore,
    router::build_router,
    state::AppState,
};
use once_cell::sync::Lazy;
use serde_json::{Value, json};

static TEST_CONFIG: Lazy<Config> = Lazy::new(|| Config {
    bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    database_url: None,
    database_pool_size: 1,
    hasher: HasherConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    },
    logout_by_session_id: false,
    cors_origins: vec!["http://localhost:3000".to_string()],
});

static EMAIL_SEQ: AtomicUsize = AtomicUsize::new(0);

// Shared test context
struct TestContext {
    client: reqwest::Client,
    base_url: String,
    store: MemoryStore,
}

impl TestContext {
    async fn start(logout_by_session_id: bool) -> Self {
        let mut config = TEST_CONFIG.clone();
        config.logout_by_session_id = logout_by_session_id;

        let store = MemoryStore::new();
        let state = AppState::with_stores(
            &config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind(config.bind_addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{}", addr),
            store,
        }
    }

    fn unique_email() -> String {
        format!("user{}@example.com", EMAIL_SEQ.fetch_add(1, Ordering::SeqCst))
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn post_raw(&self, path: &str, content_type: &str, body: &str) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", content_type)
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

fn signup_body(email: &str) -> Value {
    json!({
        "firstName": "Margaret",
        "lastName": "Hamilton",
        "email": email,
        "password": "Apollo11",
        "address": "Cambridge, MA",
        "about": "Led the Apollo flight software team.",
        "imageUrl": "https://img.example/mh.png"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signup_login_and_session_lookup() {
        let context = TestContext::start(false).await;
        let email = TestContext::unique_email();

        // Step 1: Signup
        let (status, body) = context.post("/api/auth/signup", signup_body(&email)).await;
        assert_eq!(status, 200, "Signup failed");
        assert!(body["accessToken"].is_string());
        assert_eq!(body["user"]["email"], email.as_str());
        assert_eq!(body["user"]["imageUrl"], "https://img.example/mh.png");
        assert!(body["user"].get("passwordHash").is_none());

        let stored = context.store.stored_password_hash(&email).await.unwrap();
        assert_ne!(stored, "Apollo11");

        // Step 2: Login
        let (status, body) = context
            .post("/api/auth/login", json!({ "email": email, "password": "Apollo11" }))
            .await;
        assert_eq!(status, 200, "Login failed");
        assert_eq!(context.store.session_count().await, 2);
        let token = body["accessToken"].as_str().unwrap().to_string();

        // Step 3: Session lookup
        let (status, body) = context.get(&format!("/api/auth/session/{}", token)).await;
        assert_eq!(status, 200);
        assert_eq!(body["session"]["id"], token.as_str());
        assert_eq!(body["session"]["userId"]["email"], email.as_str());
        assert!(body["session"]["userId"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_signup_user_facing_errors() {
        let context = TestContext::start(false).await;
        let email = TestContext::unique_email();

        let mut missing = signup_body(&email);
        missing["lastName"] = json!("");
        let (status, body) = context.post("/api/auth/signup", missing).await;
        assert_eq!(status, 200);
        assert_eq!(
            body["errorMessage"],
            "All fields are mandatory. Please provide your username, email and password."
        );

        let mut weak = signup_body(&email);
        weak["password"] = json!("apollo11");
        let (status, body) = context.post("/api/auth/signup", weak).await;
        assert_eq!(status, 200);
        assert!(body["errorMessage"].as_str().unwrap().starts_with("Password needs"));

        let mut long_address = signup_body(&email);
        long_address["address"] = json!("x".repeat(31));
        let (status, body) = context.post("/api/auth/signup", long_address).await;
        assert_eq!(status, 200);
        assert!(body["errorMessage"].as_str().unwrap().contains("address"));

        let (status, _) = context.post("/api/auth/signup", signup_body(&email)).await;
        assert_eq!(status, 200);
        let (status, body) = context.post("/api/auth/signup", signup_body(&email)).await;
        assert_eq!(status, 200);
        assert_eq!(
            body["errorMessage"],
            "Username and email need to be unique. Either last name or email is already used."
        );
        assert_eq!(context.store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_login_errors() {
        let context = TestContext::start(false).await;
        let email = TestContext::unique_email();
        context.post("/api/auth/signup", signup_body(&email)).await;

        let (status, body) = context
            .post("/api/auth/login", json!({ "email": "nobody@example.com", "password": "Apollo11" }))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], "Email is not registered. Try with other email.");

        let (status, body) = context
            .post("/api/auth/login", json!({ "email": email, "password": "Apollo12" }))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], "Incorrect password.");

        let (status, body) = context
            .post("/api/auth/login", json!({ "email": "", "password": "" }))
            .await;
        assert_eq!(status, 500);
        assert_eq!(body["errorMessage"], "Please enter both, email and password to login.");

        assert_eq!(context.store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_fatal() {
        let context = TestContext::start(false).await;
        let (status, body) = context
            .get("/api/auth/session/00000000-0000-0000-0000-000000000000")
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], "Session does not exist");
    }

    #[tokio::test]
    async fn test_logout_twice_succeeds() {
        let context = TestContext::start(true).await;
        let email = TestContext::unique_email();
        let (_, body) = context.post("/api/auth/signup", signup_body(&email)).await;
        let token = body["accessToken"].as_str().unwrap().to_string();

        let (status, body) = context
            .post("/api/auth/logout", json!({ "accessToken": token }))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], "User was logged out");
        assert_eq!(body["deletedCount"], 1);

        let (status, body) = context
            .post("/api/auth/logout", json!({ "accessToken": token }))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["deletedCount"], 0);

        let (_, body) = context.get(&format!("/api/auth/session/{}", token)).await;
        assert_eq!(body["errorMessage"], "Session does not exist");
    }

    #[tokio::test]
    async fn test_unreadable_bodies_stay_in_band() {
        let context = TestContext::start(false).await;
        let mandatory =
            "All fields are mandatory. Please provide your username, email and password.";

        let (status, body) = context
            .post_raw(
                "/api/auth/signup",
                "application/json",
                r#"{"lastName":"Doe","email":null,"password":"Abc123"}"#,
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], mandatory);

        let (status, body) = context
            .post_raw(
                "/api/auth/signup",
                "application/x-www-form-urlencoded",
                "lastName=Doe&email=a%40b.c&password=Abc123",
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], mandatory);

        let (status, body) = context
            .post_raw(
                "/api/auth/login",
                "application/json",
                r#"{"email":null,"password":"Abc123"}"#,
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["errorMessage"], "Email is not registered. Try with other email.");

        let (status, body) = context.post_raw("/api/auth/logout", "text/plain", "token").await;
        assert_eq!(status, 200);
        assert_eq!(body["deletedCount"], 0);
        assert_eq!(context.store.user_count().await, 0);
    }
}
