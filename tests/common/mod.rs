//! Common test utilities for E2E tests

use kwikportal::{AppState, config};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "test-secret-key";
pub const TEST_ISSUER: &str = "kwikportal-test";
pub const TEST_AUDIENCE: &str = "kwikportal-test-web";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Configuration pointing every path into `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            request_timeout_seconds: 30,
        },
        database: config::DatabaseConfig {
            path: temp_dir.path().join("test.db"),
        },
        auth: config::AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            jwt_issuer: TEST_ISSUER.to_string(),
            jwt_audience: TEST_AUDIENCE.to_string(),
            token_ttl_seconds: None,
            enforce_expiration: false,
            bcrypt_cost: 4,
        },
        upload: config::UploadConfig {
            temp_dir: temp_dir.path().join("uploads"),
            max_bytes: 1024 * 1024,
        },
        cache: config::CacheConfig {
            bookmark_lists_max_users: 100,
            ttl_seconds: 60,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        kwikportal::metrics::init_metrics();

        // Create temporary directory for database and upload spool
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = kwikportal::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST /signup
    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signup"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// POST /login
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Register an account and return a bearer token for it
    pub async fn create_user_token(&self, email: &str) -> String {
        let response = self.signup(email, "correct horse").await;
        assert_eq!(response.status(), 201);

        let response = self.login(email, "correct horse").await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// POST /bookmarks/upload with `html` as the `bookmarkFile` part
    pub async fn upload(&self, token: &str, html: impl AsRef<[u8]>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(html.as_ref().to_vec())
            .file_name("bookmarks.html")
            .mime_str("text/html")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("bookmarkFile", part);

        self.client
            .post(self.url("/bookmarks/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// GET /bookmarks, asserting success
    pub async fn list_bookmarks(&self, token: &str) -> Vec<Value> {
        let response = self
            .client
            .get(self.url("/bookmarks"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }
}

/// A small browser export with one duplicate URL
pub const SAMPLE_EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1600000000">Toolbar</H3>
    <DL><p>
        <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="1600000001" ICON="data:image/png;base64,AAAA">Rust</A>
        <DT><A HREF="https://docs.rs/" ADD_DATE="1600000002">Docs</A>
    </DL><p>
    <DT><A HREF="https://crates.io/" ADD_DATE="1600000003">Crates</A>
    <DT><A HREF="https://docs.rs/" ADD_DATE="1600000004">Docs again</A>
</DL><p>
"#;
