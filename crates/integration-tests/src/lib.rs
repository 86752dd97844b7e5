//! Integration tests for Frenos.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p frenos-integration-tests
//!
//! # Including the tests that need PostgreSQL
//! DATABASE_URL=postgres://localhost/frenos_test \
//!     cargo test -p frenos-integration-tests -- --include-ignored
//! ```
//!
//! Each test starts the real application in-process on an ephemeral port,
//! with its files in a fresh temporary directory, and talks to it through a
//! `reqwest` client that keeps cookies like a browser.
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart API and WhatsApp checkout
//! - `storefront_contact` - Contact form delivery and routing
//! - `storefront_tracker` - Vehicle tracker, backups and per-visitor data
//! - `admin_panel` - Login, settings and uploads (products need `PostgreSQL`)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, routing::post};
use frenos_admin::config::AdminConfig;
use frenos_storefront::config::{ContactEmailConfig, StorefrontConfig};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;

/// Store number used by the test servers.
pub const TEST_WHATSAPP_NUMBER: &str = "+54 9 11 5555-0000";

/// Password accepted by the test admin panel.
pub const TEST_ADMIN_PASSWORD: &str = "clave-de-prueba-larga";

/// A running server and a cookie-keeping client for it.
pub struct TestServer {
    pub base_url: String,
    /// Follows no redirects, so tests can inspect `Location`.
    pub client: reqwest::Client,
    dir: TempDir,
}

impl TestServer {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The server's temporary directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// GET `path` and decode the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        (status, response.json().await.expect("body is not JSON"))
    }

    /// Send `body` as JSON with `method` and decode the JSON answer.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed");
        let status = response.status();
        (status, response.json().await.expect("body is not JSON"))
    }

    /// POST `body` as JSON and decode the JSON answer.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        self.send_json(reqwest::Method::POST, path, body).await
    }
}

/// A new cookie-keeping client, as if a second browser opened the site.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build HTTP client")
}

async fn bind() -> (tokio::net::TcpListener, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    (listener, addr)
}

async fn serve(app: Router, dir: TempDir) -> TestServer {
    let (listener, addr) = bind().await;

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server failed");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        client: browser_client(),
        dir,
    }
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Storefront settings for a server living in `dir`: no database, no
/// contact email.
#[must_use]
pub fn storefront_config(dir: &Path) -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        settings_file: dir.join(".env.local"),
        tracker_data_dir: dir.join("data/tracker"),
        upload_dir: dir.join("uploads"),
        static_dir: PathBuf::from("../storefront/static"),
        whatsapp_number: Some(TEST_WHATSAPP_NUMBER.to_string()),
        contact_email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Start a storefront serving the built-in catalog.
///
/// # Panics
///
/// Panics if the server cannot start.
pub async fn spawn_storefront() -> TestServer {
    let dir = temp_dir();
    let state = frenos_storefront::state::AppState::new(storefront_config(dir.path()), None)
        .expect("failed to build storefront state");
    serve(frenos_storefront::app(state), dir).await
}

/// Stand-in for the hosted email API. Records every message it is asked
/// to send.
#[derive(Clone, Default)]
pub struct MailCatcher {
    sent: Arc<Mutex<Vec<Value>>>,
}

impl MailCatcher {
    /// Bodies of every `POST /emails` received so far.
    ///
    /// # Panics
    ///
    /// Panics if the recording lock is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().expect("mail catcher lock poisoned").clone()
    }

    async fn start(&self) -> String {
        async fn record(State(catcher): State<MailCatcher>, Json(body): Json<Value>) -> Json<Value> {
            catcher
                .sent
                .lock()
                .expect("mail catcher lock poisoned")
                .push(body);
            Json(serde_json::json!({ "id": "test-message" }))
        }

        let app = Router::new()
            .route("/emails", post(record))
            .with_state(self.clone());
        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mail catcher failed");
        });
        format!("http://{addr}")
    }
}

/// Start a storefront whose contact form delivers to a [`MailCatcher`].
///
/// # Panics
///
/// Panics if either server cannot start.
pub async fn spawn_storefront_with_mail() -> (TestServer, MailCatcher) {
    let catcher = MailCatcher::default();
    let api_url = catcher.start().await;

    let dir = temp_dir();
    let config = StorefrontConfig {
        contact_email: Some(ContactEmailConfig {
            api_url,
            api_key: SecretString::from("re_test_key"),
        }),
        ..storefront_config(dir.path())
    };
    let state = frenos_storefront::state::AppState::new(config, None)
        .expect("failed to build storefront state");
    (serve(frenos_storefront::app(state), dir).await, catcher)
}

/// Admin settings for a server living in `dir`.
///
/// # Panics
///
/// Panics if the test password cannot be hashed.
#[must_use]
pub fn admin_config(dir: &Path, database_url: &str) -> AdminConfig {
    let hash = frenos_admin::services::password::hash_password(TEST_ADMIN_PASSWORD)
        .expect("failed to hash test password");

    AdminConfig {
        database_url: SecretString::from(database_url),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        password_hash: SecretString::from(hash),
        settings_file: dir.join(".env.local"),
        upload_dir: dir.join("uploads"),
        static_dir: PathBuf::from("../admin/static"),
        smtp_password: None,
        media: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

/// Start an admin panel with in-memory sessions.
///
/// Without `database_url` the pool never connects, so only the routes that
/// do not touch the database work.
///
/// # Panics
///
/// Panics if the server cannot start.
pub async fn spawn_admin(database_url: Option<&str>) -> TestServer {
    let dir = temp_dir();
    let url = database_url.unwrap_or("postgres://localhost:1/frenos_unused");
    let pool = PgPoolOptions::new()
        .connect_lazy(url)
        .expect("invalid database URL");

    let state = frenos_admin::state::AppState::new(admin_config(dir.path(), url), pool)
        .expect("failed to build admin state");
    let app = frenos_admin::app(state, tower_sessions::MemoryStore::default());
    serve(app, dir).await
}

/// Log the test client into an admin server.
///
/// # Panics
///
/// Panics if the login is not accepted.
pub async fn admin_login(server: &TestServer) {
    let response = server
        .client
        .post(server.url("/auth/login"))
        .form(&[("password", TEST_ADMIN_PASSWORD)])
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/products");
}
