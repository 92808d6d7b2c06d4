//! Test server harness for E2E testing
//!
//! Provides TestPortalServer for spawning real Portal API instances in
//! tests, backed by the in-memory store.

use chrono::Duration;
use metrics_exporter_prometheus::PrometheusBuilder;
use portal_service::config::Config;
use portal_service::handlers::auth_handler::AppState;
use portal_service::models::{User, Verification};
use portal_service::repositories::{users, verifications};
use portal_service::routes;
use portal_service::security;
use portal_service::services::mailer::Mailer;
use portal_service::store::{field_filter, MemoryStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::fixtures::test_config;

/// Test harness for spawning the Portal API in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_signup_e2e() -> Result<(), anyhow::Error> {
///     let server = TestPortalServer::spawn().await?;
///
///     let response = server
///         .client()
///         .post(server.api("/auth/signup"))
///         .json(&signup_body)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestPortalServer {
    addr: SocketAddr,
    store: Arc<dyn Store>,
    config: Config,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestPortalServer {
    /// Spawn a new test server instance with an isolated in-memory store
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs
    /// the real router in the background. Email delivery is disabled by
    /// the test configuration (no API key).
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let config = test_config();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mailer = Mailer::new(&config);

        // A process-wide recorder can only be installed once; later
        // spawns in the same test binary fall back to a standalone one.
        let metrics_handle = match portal_service::observability::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let state = Arc::new(AppState {
            store: store.clone(),
            config: config.clone(),
            mailer,
        });

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Build a URL under the `/api/v1` prefix
    pub fn api(&self, path: &str) -> String {
        format!("http://{}/api/v1{}", self.addr, path)
    }

    /// Get the shared HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Get the server's store handle (for seeding and inspection)
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed a user directly in the store.
    ///
    /// Bypasses the signup flow so tests can control the role flags.
    pub async fn seed_user(
        &self,
        username: &str,
        password: &str,
        superuser: bool,
        verified: bool,
    ) -> Result<User, anyhow::Error> {
        let hashed = security::hash_password(password, self.config.bcrypt_cost)?;
        let mut user = users::create(self.store.as_ref(), username, None, &hashed).await?;

        user.is_superuser = superuser;
        user.is_verified = verified;
        let user = users::save(self.store.as_ref(), user).await?;

        Ok(user)
    }

    /// Issue a bearer token for a username, signed with the server secret
    pub fn token_for(&self, username: &str) -> Result<String, anyhow::Error> {
        let token = security::issue_access_token(
            username,
            Duration::minutes(self.config.access_token_ttl_minutes),
            &self.config.secret_key,
        )?;
        Ok(token)
    }

    /// Seed a verified superuser and return it with a usable token
    pub async fn seed_superuser(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), anyhow::Error> {
        let user = self.seed_user(username, password, true, true).await?;
        let token = self.token_for(username)?;
        Ok((user, token))
    }

    /// The pending verification code for a user, as the emailed link would
    /// carry it
    pub async fn verification_code_for(
        &self,
        user_key: &str,
    ) -> Result<Option<String>, anyhow::Error> {
        let filter = field_filter("user_key", user_key);
        let fetched = self
            .store
            .fetch(verifications::COLLECTION, Some(&filter))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch verifications: {}", e))?;

        let Some(doc) = fetched.items.into_iter().next() else {
            return Ok(None);
        };

        let verification: Verification = serde_json::from_value(doc)?;
        Ok(verification.key)
    }
}

impl Drop for TestPortalServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so the port frees up as soon as the
        // test completes.
        self._handle.abort();
    }
}
