//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use handle_gateway::directory::{Account, AccountDirectory, DirectoryError, MemoryDirectory};
use handle_gateway::http::{build_router, AppState};
use handle_gateway::lifecycle::StateCell;
use handle_gateway::policy::DomainPolicy;
use handle_gateway::resolver::IdentityResolver;
use handle_gateway::GatewayConfig;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const HOSTNAME: &str = "pds.example.com";
pub const ISSUER: &str = "https://issuer.example";

pub fn alice() -> Account {
    Account {
        did: "did:plc:abc123".into(),
        handle: "alice.bsky.social".into(),
    }
}

#[allow(dead_code)]
pub fn alice_example() -> Account {
    Account {
        did: "did:plc:alice-example".into(),
        handle: "alice.example".into(),
    }
}

/// Config served by every test gateway.
#[allow(dead_code)]
pub fn test_config(issuer: Option<&str>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.service.hostname = HOSTNAME.into();
    config.identity.service_handle_domains = vec![".bsky.social".into()];
    config.discovery.issuer = issuer.map(str::to_string);
    config.lifecycle.grace_period_secs = 2;
    config
}

/// Directory wrapper that counts lookups and closes, and can be made to fail.
#[derive(Debug)]
pub struct ProbeDirectory {
    inner: MemoryDirectory,
    pub lookups: AtomicUsize,
    pub migrations: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_lookups: bool,
    pub fail_migrations: bool,
    pub lookup_delay: Duration,
    pub migration_delay: Duration,
}

#[allow(dead_code)]
impl ProbeDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            inner: MemoryDirectory::new(accounts, false),
            lookups: AtomicUsize::new(0),
            migrations: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_lookups: false,
            fail_migrations: false,
            lookup_delay: Duration::ZERO,
            migration_delay: Duration::ZERO,
        }
    }

    pub fn unmigratable() -> Self {
        Self {
            fail_migrations: true,
            ..Self::new(vec![alice()])
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_lookups: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn slow(accounts: Vec<Account>, delay: Duration) -> Self {
        Self {
            lookup_delay: delay,
            ..Self::new(accounts)
        }
    }

    pub fn slow_migration(accounts: Vec<Account>, delay: Duration) -> Self {
        Self {
            migration_delay: delay,
            ..Self::new(accounts)
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn migrations(&self) -> usize {
        self.migrations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Wait until `count` reports at least one call.
    pub async fn wait_until(&self, count: impl Fn(&Self) -> usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while count(self) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("directory was never called");
    }
}

#[async_trait]
impl AccountDirectory for ProbeDirectory {
    async fn get_account(&self, identifier: &str) -> Result<Option<Account>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        if self.fail_lookups {
            return Err(DirectoryError::Unavailable(
                "password authentication failed for user \"pds\"".into(),
            ));
        }
        self.inner.get_account(identifier).await
    }

    async fn migrate_to_latest(&self) -> Result<(), DirectoryError> {
        self.migrations.fetch_add(1, Ordering::SeqCst);
        if !self.migration_delay.is_zero() {
            tokio::time::sleep(self.migration_delay).await;
        }
        if self.fail_migrations {
            return Err(DirectoryError::Unavailable("relation \"kysely_migration\" is locked".into()));
        }
        self.inner.migrate_to_latest().await
    }

    async fn close(&self) -> Result<(), DirectoryError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

/// Build a router over a migrated directory.
#[allow(dead_code)]
pub async fn router(directory: Arc<ProbeDirectory>, issuer: Option<&str>) -> Router {
    directory.migrate_to_latest().await.unwrap();
    let resolver = IdentityResolver::new(
        DomainPolicy::new(HOSTNAME, vec![".bsky.social".into()]),
        directory,
        issuer.map(str::to_string),
    );
    let lifecycle = Arc::new(StateCell::new());
    build_router(
        AppState {
            resolver,
            lifecycle,
        },
        Duration::from_secs(5),
    )
}

/// Issue a GET and return status, headers and JSON body.
#[allow(dead_code)]
pub async fn get(
    router: &Router,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}
