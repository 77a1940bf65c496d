//! Shared test utilities for esconn integration tests.
//!
//! Two kinds of node are available:
//! - **Mock cluster**: an in-process axum server that answers `/` the way an
//!   Elasticsearch node does, counts requests, and can be told to fail.
//!   Cheap enough to start one per test.
//! - **Real node**: one Elasticsearch instance shared per test binary.
//!   `ESCONN_TEST_ES_ADDR` (`host:port`) points at an external node;
//!   otherwise a container is started via testcontainers.
//!
//! [`capture_logs`] records formatted tracing output for assertions.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::elastic_search::ElasticSearch;
use tokio::sync::{OnceCell, oneshot};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use esconn_client::ConnectionParams;

// ---------------------------------------------------------------------------
// Mock cluster
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MockState {
    hits: Arc<AtomicUsize>,
    status: Arc<AtomicU16>,
}

/// A running mock node. Shut down when dropped.
pub struct MockCluster {
    addr: SocketAddr,
    state: MockState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockCluster {
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connection params addressing this node.
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams::new(self.host(), self.port())
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Make subsequent requests answer with `status`.
    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }
}

impl Drop for MockCluster {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Body returned by the mock for `GET /`.
pub fn mock_cluster_info() -> serde_json::Value {
    serde_json::json!({
        "name": "mock-node",
        "cluster_name": "esconn-mock",
        "cluster_uuid": "mock-uuid",
        "version": { "number": "7.17.0" },
        "tagline": "You Know, for Search"
    })
}

async fn root(State(state): State<MockState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        (status, Json(mock_cluster_info())).into_response()
    } else {
        let body = serde_json::json!({ "error": "mock failure", "status": status.as_u16() });
        (status, Json(body)).into_response()
    }
}

/// Start a mock node on an ephemeral loopback port.
///
/// `GET /` (and therefore `HEAD /`) answers 200 with [`mock_cluster_info`]
/// until [`MockCluster::respond_with`] changes the status.
pub async fn spawn_mock_cluster() -> MockCluster {
    let state = MockState {
        hits: Arc::new(AtomicUsize::new(0)),
        status: Arc::new(AtomicU16::new(200)),
    };
    let app = Router::new()
        .route("/", get(root))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("failed to bind mock cluster listener");
    let addr = listener
        .local_addr()
        .expect("failed to read mock cluster address");

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .expect("mock cluster server failed");
    });

    MockCluster {
        addr,
        state,
        shutdown: Some(tx),
    }
}

/// A loopback port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener =
        StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("failed to bind probe listener");
    listener
        .local_addr()
        .expect("failed to read probe address")
        .port()
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Lines whose message is exactly `message`, with any fields after it.
    pub fn lines_with_message(&self, message: &str) -> Vec<String> {
        let needle = format!(": {message}");
        self.contents()
            .lines()
            .filter(|line| {
                line.split_once(&needle).is_some_and(|(_, rest)| {
                    rest.split_whitespace()
                        .next()
                        .is_none_or(|token| token.contains('='))
                })
            })
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Record events matching `filter` (an `EnvFilter` directive) on the current
/// thread until the guard is dropped.
///
/// `#[tokio::test]` runs on a current-thread runtime, so async code under
/// test logs through the capture too.
pub fn capture_logs(filter: &str) -> (CapturedLogs, DefaultGuard) {
    let captured = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(captured.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

// ---------------------------------------------------------------------------
// Real node
// ---------------------------------------------------------------------------

struct SharedEs {
    host: String,
    port: u16,
    /// Held to keep the container alive. `None` when using an external node.
    _container: Option<ContainerAsync<ElasticSearch>>,
}

static SHARED_ES: OnceCell<SharedEs> = OnceCell::const_new();

async fn init_shared_es() -> SharedEs {
    if let Ok(addr) = std::env::var("ESCONN_TEST_ES_ADDR") {
        let (host, port) = addr
            .rsplit_once(':')
            .expect("ESCONN_TEST_ES_ADDR must be host:port");
        return SharedEs {
            host: host.to_owned(),
            port: port.parse().expect("ESCONN_TEST_ES_ADDR port must be numeric"),
            _container: None,
        };
    }

    let container = ElasticSearch::default()
        .start()
        .await
        .expect("failed to start Elasticsearch container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(9200)
        .await
        .expect("failed to get mapped port");

    SharedEs {
        host: host.to_string(),
        port,
        _container: Some(container),
    }
}

/// Connection params for the shared real node.
///
/// Lazily starts a container on first call unless `ESCONN_TEST_ES_ADDR` is set.
pub async fn es_params() -> ConnectionParams {
    let shared = SHARED_ES.get_or_init(init_shared_es).await;
    ConnectionParams::new(shared.host.clone(), shared.port)
}
