//! Shared test utilities: sample documents and a mock configuration server.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Response, StatusCode};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const LOCAL_DOC: &str = r#"tweaks:
  - feature: F
    categories:
      - category: C
        items:
          - name: X
            purpose: Local copy of X.
            enabled: true
            true: echo x-on
            false: echo x-off
theme:
  mode: dark
"#;

pub const REMOTE_DOC: &str = r#"tweaks:
  - feature: F
    categories:
      - category: C
        items:
          - name: X
            purpose: Updated description of X.
            enabled: false
            true: echo x-on-v2
            false: echo x-off-v2
          - name: Y
            enabled: false
            true: echo y-on
            false: echo y-off
  - feature: Apps
"#;

/// A temp dir holding `data.yaml`, optionally pre-filled.
pub fn temp_document(contents: Option<&str>) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("data.yaml");
    if let Some(contents) = contents {
        std::fs::write(&path, contents).expect("Failed to write document");
    }
    (temp_dir, path)
}

/// What the mock server answers to every request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// An axum server on its own thread and runtime, so blocking clients in the
/// test body can talk to it. Shut down on drop.
pub struct MockServer {
    pub addr: SocketAddr,
    shutdown: watch::Sender<bool>,
}

impl MockServer {
    pub fn start(response: MockResponse) -> Self {
        let (addr_tx, addr_rx) = mpsc::channel();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build mock runtime");
            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind mock server");
                addr_tx.send(listener.local_addr().unwrap()).unwrap();

                let app = Router::new()
                    .fallback(respond)
                    .with_state(Arc::new(response));
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.changed().await;
                    })
                    .await
                    .ok();
            });
        });

        let addr = addr_rx.recv().expect("Mock server did not start");
        Self {
            addr,
            shutdown: shutdown_tx,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/data.yaml", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn respond(State(response): State<Arc<MockResponse>>) -> Response<Body> {
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }
    Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap())
        .header("content-type", "text/yaml")
        .body(Body::from(response.body.clone()))
        .unwrap()
}

/// Answers every request with `status` and `body`.
pub fn serve(status: u16, body: &str) -> MockServer {
    MockServer::start(MockResponse::new(status, body))
}

/// Accepts requests but holds each one for `hold` before answering.
pub fn serve_stalled(hold: Duration) -> MockServer {
    MockServer::start(MockResponse::new(200, "").with_delay(hold))
}

/// A URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind free port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/data.yaml", addr)
}
