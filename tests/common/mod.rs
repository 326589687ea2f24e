//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use worker_gateway::config::GatewayConfig;
use worker_gateway::http::GatewayServer;
use worker_gateway::lifecycle::Shutdown;

/// A request as seen by a mock worker.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A programmable worker listening on an ephemeral port.
pub struct MockWorker {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockWorker {
    #[allow(dead_code)]
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

/// Start a worker answering every request with `handler`.
pub async fn start_worker<F>(handler: F) -> MockWorker
where
    F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
{
    start_worker_with_delay(handler, |_| Duration::ZERO).await
}

/// Like [`start_worker`], but holds each answer for `delay(request)`.
/// Requests are recorded as soon as they arrive.
#[allow(dead_code)]
pub async fn start_worker_with_delay<F, D>(handler: F, delay: D) -> MockWorker
where
    F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    D: Fn(&Recorded) -> Duration + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);
    let delay = Arc::new(delay);

    let log = seen.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let delay = delay.clone();
            let log = log.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(socket).await {
                    let (request, mut socket) = request;
                    let (status, body) = handler(&request);
                    let hold = delay(&request);
                    log.lock().unwrap().push(request);
                    tokio::time::sleep(hold).await;
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });
        }
    });

    MockWorker { addr, seen }
}

/// A worker that answers 200 on its health route and `reply` elsewhere.
#[allow(dead_code)]
pub async fn start_healthy_worker(reply: &'static str) -> MockWorker {
    start_worker(move |_| (200, reply.to_string())).await
}

async fn read_request(socket: TcpStream) -> Option<(Recorded, TcpStream)> {
    let mut reader = BufReader::new(socket);

    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name.to_string(), value));
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    let recorded = Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    Some((recorded, reader.into_inner()))
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Configuration tuned for fast tests: no probes, short backoff.
#[allow(dead_code)]
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.health_check.enabled = false;
    config.dispatch.retry_backoff_ms = 10;
    config.dispatch.get_timeout_ms = 500;
    config.workers.unregister_timeout_ms = 500;
    config
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// HTTP client that never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Register `worker` and return the assigned id.
#[allow(dead_code)]
pub async fn register(gateway: SocketAddr, worker: SocketAddr) -> u32 {
    let res = client()
        .post(format!("http://{}/register", gateway))
        .json(&serde_json::json!({ "host": "127.0.0.1", "port": worker.port() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_u64().unwrap() as u32
}
