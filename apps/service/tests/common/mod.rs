//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use sitewatch_service::config::{ProbeSettings, SchedulerSettings};
use sitewatch_service::database::{LibsqlRegistry, Registry};
use sitewatch_service::monitoring::{HttpProber, MonitoringExecutor, MonitoringScheduler};
use sitewatch_service::notifications::{NotificationFanout, WebhookNotifier};
use sitewatch_service::pool::open_pool;
use sitewatch_service::shutdown::ShutdownSignal;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// A received request: path and body
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: String,
}

/// Minimal HTTP/1.1 responder, one request per connection.
///
/// Answers every request with the current `status`; `/redirect` answers
/// 302 to `/` instead. Each response is delayed by `delay`.
pub struct StubServer {
    pub addr: SocketAddr,
    pub status: Arc<AtomicU16>,
    pub hits: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(status: u16) -> Self {
        Self::start_with_delay(status, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let status = Arc::new(AtomicU16::new(status));
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let status = status.clone();
            let hits = hits.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else { break };
                    let status = status.clone();
                    let hits = hits.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        if let Some(recorded) = serve(stream, &status, delay).await {
                            hits.fetch_add(1, Ordering::SeqCst);
                            requests.lock().unwrap().push(recorded);
                        }
                    });
                }
            })
        };

        Self { addr, status, hits, requests, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, status: &AtomicU16, delay: Duration) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let response = if path == "/redirect" {
        "HTTP/1.1 302 Found\r\nLocation: /\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    } else {
        let code = status.load(Ordering::SeqCst);
        format!("HTTP/1.1 {code} Stub\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
    };
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok();

    Some(Recorded { path, body })
}

/// A local address nothing listens on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

pub fn probe_settings(timeout_seconds: u64) -> ProbeSettings {
    ProbeSettings { timeout_seconds, ..ProbeSettings::default() }
}

pub async fn test_registry() -> (Arc<dyn Registry>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(&dir.path().join("sitewatch.db"), 4).await.unwrap();
    (Arc::new(LibsqlRegistry::new_from_pool(pool)), dir)
}

/// Scheduler wired with the real HTTP prober and webhook notifier
pub fn test_scheduler(
    registry: Arc<dyn Registry>,
    tick_interval_seconds: u64,
    shutdown: ShutdownSignal,
) -> MonitoringScheduler {
    let prober = Arc::new(HttpProber::new(&probe_settings(2)).unwrap());
    let notifier = Arc::new(WebhookNotifier::new(Duration::from_secs(2)).unwrap());
    let fanout = Arc::new(NotificationFanout::new(notifier));
    let executor = Arc::new(MonitoringExecutor::new(registry.clone(), prober, fanout));
    let settings = SchedulerSettings { tick_interval_seconds, max_concurrent_checks: 4 };
    MonitoringScheduler::new(registry, executor, &settings, shutdown)
}
