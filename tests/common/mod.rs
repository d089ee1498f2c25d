//! Shared utilities for integration testing: a scriptable Bedrock node.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use bedrock_gateway::cluster::HostEndpoint;
use bedrock_gateway::config::{ClusterConfig, GatewayConfig};

/// One command as the node saw it.
#[derive(Debug, Clone)]
pub struct Received {
    pub command: String,
    pub headers: BTreeMap<String, String>,
}

/// What the node writes back.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Status line plus JSON content, framed with Content-Length.
    Json { status: &'static str, content: String },
    /// Bytes written verbatim.
    Raw(String),
    /// Accept, read, and never answer.
    Silent,
}

impl Reply {
    pub fn ok(content: serde_json::Value) -> Self {
        Reply::Json {
            status: "200 OK",
            content: content.to_string(),
        }
    }

    pub fn status(status: &'static str) -> Self {
        Reply::Json {
            status,
            content: String::new(),
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            Reply::Json { status, content } => Some(format!(
                "{}\r\nContent-Length: {}\r\n\r\n{}",
                status,
                content.len(),
                content
            )),
            Reply::Raw(raw) => Some(raw.clone()),
            Reply::Silent => None,
        }
    }
}

/// A running mock node.
pub struct MockNode {
    pub endpoint: HostEndpoint,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockNode {
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

/// Start a node on an ephemeral port that answers every command via `f`.
pub async fn start_node<F>(f: F) -> MockNode
where
    F: Fn(&Received) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = received.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let (read_half, mut write_half) = socket.into_split();
                let mut reader = BufReader::new(read_half);

                let mut command = String::new();
                if reader.read_line(&mut command).await.unwrap_or(0) == 0 {
                    return;
                }
                let mut headers = BTreeMap::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = line.split_once(':') {
                        headers.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }

                let request = Received {
                    command: command.trim_end().to_string(),
                    headers,
                };
                let reply = f(&request);
                log.lock().unwrap().push(request);

                match reply.render() {
                    Some(bytes) => {
                        let _ = write_half.write_all(bytes.as_bytes()).await;
                        let _ = write_half.shutdown().await;
                    }
                    None => {
                        // Hold the connection open until the client gives up.
                        let mut rest = String::new();
                        let _ = reader.read_line(&mut rest).await;
                    }
                }
            });
        }
    });

    MockNode {
        endpoint: HostEndpoint::from(addr),
        received,
    }
}

/// A node that answers every command with the same reply.
pub async fn fixed_node(reply: Reply) -> MockNode {
    start_node(move |_| reply.clone()).await
}

/// An address nothing listens on.
pub async fn closed_endpoint() -> HostEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    HostEndpoint::from(addr)
}

/// A listener whose accept queue is full: new connects never complete.
///
/// Keep the returned guard alive for as long as the endpoint must stall.
pub async fn stalled_endpoint() -> (HostEndpoint, StallGuard) {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..32 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            _ => break,
        }
    }

    (
        HostEndpoint::from(addr),
        StallGuard {
            _listener: listener,
            _held: held,
        },
    )
}

pub struct StallGuard {
    _listener: TcpListener,
    _held: Vec<TcpStream>,
}

/// Cluster settings with short timeouts for tests.
pub fn cluster(primary: Vec<HostEndpoint>, failover: Vec<HostEndpoint>) -> ClusterConfig {
    ClusterConfig {
        name: "test".into(),
        primary,
        failover,
        connection_timeout_secs: 1,
        read_timeout_secs: 1,
        ..ClusterConfig::default()
    }
}

/// Gateway config on an ephemeral port in front of `cluster`.
pub fn gateway_config(cluster: ClusterConfig) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.cluster = cluster;
    config
}
