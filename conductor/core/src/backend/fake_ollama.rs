//! Local stand-in for an Ollama server
//!
//! Speaks just enough HTTP/1.1 for the client: one request per connection,
//! answered by path. `/api/tags` lists no models, so every model looks
//! downloadable.

#![cfg(test)]

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::ollama::{OllamaClient, OllamaSettings};

/// How `/api/pull` answers
#[derive(Clone, Copy, Debug)]
pub enum PullReply {
    /// Accept the request and never respond
    Hang,
    /// Respond with this newline-delimited JSON body
    Stream(&'static str),
}

/// A running fake server
pub struct FakeOllama {
    port: u16,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeOllama {
    /// Bind to an ephemeral port and serve until the runtime shuts down
    pub async fn start(pull: PullReply, generated: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, pull, generated, Arc::clone(&seen)));
            }
        });

        Self { port, requests }
    }

    /// Client pointed at this server
    pub fn client(&self, settings: OllamaSettings) -> OllamaClient {
        OllamaClient::new(OllamaSettings {
            host: "127.0.0.1".to_string(),
            port: self.port,
            ..settings
        })
    }

    /// Paths requested so far, in arrival order
    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Body of the first request to `path`
    pub fn body_of(&self, path: &str) -> Option<String> {
        self.requests
            .lock()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
    }
}

async fn serve(
    mut stream: TcpStream,
    pull: PullReply,
    generated: &'static str,
    seen: Arc<Mutex<Vec<(String, String)>>>,
) {
    let Some((path, body)) = read_request(&mut stream).await else {
        return;
    };
    seen.lock().push((path.clone(), body));

    let (content_type, reply) = match path.as_str() {
        "/api/tags" => ("application/json", r#"{"models":[]}"#.to_string()),
        "/api/pull" => match pull {
            PullReply::Hang => {
                std::future::pending::<()>().await;
                return;
            }
            PullReply::Stream(ndjson) => ("application/x-ndjson", ndjson.to_string()),
        },
        "/api/generate" => (
            "application/json",
            serde_json::json!({ "response": generated, "done": true }).to_string(),
        ),
        _ => ("application/json", r#"{"error":"not found"}"#.to_string()),
    };

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read one request; returns its path and body
async fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
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
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head.split_whitespace().nth(1)?.to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some((path, body))
}
