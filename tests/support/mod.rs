//! Minimal HTTP stub standing in for STH-Comet.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use envmon_history::config::SthConfig;

/// What the stub does with one request.
pub enum Reply {
    /// Status line (e.g. `"200 OK"`) and JSON body.
    Respond(&'static str, String),
    /// Close the connection without answering.
    Drop,
    /// Keep the connection open and never answer.
    Hang,
}

pub struct Stub {
    pub addr: SocketAddr,
    /// Raw request heads, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

/// Serve every connection with `handler` until the test's runtime shuts down.
pub async fn spawn_stub<F>(handler: F) -> Stub
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    // ---
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        let mut parked: Vec<TcpStream> = Vec::new();
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let head = read_head(&mut socket).await;
            seen.lock().unwrap().push(head.clone());

            match handler(&head) {
                Reply::Respond(status, body) => {
                    let response = format!(
                        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                Reply::Drop => drop(socket),
                Reply::Hang => parked.push(socket),
            }
        }
    });

    Stub { addr, requests }
}

async fn read_head(socket: &mut TcpStream) -> String {
    // ---
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// STH config pointing at a local address.
pub fn sth_config(addr: SocketAddr, timeout: Duration) -> SthConfig {
    // ---
    SthConfig {
        scheme: "http".to_string(),
        host: addr.ip().to_string(),
        port: addr.port(),
        entity_id: "urn:ngsi-ld:Env:001".to_string(),
        entity_type: "Environment".to_string(),
        service: "smart".to_string(),
        service_path: "/".to_string(),
        timeout,
    }
}

/// Wrap `(recvTime, attrValue)` pairs in an STH response envelope.
pub fn envelope(attribute: &str, values: &[(&str, &str)]) -> String {
    // ---
    let values: Vec<serde_json::Value> = values
        .iter()
        .map(|(t, v)| serde_json::json!({ "recvTime": t, "attrType": "Number", "attrValue": v }))
        .collect();

    envelope_of(attribute, values)
}

/// Wrap arbitrary `values` entries in an STH response envelope.
pub fn envelope_of(attribute: &str, values: Vec<serde_json::Value>) -> String {
    // ---
    serde_json::json!({
        "contextResponses": [{
            "contextElement": {
                "attributes": [{ "name": attribute, "values": values }],
                "id": "urn:ngsi-ld:Env:001",
                "isPattern": false,
                "type": "Environment"
            },
            "statusCode": { "code": "200", "reasonPhrase": "OK" }
        }]
    })
    .to_string()
}

/// Attribute name from a request line like `GET /STH/.../attributes/humidity?lastN=100 HTTP/1.1`.
pub fn requested_attribute(head: &str) -> String {
    // ---
    head.split_whitespace()
        .nth(1)
        .and_then(|path| path.split("/attributes/").nth(1))
        .and_then(|rest| rest.split('?').next())
        .unwrap_or_default()
        .to_string()
}
