//! Scripted stand-in for the coder server.
//!
//! Serves the routes the client uses on `127.0.0.1:*`, one thread per
//! connection so streaming and long-poll requests can stay open while other
//! requests are answered. Every request is recorded for assertions.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Canned answers for each route.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Body for `GET /agent`.
    pub agents_body: String,
    /// `data:` payloads written on `GET /event` before the stream idles.
    pub events: Vec<String>,
    /// Close the event stream after the scripted events instead of idling.
    pub close_event_stream: bool,
    /// Bodies for successive `GET /tui/control/next` calls; once exhausted
    /// the poll is held open until shutdown.
    pub control: Vec<String>,
}

struct Shared {
    shutdown: AtomicBool,
    requests: Mutex<Vec<RecordedRequest>>,
    control: Mutex<VecDeque<String>>,
    script: Script,
}

pub struct MockCoderServer {
    address: String,
    shared: Arc<Shared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MockCoderServer {
    pub fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        listener
            .set_nonblocking(true)
            .expect("nonblocking listener");
        let addr = listener.local_addr().expect("mock server addr");

        let shared = Arc::new(Shared {
            shutdown: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            control: Mutex::new(script.control.iter().cloned().collect()),
            script,
        });
        let accept_shared = Arc::clone(&shared);
        let thread = thread::spawn(move || {
            while !accept_shared.shutdown.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let conn_shared = Arc::clone(&accept_shared);
                        thread::spawn(move || handle_connection(stream, &conn_shared));
                    }
                    Err(_) => thread::sleep(Duration::from_millis(10)),
                }
            }
        });

        Self {
            address: format!("http://{addr}"),
            shared,
            thread: Some(thread),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.address
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Requests matching `method` and `path`.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Drop for MockCoderServer {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(host) = self.address.strip_prefix("http://") {
            let _ = TcpStream::connect(host).and_then(|s| s.shutdown(Shutdown::Both));
        }
        if let Some(join) = self.thread.take() {
            let _ = join.join();
        }
    }
}

fn handle_connection(mut stream: TcpStream, shared: &Shared) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    shared.requests.lock().unwrap().push(request.clone());

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/agent") => write_json(&mut stream, "200 OK", &shared.script.agents_body),
        ("GET", "/event") => {
            let mut body = String::new();
            for event in &shared.script.events {
                body.push_str(&format!("data: {event}\n\n"));
            }
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body.as_bytes());
            let _ = stream.flush();
            if !shared.script.close_event_stream {
                hold_open(shared);
            }
        }
        ("GET", "/tui/control/next") => {
            let next = shared.control.lock().unwrap().pop_front();
            match next {
                Some(body) => write_json(&mut stream, "200 OK", &body),
                None => hold_open(shared),
            }
        }
        ("POST", "/tui/control/response") | ("POST", "/log") => {
            write_json(&mut stream, "200 OK", "true")
        }
        _ => write_json(&mut stream, "404 Not Found", "{\"error\":\"not found\"}"),
    }
    let _ = stream.shutdown(Shutdown::Both);
}

fn hold_open(shared: &Shared) {
    while !shared.shutdown.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(20));
    }
}

fn write_json(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok()?;
    let mut buffer = Vec::<u8>::new();
    let mut temp = [0u8; 2048];
    let mut header_end: Option<usize> = None;
    let mut content_length = 0usize;

    loop {
        let n = stream.read(&mut temp).ok()?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&temp[..n]);
        if header_end.is_none() {
            if let Some(idx) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                header_end = Some(idx);
                let headers = String::from_utf8_lossy(&buffer[..idx]).to_string();
                content_length = parse_content_length(&headers).unwrap_or(0);
            }
        }
        if let Some(idx) = header_end {
            if buffer.len().saturating_sub(idx + 4) >= content_length {
                break;
            }
        }
    }

    let idx = header_end?;
    let head = String::from_utf8_lossy(&buffer[..idx]).to_string();
    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buffer[idx + 4..]).to_string();
    Some(RecordedRequest { method, path, body })
}

fn parse_content_length(headers: &str) -> Option<usize> {
    headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
