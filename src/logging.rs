//! Logging setup.
//!
//! Builds one explicit [`Dispatch`] instead of installing a process-global
//! subscriber. The binary makes it the main thread's default and every
//! background task carries a clone, so all components log through the same
//! sinks:
//!
//! - a plain-text file layer (no ANSI; the terminal belongs to the UI),
//! - optionally, a layer that mirrors this crate's records to the server's
//!   `POST /log` endpoint through [`forward_logs`].

use crate::api::{LogEntry, LogLevel, RemoteApi};
use crate::config::LogConfig;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Subscriber};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Records from targets outside this prefix are never sent to the server.
pub const FORWARDED_TARGET_PREFIX: &str = "ken8n_tui";

const FALLBACK_FILTER: &str = "info";

/// Queue of records waiting to be sent to the server.
pub type LogQueue = mpsc::UnboundedReceiver<LogEntry>;

/// Logging handles produced at startup.
pub struct Telemetry {
    pub dispatch: Dispatch,
    /// File actually being written, if one could be opened.
    pub log_file: Option<PathBuf>,
    /// Present when server forwarding is enabled.
    pub forward_queue: Option<LogQueue>,
}

/// Build the dispatcher described by `config`.
///
/// An invalid filter directive falls back to `info`; an unopenable log file
/// disables file output instead of failing startup.
pub fn build_telemetry(config: &LogConfig) -> Telemetry {
    let filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));
    let (writer, log_file) = open_log_writer(config.resolved_file());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let (server_layer, forward_queue) = if config.forward_to_server {
        let (layer, queue) = ServerLogLayer::channel();
        (Some(layer), Some(queue))
    } else {
        (None, None)
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(file_layer)
        .with(server_layer);

    Telemetry {
        dispatch: Dispatch::new(subscriber),
        log_file,
        forward_queue,
    }
}

fn open_log_writer(path: Option<PathBuf>) -> (BoxMakeWriter, Option<PathBuf>) {
    let Some(path) = path else {
        return (BoxMakeWriter::new(std::io::sink), None);
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match File::create(&path) {
        Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), Some(path)),
        Err(err) => {
            eprintln!("warning: cannot open log file {}: {err}", path.display());
            (BoxMakeWriter::new(std::io::sink), None)
        }
    }
}

/// Layer turning this crate's tracing events into [`LogEntry`] records.
pub struct ServerLogLayer {
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl ServerLogLayer {
    pub fn channel() -> (Self, LogQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<S: Subscriber> Layer<S> for ServerLogLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(FORWARDED_TARGET_PREFIX) {
            return;
        }
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(LogLevel::from(metadata.level()), visitor.message);
        entry.extra = visitor.extra;
        entry
            .extra
            .insert("target".into(), Value::String(metadata.target().to_string()));
        let _ = self.tx.send(entry);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    extra: Map<String, Value>,
}

impl EntryVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
        } else {
            self.extra.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }
}

/// Drain queued records into `POST /log` until the scope is cancelled.
///
/// Records already queued at cancellation are still sent. Delivery failures
/// are dropped without logging, since a log line here would re-enter the
/// queue.
pub async fn forward_logs(api: Arc<dyn RemoteApi>, mut queue: LogQueue, scope: CancellationToken) {
    loop {
        let entry = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            entry = queue.recv() => match entry {
                Some(entry) => entry,
                None => return,
            },
        };
        let _ = api.write_log(&entry).await;
    }
    while let Ok(entry) = queue.try_recv() {
        let _ = api.write_log(&entry).await;
    }
}
