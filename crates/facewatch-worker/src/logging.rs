//! AsyncLogger: a custom `tracing_subscriber::Layer` whose `on_event` only
//! enqueues a formatted record onto a bounded channel. All blocking I/O
//! (stdout write, rolling file append) happens on one dedicated worker
//! thread, keeping log enqueue off the detection/tracking hot paths.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::config::LoggingSection;

const CHANNEL_CAPACITY: usize = 10_000;
const SHUTDOWN_DRAIN_DEADLINE: Duration = Duration::from_secs(5);
const WORKER_POLL: Duration = Duration::from_millis(200);

struct LogRecord {
    timestamp_utc: chrono::DateTime<Utc>,
    level: Level,
    target: String,
    message: String,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

impl MessageVisitor {
    fn render(&self) -> String {
        if self.fields.is_empty() {
            return self.message.clone();
        }
        let kv: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{} ({})", self.message, kv.join(", "))
    }
}

/// The `Layer` half: cheap to clone, holds only a channel sender and a
/// shared drop counter.
#[derive(Clone)]
pub struct AsyncLoggerLayer {
    sender: Sender<LogRecord>,
    dropped: Arc<AtomicU64>,
}

impl<S: Subscriber> Layer<S> for AsyncLoggerLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp_utc: Utc::now(),
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.render(),
        };

        if let Err(TrySendError::Full(_)) = self.sender.try_send(record) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// The worker half: owns the receiver and the actual writers, and the
/// handle producers never touch.
pub struct AsyncLogger {
    dropped: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncLogger {
    /// Spawn the worker thread and return it paired with the `Layer` to
    /// install on `tracing_subscriber::registry()`.
    pub fn start(config: &LoggingSection) -> std::io::Result<(Self, AsyncLoggerLayer)> {
        std::fs::create_dir_all(&config.directory)?;
        let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);

        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let worker_dropped = Arc::clone(&dropped);
        let worker_stop = Arc::clone(&stop);
        let worker = std::thread::spawn(move || {
            run_worker(rx, file_appender, worker_dropped, worker_stop);
        });

        let layer = AsyncLoggerLayer {
            sender: tx,
            dropped: Arc::clone(&dropped),
        };

        Ok((
            Self {
                dropped,
                stop,
                worker: Some(worker),
            },
            layer,
        ))
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Signal the worker to drain and exit, waiting up to the shutdown
    /// drain deadline (the worker itself enforces the deadline; this join
    /// just waits for it to return).
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    rx: Receiver<LogRecord>,
    mut file_appender: tracing_appender::rolling::RollingFileAppender,
    dropped: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
) {
    let mut stdout = std::io::stdout();
    let mut deadline: Option<Instant> = None;
    let mut last_reported_dropped = 0u64;

    loop {
        match rx.recv_timeout(WORKER_POLL) {
            Ok(record) => write_record(&record, &mut stdout, &mut file_appender),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }

        let current_dropped = dropped.load(Ordering::Relaxed);
        if current_dropped > last_reported_dropped {
            let synthetic = LogRecord {
                timestamp_utc: Utc::now(),
                level: Level::WARN,
                target: "facewatch_worker::logging".to_string(),
                message: format!(
                    "logs dropped: {} since last report",
                    current_dropped - last_reported_dropped
                ),
            };
            write_record(&synthetic, &mut stdout, &mut file_appender);
            last_reported_dropped = current_dropped;
        }

        if stop.load(Ordering::Relaxed) {
            let deadline = *deadline.get_or_insert_with(|| Instant::now() + SHUTDOWN_DRAIN_DEADLINE);
            if Instant::now() >= deadline {
                break;
            }
            if rx.is_empty() {
                break;
            }
        }
    }

    // Final best-effort drain within whatever remains of the deadline.
    while let Ok(record) = rx.try_recv() {
        write_record(&record, &mut stdout, &mut file_appender);
    }
    let _ = stdout.flush();
    let _ = file_appender.flush();
}

fn write_record(
    record: &LogRecord,
    stdout: &mut std::io::Stdout,
    file: &mut tracing_appender::rolling::RollingFileAppender,
) {
    let line = format!(
        "{} {:>5} {} {}\n",
        record.timestamp_utc.to_rfc3339(),
        record.level,
        record.target,
        record.message
    );
    let _ = stdout.write_all(line.as_bytes());
    let _ = file.write_all(line.as_bytes());
}
