//! Forwarder: N worker threads draining FindfaceQueue and submitting to the
//! external face-recognition service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use facewatch_queue::FindfaceQueue;
use tracing::{info, warn};

use crate::client::FindfaceClient;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(200);

/// Submit one Event with up to `MAX_RETRIES` retries on transient failures,
/// exponential backoff between attempts. Permanent failures return
/// immediately without retrying.
fn submit_with_retry(client: &FindfaceClient, event: &facewatch_models::Event) {
    let mut attempt = 0u32;
    loop {
        match client.submit(event) {
            Ok(()) => return,
            Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                attempt += 1;
                let backoff = BASE_BACKOFF.saturating_mul(2u32.saturating_pow(attempt));
                warn!(error = %e, attempt, "transient submission failure, retrying");
                thread::sleep(backoff);
            }
            Err(e) => {
                warn!(error = %e, "submission dropped");
                return;
            }
        }
    }
}

pub fn run_forwarder_worker(
    worker_id: usize,
    client: Arc<FindfaceClient>,
    findface_queue: &FindfaceQueue,
    stop: &Arc<AtomicBool>,
) {
    info!(worker_id, "forwarder worker started");
    loop {
        if stop.load(Ordering::Relaxed) && findface_queue.len() == 0 {
            break;
        }
        match findface_queue.pop_blocking() {
            Some(event) => submit_with_retry(&client, &event),
            None => break,
        }
    }
    info!(worker_id, "forwarder worker stopped");
}

#[cfg(test)]
mod tests {
    // submit_with_retry and run_forwarder_worker exercise a real blocking
    // HTTP client; covered by facewatch-worker's orchestrator-level tests
    // against a local mock server instead of unit tests here.
}
