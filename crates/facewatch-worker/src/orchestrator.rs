//! Orchestrator: owns every component handle and the stop flag that
//! propagates a shutdown through the whole pipeline in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use facewatch_ingest::{CameraConfig, RtspSource, StreamIngestor};
use facewatch_media::{Detector, FaceDetector, FaceQualityService};
use facewatch_queue::{EventQueue, FindfaceQueue, FrameQueue};
use facewatch_tracking::{SystemClock, TrackManager};

use crate::config::AppConfig;
use crate::reclaim::{BackgroundReclaimer, TensorCacheReleaser};
use crate::stats::{DropStats, SUMMARY_INTERVAL};

/// Everything the orchestrator needs to build the pipeline that isn't
/// already captured in `AppConfig`: the seams the binary plugs real
/// implementations into.
pub struct PipelineDeps<F, S> {
    pub model: Arc<dyn FaceDetector>,
    pub quality: Arc<dyn FaceQualityService>,
    pub cameras: Vec<CameraConfig>,
    pub make_source: F,
    pub forwarder_client: Arc<facewatch_forward::FindfaceClient>,
    pub tensor_cache_releaser: Arc<dyn TensorCacheReleaser>,
    _source: std::marker::PhantomData<S>,
}

impl<F, S> PipelineDeps<F, S>
where
    F: Fn(&CameraConfig) -> S,
    S: RtspSource + 'static,
{
    pub fn new(
        model: Arc<dyn FaceDetector>,
        quality: Arc<dyn FaceQualityService>,
        cameras: Vec<CameraConfig>,
        make_source: F,
        forwarder_client: Arc<facewatch_forward::FindfaceClient>,
        tensor_cache_releaser: Arc<dyn TensorCacheReleaser>,
    ) -> Self {
        Self {
            model,
            quality,
            cameras,
            make_source,
            forwarder_client,
            tensor_cache_releaser,
            _source: std::marker::PhantomData,
        }
    }
}

/// Owns every worker thread and the queues connecting them. Start order is
/// logger -> reclaimer -> forwarders -> track manager -> detectors ->
/// ingestors (each stage must be ready to receive before the stage
/// upstream of it starts producing). Stop order reverses this.
pub struct Orchestrator {
    stop: Arc<AtomicBool>,
    frame_queue: Arc<FrameQueue>,
    event_queue: Arc<EventQueue>,
    findface_queue: Arc<FindfaceQueue>,
    ingestor_handles: Vec<JoinHandle<()>>,
    detector_handles: Vec<JoinHandle<()>>,
    tracker_handle: Option<JoinHandle<()>>,
    forwarder_handles: Vec<JoinHandle<()>>,
    reclaimer: Option<BackgroundReclaimer>,
    stats_handle: Option<JoinHandle<()>>,
    drain_timeout: Duration,
}

impl Orchestrator {
    pub fn start<F, S>(config: &AppConfig, deps: PipelineDeps<F, S>) -> Self
    where
        F: Fn(&CameraConfig) -> S,
        S: RtspSource + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        let frame_queue = Arc::new(FrameQueue::new(config.queues.frame_queue_max_size));
        let event_queue = Arc::new(EventQueue::new(
            config.queues.event_queue_max_size,
            Duration::from_millis(500),
        ));
        let findface_queue = Arc::new(FindfaceQueue::new(config.queues.findface_queue_max_size));

        let reclaimer = Some(BackgroundReclaimer::start(
            config.gc_interval(),
            Arc::clone(&deps.tensor_cache_releaser),
        ));

        let mut forwarder_handles = Vec::new();
        for worker_id in 0..config.findface_workers {
            let client = Arc::clone(&deps.forwarder_client);
            let findface_queue = Arc::clone(&findface_queue);
            let stop = Arc::clone(&stop);
            forwarder_handles.push(std::thread::spawn(move || {
                facewatch_forward::run_forwarder_worker(worker_id, client, &findface_queue, &stop);
            }));
        }

        let tracker_handle = {
            let tracking_config = config.tracking_config();
            let event_queue = Arc::clone(&event_queue);
            let findface_queue = Arc::clone(&findface_queue);
            let stop = Arc::clone(&stop);
            Some(std::thread::spawn(move || {
                let mut manager = TrackManager::new(tracking_config, SystemClock::new());
                manager.run(&event_queue, &findface_queue, &stop);
            }))
        };

        let mut detector_handles = Vec::new();
        for _ in 0..config.processing.gpu_devices.len().max(1) {
            let model = Arc::clone(&deps.model);
            let quality = Arc::clone(&deps.quality);
            let detector_config = config.detector_config();
            let frame_queue = Arc::clone(&frame_queue);
            let event_queue = Arc::clone(&event_queue);
            let stop = Arc::clone(&stop);
            detector_handles.push(std::thread::spawn(move || {
                let mut detector = Detector::new(model, quality, detector_config);
                detector.run(&frame_queue, &event_queue, &stop);
            }));
        }

        let mut ingestor_handles = Vec::new();
        for camera in &deps.cameras {
            let camera_id = facewatch_models::CameraId(camera.camera_id);
            let source = (deps.make_source)(camera);
            let ingestor_config = config.ingestor_config();
            let frame_queue = Arc::clone(&frame_queue);
            let stop = Arc::clone(&stop);
            ingestor_handles.push(std::thread::spawn(move || {
                let mut ingestor = StreamIngestor::new(camera_id, source, ingestor_config);
                ingestor.run(&frame_queue, &stop);
            }));
        }

        let stats_handle = {
            let frame_queue = Arc::clone(&frame_queue);
            let event_queue = Arc::clone(&event_queue);
            let findface_queue = Arc::clone(&findface_queue);
            let stop = Arc::clone(&stop);
            Some(std::thread::spawn(move || {
                run_stats_loop(&frame_queue, &event_queue, &findface_queue, &stop);
            }))
        };

        info!(
            cameras = deps.cameras.len(),
            detectors = detector_handles.len(),
            forwarders = forwarder_handles.len(),
            "pipeline started"
        );

        Self {
            stop,
            frame_queue,
            event_queue,
            findface_queue,
            ingestor_handles,
            detector_handles,
            tracker_handle,
            forwarder_handles,
            reclaimer,
            stats_handle,
            drain_timeout: config.drain_timeout(),
        }
    }

    /// Flip the stop flag and unwind every stage, waiting up to
    /// `drain_timeout` for downstream queues to empty before forcing
    /// closure.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);

        for handle in self.ingestor_handles.drain(..) {
            let _ = handle.join();
        }
        self.frame_queue.close();

        let deadline = Instant::now() + self.drain_timeout;
        while Instant::now() < deadline
            && (self.frame_queue.len() > 0 || self.event_queue.len() > 0)
        {
            std::thread::sleep(Duration::from_millis(50));
        }

        for handle in self.detector_handles.drain(..) {
            let _ = handle.join();
        }
        self.event_queue.close();
        if let Some(handle) = self.tracker_handle.take() {
            let _ = handle.join();
        }

        let deadline = Instant::now() + self.drain_timeout;
        while Instant::now() < deadline && self.findface_queue.len() > 0 {
            std::thread::sleep(Duration::from_millis(50));
        }
        self.findface_queue.close();
        for handle in self.forwarder_handles.drain(..) {
            let _ = handle.join();
        }

        if let Some(reclaimer) = self.reclaimer.take() {
            reclaimer.stop();
        }
        if let Some(handle) = self.stats_handle.take() {
            let _ = handle.join();
        }

        info!("pipeline stopped");
    }
}

fn run_stats_loop(
    frame_queue: &FrameQueue,
    event_queue: &EventQueue,
    findface_queue: &FindfaceQueue,
    stop: &Arc<AtomicBool>,
) {
    let mut previous = DropStats::snapshot(frame_queue, event_queue, findface_queue);
    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(SUMMARY_INTERVAL);
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let current = DropStats::snapshot(frame_queue, event_queue, findface_queue);
        let delta = current.delta_since(&previous);
        if delta.has_drops() {
            warn!(?delta, "drops since last summary");
        }
        current.log_summary();
        previous = current;
    }
}
