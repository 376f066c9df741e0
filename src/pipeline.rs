use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{FrameError, InferenceError};
use crate::pose::{decode_tensor, preprocess_for_movenet, InferenceEngine, Pose, RawFrame};
use crate::slot::SlotSender;

/// 1フレーム分の処理結果（スレッド間で受け渡す単位）
#[derive(Debug, Clone, PartialEq)]
pub struct PoseUpdate {
    /// 受理順の通し番号（1始まり）
    pub frame_id: u64,
    pub pose: Pose,
}

/// 前処理 -> 推論 -> デコード を同期的に実行する
pub struct FramePipeline<E> {
    engine: E,
}

impl<E: InferenceEngine> FramePipeline<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// 1フレームを処理。どの段で失敗してもそのフレームだけが破棄される。
    pub fn process(&mut self, frame: &RawFrame) -> Result<Pose, FrameError> {
        let input = preprocess_for_movenet(frame)?;
        let output = self.engine.run(input)?;
        let pose = decode_tensor(&output)?;
        Ok(pose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Busy,
}

/// `submit` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// 処理を開始した（frame_id 付き）
    Accepted(u64),
    /// Busy のため破棄した
    Dropped,
}

/// カウンタのスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub submitted: u64,
    pub processed: u64,
    pub dropped: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

struct Shared {
    busy: AtomicBool,
    running: AtomicBool,
    next_id: AtomicU64,
    counters: Counters,
}

struct Job {
    frame_id: u64,
    frame: RawFrame,
}

/// スコープを抜けたら Idle に戻す（パニック時も含む）
struct IdleOnDrop<'a>(&'a AtomicBool);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 推論スレッドを持つパイプライン制御
///
/// Busy 中に投入されたフレームはその場で破棄・解放される。
/// 上流はブロックされず、処理中のフレームは常に高々1枚。
pub struct PipelineWorker {
    tx: Option<SyncSender<Job>>,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl PipelineWorker {
    /// 推論スレッドを起動
    pub fn spawn<E>(engine: E, publisher: SlotSender<PoseUpdate>) -> io::Result<Self>
    where
        E: InferenceEngine + 'static,
    {
        let shared = Arc::new(Shared {
            busy: AtomicBool::new(false),
            running: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
            counters: Counters::default(),
        });
        // Busy ゲートがあるので 1 で足りる
        let (tx, rx) = mpsc::sync_channel::<Job>(1);

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("pose-inference".to_string())
            .spawn(move || {
                run_worker(FramePipeline::new(engine), rx, &worker_shared, &publisher);
            })?;

        info!("pipeline worker started");

        Ok(Self {
            tx: Some(tx),
            shared,
            handle: Some(handle),
        })
    }

    /// フレームを投入。Busy なら即座に破棄して解放する。
    pub fn submit(&self, frame: RawFrame) -> Admission {
        let counters = &self.shared.counters;
        counters.submitted.fetch_add(1, Ordering::Relaxed);

        let Some(tx) = self.tx.as_ref() else {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Admission::Dropped;
        };

        if !self.shared.running.load(Ordering::Acquire)
            || self
                .shared
                .busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("pipeline busy, frame dropped");
            return Admission::Dropped;
        }

        let frame_id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        match tx.try_send(Job { frame_id, frame }) {
            Ok(()) => Admission::Accepted(frame_id),
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                drop(job);
                self.shared.busy.store(false, Ordering::Release);
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(frame_id, "inference thread unavailable, frame dropped");
                Admission::Dropped
            }
        }
    }

    pub fn state(&self) -> PipelineState {
        if self.shared.busy.load(Ordering::Acquire) {
            PipelineState::Busy
        } else {
            PipelineState::Idle
        }
    }

    pub fn stats(&self) -> PipelineStats {
        let c = &self.shared.counters;
        PipelineStats {
            submitted: c.submitted.load(Ordering::Relaxed),
            processed: c.processed.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }

    /// 新しいフレームの受付を止める。処理中の結果はこれ以降公開されない。
    pub fn close(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// 受付を止め、推論スレッドの終了を待つ。処理中の結果は公開しない。
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.close();
        drop(self.tx.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("pipeline worker panicked");
            }
            let stats = self.stats();
            info!(
                processed = stats.processed,
                dropped = stats.dropped,
                failed = stats.failed,
                "pipeline worker stopped"
            );
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<E: InferenceEngine>(
    mut pipeline: FramePipeline<E>,
    rx: Receiver<Job>,
    shared: &Shared,
    publisher: &SlotSender<PoseUpdate>,
) {
    let mut meter = ThroughputMeter::new();

    while let Ok(job) = rx.recv() {
        // フレームを解放してから Idle に戻す
        let _idle = IdleOnDrop(&shared.busy);
        let Job { frame_id, frame } = job;

        if !shared.running.load(Ordering::Acquire) {
            debug!(frame_id, "shutting down, frame discarded");
            continue;
        }

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| pipeline.process(&frame)))
            .unwrap_or_else(|_| {
                Err(InferenceError::Runtime("pipeline stage panicked".to_string()).into())
            });

        match result {
            Ok(pose) => {
                if !shared.running.load(Ordering::Acquire) {
                    debug!(frame_id, "shutting down, result discarded");
                    continue;
                }
                shared.counters.processed.fetch_add(1, Ordering::Relaxed);
                debug!(frame_id, elapsed_ms = started.elapsed().as_millis() as u64, "frame processed");
                meter.record(&pose);
                publisher.publish(PoseUpdate { frame_id, pose });
            }
            Err(e) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(frame_id, error = %e, "frame processing failed, frame dropped");
            }
        }

        drop(frame);
    }

    debug!("pipeline worker exiting");
}

/// 1秒ごとに処理FPSと平均信頼度をログに出す
struct ThroughputMeter {
    frames: u32,
    score_sum: f32,
    since: Instant,
}

impl ThroughputMeter {
    fn new() -> Self {
        Self {
            frames: 0,
            score_sum: 0.0,
            since: Instant::now(),
        }
    }

    fn record(&mut self, pose: &Pose) {
        self.frames += 1;
        self.score_sum += pose.average_score();

        let elapsed = self.since.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            info!(
                "FPS: {:.1}, Avg confidence: {:.2}",
                self.frames as f32 / elapsed,
                self.score_sum / self.frames as f32
            );
            self.frames = 0;
            self.score_sum = 0.0;
            self.since = Instant::now();
        }
    }
}
