use anyhow::{bail, Context, Result};
use image::RgbImage;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::CameraConfig;
use crate::pose::preprocess::to_rgb_image;
use crate::pose::{PixelFormat, RawFrame};
use crate::slot::SlotSender;

/// OpenCVを使用したカメラキャプチャ
pub struct OpenCvCamera {
    capture: VideoCapture,
    width: u32,
    height: u32,
}

impl OpenCvCamera {
    /// 解像度とFPSを指定してカメラを開く
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let mut capture = VideoCapture::new(config.index, VideoCaptureAPIs::CAP_ANY as i32)
            .with_context(|| format!("failed to open camera {}", config.index))?;

        if !capture.is_opened()? {
            bail!("camera {} is not available", config.index);
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, config.width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64)?;
        capture.set(videoio::CAP_PROP_FPS, config.fps as f64)?;
        // ドライバ側のキューを溜めない
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        info!(index = config.index, width, height, fps, "camera opened");

        Ok(Self {
            capture,
            width,
            height,
        })
    }

    /// 解像度を取得
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// フレームを読み込む（BGR形式）
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        let mut frame = Mat::default();
        self.capture
            .read(&mut frame)
            .context("failed to read frame")?;

        if frame.empty() {
            bail!("empty frame received");
        }

        let frame = if frame.is_continuous() {
            frame
        } else {
            frame.try_clone()?
        };

        Ok(RawFrame::new(
            frame.cols() as u32,
            frame.rows() as u32,
            PixelFormat::Bgr8,
            frame.data_bytes()?.to_vec(),
        ))
    }
}

/// 別スレッドでカメラを読み続け、フレームを下流に渡す
///
/// 各フレームはプレビュー用に RGB で公開してから `on_frame` に渡す。
/// `on_frame` はブロックしてはならない。
pub struct CameraSource {
    running: Arc<AtomicBool>,
    width: u32,
    height: u32,
    handle: Option<JoinHandle<()>>,
}

impl CameraSource {
    pub fn start<F>(config: &CameraConfig, preview: SlotSender<RgbImage>, mut on_frame: F) -> Result<Self>
    where
        F: FnMut(RawFrame) + Send + 'static,
    {
        // エラーをすぐ返すため、カメラはこのスレッドで開く
        let mut camera = OpenCvCamera::open(config)?;
        let (width, height) = camera.resolution();
        let running = Arc::new(AtomicBool::new(true));
        let running_ref = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("camera".to_string())
            .spawn(move || {
                while running_ref.load(Ordering::Relaxed) {
                    match camera.read_frame() {
                        Ok(frame) => {
                            match to_rgb_image(&frame) {
                                Ok(rgb) => preview.publish(rgb),
                                Err(e) => warn!(error = %e, "preview conversion failed"),
                            }
                            on_frame(frame);
                        }
                        Err(e) => {
                            warn!(error = %e, "frame capture error");
                            thread::sleep(Duration::from_millis(100));
                        }
                    }
                }
            })?;

        Ok(Self {
            running,
            width,
            height,
            handle: Some(handle),
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("camera thread panicked");
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.stop();
    }
}
