use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use pose_overlay::camera::CameraSource;
use pose_overlay::config::Config;
use pose_overlay::export::PoseExporter;
use pose_overlay::logging;
use pose_overlay::pipeline::PipelineWorker;
use pose_overlay::pose::OnnxPoseEngine;
use pose_overlay::presenter::Presenter;
use pose_overlay::render::{DisplaySurface, OverlayRenderer, OverlayStyle, OverlayWindow};
use pose_overlay::slot::latest_slot;

const CONFIG_PATH: &str = "pose_overlay.toml";

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    logging::init(&config.log.filter);

    info!("Pose Overlay {}", env!("CARGO_PKG_VERSION"));
    info!("Press ESC to exit");

    // モデルが読めなければパイプラインは起動しない
    let engine = OnnxPoseEngine::new(&config.model).context("cannot start without a pose model")?;

    let (pose_tx, pose_rx) = latest_slot();
    let worker = Arc::new(PipelineWorker::spawn(engine, pose_tx).context("failed to start inference thread")?);

    let (preview_tx, mut preview_rx) = latest_slot();
    let camera_worker = Arc::clone(&worker);
    let mut camera = CameraSource::start(&config.camera, preview_tx, move |frame| {
        camera_worker.submit(frame);
    })?;
    let (width, height) = camera.resolution();

    let mut window = OverlayWindow::new("Pose Overlay", width as usize, height as usize)?;
    let mut presenter = Presenter::new(
        pose_rx,
        OverlayRenderer::new(OverlayStyle::from(&config.overlay)),
        PoseExporter::from(&config.export),
    );
    let mut preview = None;

    while window.is_open() {
        if let Some(frame) = preview_rx.take() {
            preview = Some(frame);
            window.surface().request_redraw();
        }

        if presenter.drain(window.surface()) {
            if let Some(json) = presenter.json() {
                if config.export.print {
                    println!("{}", json);
                } else {
                    debug!("{}", json);
                }
            }
        }

        let surface = window.surface();
        if surface.take_redraw_request() {
            if let Some(frame) = &preview {
                surface.draw_image(frame);
            }
            presenter.render(surface);
            surface.request_redraw();
        }

        window.update()?;
    }

    info!("Shutting down...");
    worker.close();
    camera.stop();
    if let Ok(worker) = Arc::try_unwrap(worker) {
        worker.shutdown();
    }
    Ok(())
}
