use tracing::{debug, warn};

use crate::export::PoseExporter;
use crate::pipeline::PoseUpdate;
use crate::render::{DisplaySurface, OverlayRenderer};
use crate::slot::SlotReceiver;

/// 表示スレッド側: 最新の姿勢を受け取り、オーバーレイと JSON に配る
pub struct Presenter {
    receiver: SlotReceiver<PoseUpdate>,
    overlay: OverlayRenderer,
    exporter: PoseExporter,
    json: Option<String>,
    last_frame_id: u64,
}

impl Presenter {
    pub fn new(
        receiver: SlotReceiver<PoseUpdate>,
        overlay: OverlayRenderer,
        exporter: PoseExporter,
    ) -> Self {
        Self {
            receiver,
            overlay,
            exporter,
            json: None,
            last_frame_id: 0,
        }
    }

    /// 新しい姿勢があれば反映して再描画を要求する
    ///
    /// 反映した場合は true。表示の更新ごと（リフレッシュ単位）に呼ぶ。
    pub fn drain<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let Some(update) = self.receiver.take() else {
            return false;
        };

        match self.exporter.to_json(&update.pose) {
            Ok(json) => self.json = Some(json),
            Err(e) => warn!(frame_id = update.frame_id, error = %e, "pose export failed"),
        }

        debug!(frame_id = update.frame_id, "pose presented");
        self.last_frame_id = update.frame_id;
        self.overlay.set_pose(update.pose);
        if self.overlay.take_redraw_request() {
            surface.request_redraw();
        }
        true
    }

    /// 現在の姿勢を表示面に描く
    pub fn render<S: DisplaySurface + ?Sized>(&self, surface: &mut S) {
        let (width, height) = surface.size();
        self.overlay.render(surface, width, height);
    }

    /// 最新の JSON（まだ何も受け取っていなければ None）
    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    pub fn last_frame_id(&self) -> u64 {
        self.last_frame_id
    }
}
