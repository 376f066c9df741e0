use crate::config::OverlayConfig;
use crate::pose::{Pose, DEFAULT_SCORE_THRESHOLD};
use crate::render::canvas::Canvas;
use crate::render::skeleton::{KEYPOINT_COLOR, SKELETON_COLOR, SKELETON_EDGES};

/// オーバーレイの描画スタイル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// この値を超えるスコアのキーポイントだけを描く
    pub threshold: f32,
    pub point_radius: f32,
    pub point_color: u32,
    pub line_width: f32,
    pub line_color: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SCORE_THRESHOLD,
            point_radius: 8.0,
            point_color: KEYPOINT_COLOR,
            line_width: 4.0,
            line_color: SKELETON_COLOR,
        }
    }
}

impl From<&OverlayConfig> for OverlayStyle {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            threshold: config.threshold,
            point_radius: config.point_radius,
            point_color: config.point_color,
            line_width: config.line_width,
            line_color: config.line_color,
        }
    }
}

/// 最新の姿勢を保持し、表示面に骨格を描く
///
/// 姿勢は `set_pose` でのみ書き込まれ、`render` でのみ読まれる。
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
    pose: Option<Pose>,
    redraw_pending: bool,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            pose: None,
            redraw_pending: false,
        }
    }

    /// 表示中の姿勢を置き換え、再描画を予約する
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
        self.redraw_pending = true;
    }

    /// 再描画の予約を読み出してクリア
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    /// 最新の姿勢を描画（未設定なら何もしない）
    ///
    /// 1. 閾値を超えるキーポイントに点を描く
    /// 2. 両端が閾値を超える接続にだけ線を描く
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C, width: u32, height: u32) {
        let Some(pose) = &self.pose else {
            return;
        };
        let style = &self.style;

        for kp in pose.confident(style.threshold) {
            canvas.fill_circle(kp.to_surface(width, height), style.point_radius, style.point_color);
        }

        for (start_part, end_part) in SKELETON_EDGES.iter() {
            let start = pose.get(*start_part);
            let end = pose.get(*end_part);

            if start.is_confident(style.threshold) && end.is_confident(style.threshold) {
                canvas.draw_line(
                    start.to_surface(width, height),
                    end.to_surface(width, height),
                    style.line_width,
                    style.line_color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{BodyPart, Keypoint};
    use crate::render::FrameBuffer;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, PartialEq)]
    enum DrawCall {
        Circle((f32, f32)),
        Line((f32, f32), (f32, f32)),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<DrawCall>,
    }

    impl Recorder {
        fn circles(&self) -> usize {
            self.calls.iter().filter(|c| matches!(c, DrawCall::Circle(_))).count()
        }

        fn lines(&self) -> usize {
            self.calls.iter().filter(|c| matches!(c, DrawCall::Line(..))).count()
        }
    }

    impl Canvas for Recorder {
        fn fill_circle(&mut self, center: (f32, f32), _radius: f32, _color: u32) {
            self.calls.push(DrawCall::Circle(center));
        }

        fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), _width: f32, _color: u32) {
            self.calls.push(DrawCall::Line(from, to));
        }
    }

    fn pose_with(scores: &[(BodyPart, f32)]) -> Pose {
        let mut pose = Pose::default();
        for &(part, score) in scores {
            pose.keypoints[part.index()] = Keypoint::new(part, 0.5, 0.25, score);
        }
        pose
    }

    #[test]
    fn test_render_without_pose_is_noop() {
        let renderer = OverlayRenderer::default();
        let mut canvas = Recorder::default();
        renderer.render(&mut canvas, 640, 480);
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_point_threshold_is_strict() {
        let mut renderer = OverlayRenderer::default();
        renderer.set_pose(pose_with(&[(BodyPart::Nose, 0.3), (BodyPart::LeftEye, 0.31)]));

        let mut canvas = Recorder::default();
        renderer.render(&mut canvas, 640, 480);
        assert_eq!(canvas.calls, vec![DrawCall::Circle((320.0, 120.0))]);
    }

    #[test]
    fn test_edge_needs_both_endpoints() {
        let mut renderer = OverlayRenderer::default();
        renderer.set_pose(pose_with(&[(BodyPart::LeftWrist, 0.5), (BodyPart::LeftElbow, 0.2)]));

        let mut canvas = Recorder::default();
        renderer.render(&mut canvas, 100, 100);
        assert_eq!(canvas.circles(), 1);
        assert_eq!(canvas.lines(), 0);
    }

    #[test]
    fn test_edge_drawn_when_both_confident() {
        let mut renderer = OverlayRenderer::default();
        renderer.set_pose(pose_with(&[(BodyPart::LeftWrist, 0.5), (BodyPart::LeftElbow, 0.6)]));

        let mut canvas = Recorder::default();
        renderer.render(&mut canvas, 100, 100);
        assert_eq!(canvas.circles(), 2);
        assert_eq!(canvas.lines(), 1);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut renderer = OverlayRenderer::default();
        renderer.set_pose(Pose::new(BodyPart::ALL.map(|p| Keypoint::new(p, 0.1, 0.9, 0.8))));

        let mut first = Recorder::default();
        let mut second = Recorder::default();
        renderer.render(&mut first, 320, 240);
        renderer.render(&mut second, 320, 240);
        assert_eq!(first.calls, second.calls);
        assert_eq!(first.circles(), 17);
        assert_eq!(first.lines(), 12);
    }

    #[test]
    fn test_set_pose_requests_redraw() {
        let mut renderer = OverlayRenderer::default();
        assert!(!renderer.take_redraw_request());
        renderer.set_pose(Pose::default());
        assert!(renderer.take_redraw_request());
        assert!(!renderer.take_redraw_request());
    }

    #[test]
    fn test_custom_threshold() {
        let style = OverlayStyle {
            threshold: 0.7,
            ..OverlayStyle::default()
        };
        let mut renderer = OverlayRenderer::new(style);
        renderer.set_pose(pose_with(&[(BodyPart::Nose, 0.5)]));

        let mut canvas = Recorder::default();
        renderer.render(&mut canvas, 100, 100);
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_far_off_keypoint_renders_quickly_on_frame_buffer() {
        let mut pose = Pose::default();
        pose.keypoints[BodyPart::LeftWrist.index()] = Keypoint::new(BodyPart::LeftWrist, 0.5, 0.5, 0.9);
        pose.keypoints[BodyPart::LeftElbow.index()] =
            Keypoint::new(BodyPart::LeftElbow, 200_000.0, 0.5, 0.9);
        let mut renderer = OverlayRenderer::default();
        renderer.set_pose(pose);

        let mut fb = FrameBuffer::new(640, 480);
        let started = Instant::now();
        renderer.render(&mut fb, 640, 480);
        assert!(started.elapsed() < Duration::from_secs(1));

        // 手首の点と、画面端までの線
        assert_eq!(fb.pixel(320, 233), Some(0x00FFFF));
        assert_eq!(fb.pixel(600, 240), Some(0xFFFFFF));
    }
}
