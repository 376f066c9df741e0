use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::pose::{Pose, DEFAULT_SCORE_THRESHOLD};

#[derive(Debug, Serialize)]
struct KeypointRecord {
    name: &'static str,
    x: f32,
    y: f32,
    score: f32,
}

#[derive(Debug, Serialize)]
struct PoseRecord {
    keypoints: Vec<KeypointRecord>,
}

/// 閾値を超えるキーポイントを `{"keypoints": [...]}` 形式で書き出す
///
/// インデックス順、4スペースのインデント。
pub fn serialize(pose: &Pose, threshold: f32) -> Result<String, ExportError> {
    let record = PoseRecord {
        keypoints: pose
            .confident(threshold)
            .map(|kp| KeypointRecord {
                name: kp.body_part.name(),
                x: kp.x,
                y: kp.y,
                score: kp.score,
            })
            .collect(),
    };

    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    record.serialize(&mut serializer)?;

    // serde_json は常に UTF-8 を出力する
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// 書き出し側の閾値を持つエクスポータ（描画側とは独立）
#[derive(Debug, Clone, Copy)]
pub struct PoseExporter {
    threshold: f32,
}

impl PoseExporter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn to_json(&self, pose: &Pose) -> Result<String, ExportError> {
        serialize(pose, self.threshold)
    }
}

impl Default for PoseExporter {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_THRESHOLD)
    }
}

impl From<&ExportConfig> for PoseExporter {
    fn from(config: &ExportConfig) -> Self {
        Self::new(config.threshold)
    }
}
