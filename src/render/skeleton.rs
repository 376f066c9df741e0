use crate::pose::BodyPart;

/// 骨格の接続 (開始キーポイント, 終了キーポイント)
pub type SkeletonEdge = (BodyPart, BodyPart);

/// 骨格の接続定義（描画順）
pub const SKELETON_EDGES: [SkeletonEdge; 12] = [
    // 腕
    (BodyPart::LeftWrist, BodyPart::LeftElbow),
    (BodyPart::LeftElbow, BodyPart::LeftShoulder),
    (BodyPart::LeftShoulder, BodyPart::RightShoulder),
    (BodyPart::RightShoulder, BodyPart::RightElbow),
    (BodyPart::RightElbow, BodyPart::RightWrist),
    // 胴体
    (BodyPart::LeftShoulder, BodyPart::LeftHip),
    (BodyPart::LeftHip, BodyPart::RightHip),
    (BodyPart::RightHip, BodyPart::RightShoulder),
    // 脚
    (BodyPart::LeftHip, BodyPart::LeftKnee),
    (BodyPart::LeftKnee, BodyPart::LeftAnkle),
    (BodyPart::RightHip, BodyPart::RightKnee),
    (BodyPart::RightKnee, BodyPart::RightAnkle),
];

pub fn edges() -> &'static [SkeletonEdge] {
    &SKELETON_EDGES
}

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0x00FFFF; // シアン

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0xFFFFFF; // 白

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_distinct() {
        for (i, a) in SKELETON_EDGES.iter().enumerate() {
            assert_ne!(a.0, a.1);
            for b in &SKELETON_EDGES[i + 1..] {
                assert!(a != b && (a.1, a.0) != *b, "duplicate edge {:?}", a);
            }
        }
    }

    #[test]
    fn test_face_is_not_connected() {
        let face = [
            BodyPart::Nose,
            BodyPart::LeftEye,
            BodyPart::RightEye,
            BodyPart::LeftEar,
            BodyPart::RightEar,
        ];
        assert!(edges()
            .iter()
            .all(|(a, b)| !face.contains(a) && !face.contains(b)));
    }
}
