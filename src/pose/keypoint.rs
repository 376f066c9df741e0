/// 描画・書き出しに使う信頼度の既定閾値（この値ちょうどは含まない）
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;

/// MoveNet の 17 キーポイント（モデル出力の並び順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    pub const COUNT: usize = 17;

    /// インデックス順の全キーポイント
    pub const ALL: [BodyPart; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// JSON 出力で使う名前
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 単一キーポイント
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub body_part: BodyPart,
    /// 正規化されたX座標 (0.0〜1.0、モデル入力基準)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0、モデル入力基準)
    pub y: f32,
    /// 信頼度スコア (通常 0.0〜1.0)
    pub score: f32,
}

impl Keypoint {
    pub fn new(body_part: BodyPart, x: f32, y: f32, score: f32) -> Self {
        Self {
            body_part,
            x,
            y,
            score,
        }
    }

    /// 信頼度が閾値を超えているか（閾値ちょうどは false）
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.score > threshold
    }

    /// 描画面の座標に変換
    pub fn to_surface(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// 17キーポイントからなる姿勢
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: [Keypoint; BodyPart::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; BodyPart::COUNT]) -> Self {
        Self { keypoints }
    }

    pub fn get(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part.index()]
    }

    /// 閾値を超えるキーポイントのみをインデックス順に返す
    pub fn confident(&self, threshold: f32) -> impl Iterator<Item = &Keypoint> {
        self.keypoints
            .iter()
            .filter(move |kp| kp.is_confident(threshold))
    }

    /// 全キーポイントの平均信頼度
    pub fn average_score(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.score).sum();
        sum / BodyPart::COUNT as f32
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: BodyPart::ALL.map(|part| Keypoint::new(part, 0.0, 0.0, 0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_part_count() {
        assert_eq!(BodyPart::COUNT, 17);
        assert_eq!(BodyPart::ALL.len(), 17);
    }

    #[test]
    fn test_body_part_from_index() {
        assert_eq!(BodyPart::from_index(0), Some(BodyPart::Nose));
        assert_eq!(BodyPart::from_index(16), Some(BodyPart::RightAnkle));
        assert_eq!(BodyPart::from_index(17), None);
    }

    #[test]
    fn test_body_part_index_matches_order() {
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
        }
    }

    #[test]
    fn test_body_part_names_are_unique() {
        let mut names: Vec<_> = BodyPart::ALL.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BodyPart::COUNT);
        assert_eq!(BodyPart::LeftWrist.name(), "left_wrist");
    }

    #[test]
    fn test_keypoint_is_confident_is_strict() {
        let kp = Keypoint::new(BodyPart::Nose, 0.5, 0.5, 0.3);
        assert!(!kp.is_confident(0.3));
        assert!(kp.is_confident(0.29));
    }

    #[test]
    fn test_keypoint_to_surface() {
        let kp = Keypoint::new(BodyPart::Nose, 0.5, 0.25, 1.0);
        assert_eq!(kp.to_surface(640, 480), (320.0, 120.0));
    }

    #[test]
    fn test_pose_get_and_confident() {
        let mut pose = Pose::default();
        pose.keypoints[BodyPart::Nose.index()] = Keypoint::new(BodyPart::Nose, 0.5, 0.3, 0.9);

        let nose = pose.get(BodyPart::Nose);
        assert_eq!(nose.x, 0.5);
        assert_eq!(nose.y, 0.3);
        assert_eq!(nose.score, 0.9);

        let confident: Vec<_> = pose.confident(DEFAULT_SCORE_THRESHOLD).collect();
        assert_eq!(confident.len(), 1);
        assert_eq!(confident[0].body_part, BodyPart::Nose);
    }

    #[test]
    fn test_pose_average_score() {
        let pose = Pose::new(BodyPart::ALL.map(|p| Keypoint::new(p, 0.0, 0.0, 0.5)));
        assert!((pose.average_score() - 0.5).abs() < 0.001);
    }
}
