use ndarray::Array4;

use super::keypoint::{BodyPart, Keypoint, Pose};
use crate::error::InferenceError;

/// 1キーポイントあたりの値の数 (y, x, score)
pub const VALUES_PER_KEYPOINT: usize = 3;

/// モデル出力の要素数 [1, 1, 17, 3]
pub const OUTPUT_LEN: usize = BodyPart::COUNT * VALUES_PER_KEYPOINT;

/// モデル出力テンソルの形状
pub const OUTPUT_SHAPE: [usize; 4] = [1, 1, BodyPart::COUNT, VALUES_PER_KEYPOINT];

/// MoveNet の生出力を姿勢に変換
///
/// 各キーポイント i について `[i*3]=y, [i*3+1]=x, [i*3+2]=score`。
/// y が x より先に来る。フィルタや並べ替えはしない。
pub fn decode(output: &[f32; OUTPUT_LEN]) -> Pose {
    let keypoints = BodyPart::ALL.map(|part| {
        let base = part.index() * VALUES_PER_KEYPOINT;
        let y = output[base];
        let x = output[base + 1];
        let score = output[base + 2];
        Keypoint::new(part, x, y, score)
    });

    Pose::new(keypoints)
}

/// 出力テンソルの形状を確認してからデコード
pub fn decode_tensor(output: &Array4<f32>) -> Result<Pose, InferenceError> {
    if output.shape() != OUTPUT_SHAPE {
        return Err(InferenceError::OutputShape {
            actual: output.shape().to_vec(),
        });
    }

    let mut buffer = [0.0f32; OUTPUT_LEN];
    for (dst, src) in buffer.iter_mut().zip(output.iter()) {
        *dst = *src;
    }

    Ok(decode(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn indexed_buffer() -> [f32; OUTPUT_LEN] {
        let mut buffer = [0.0f32; OUTPUT_LEN];
        for (i, v) in buffer.iter_mut().enumerate() {
            *v = i as f32;
        }
        buffer
    }

    #[test]
    fn test_decode_field_mapping() {
        let pose = decode(&indexed_buffer());

        for (i, kp) in pose.keypoints.iter().enumerate() {
            assert_eq!(kp.body_part, BodyPart::ALL[i]);
            assert_eq!(kp.y, (i * 3) as f32);
            assert_eq!(kp.x, (i * 3 + 1) as f32);
            assert_eq!(kp.score, (i * 3 + 2) as f32);
        }
    }

    #[test]
    fn test_decode_does_not_filter_low_scores() {
        let pose = decode(&[0.0; OUTPUT_LEN]);
        assert_eq!(pose.keypoints.len(), BodyPart::COUNT);
        assert!(pose.keypoints.iter().all(|kp| kp.score == 0.0));
    }

    #[test]
    fn test_decode_tensor_matches_flat_decode() {
        let buffer = indexed_buffer();
        let tensor = Array4::from_shape_vec(OUTPUT_SHAPE, buffer.to_vec()).unwrap();
        assert_eq!(decode_tensor(&tensor).unwrap(), decode(&buffer));
    }

    #[test]
    fn test_decode_tensor_rejects_wrong_shape() {
        let tensor = Array4::<f32>::zeros((1, 1, 17, 2));
        match decode_tensor(&tensor) {
            Err(InferenceError::OutputShape { actual }) => assert_eq!(actual, vec![1, 1, 17, 2]),
            other => panic!("expected OutputShape error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_decode_is_total_and_deterministic(
            values in prop::collection::vec(-10.0f32..10.0, OUTPUT_LEN)
        ) {
            let mut buffer = [0.0f32; OUTPUT_LEN];
            buffer.copy_from_slice(&values);

            let first = decode(&buffer);
            let second = decode(&buffer);
            prop_assert_eq!(&first, &second);

            for (i, kp) in first.keypoints.iter().enumerate() {
                prop_assert_eq!(kp.body_part.index(), i);
                prop_assert_eq!(kp.y, buffer[i * 3]);
                prop_assert_eq!(kp.x, buffer[i * 3 + 1]);
                prop_assert_eq!(kp.score, buffer[i * 3 + 2]);
            }
        }
    }
}
