pub mod decode;
pub mod detector;
pub mod frame;
pub mod keypoint;
pub mod preprocess;

pub use decode::{decode, decode_tensor, OUTPUT_LEN, OUTPUT_SHAPE};
#[cfg(feature = "onnx")]
pub use detector::OnnxPoseEngine;
pub use detector::InferenceEngine;
pub use frame::{PixelFormat, RawFrame};
pub use keypoint::{BodyPart, Keypoint, Pose, DEFAULT_SCORE_THRESHOLD};
pub use preprocess::{preprocess_for_movenet, MOVENET_INPUT_SIZE};
