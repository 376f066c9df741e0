use ndarray::Array4;

use crate::error::InferenceError;

/// 推論エンジンの境界
///
/// 入力: [1, 256, 256, 3] の f32 テンソル
/// 出力: [1, 1, 17, 3] の f32 テンソル (y, x, score)
///
/// この形状を満たすエンジンであれば差し替え可能。
pub trait InferenceEngine: Send {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>, InferenceError>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>, InferenceError> {
        (**self).run(input)
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPoseEngine;

#[cfg(feature = "onnx")]
mod onnx {
    use ndarray::Array4;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::fmt::Display;
    use std::path::Path;
    use tracing::info;

    use super::InferenceEngine;
    use crate::config::ModelConfig;
    use crate::error::{InferenceError, ModelLoadError};

    /// ONNX Runtime で MoveNet を実行するエンジン
    pub struct OnnxPoseEngine {
        session: Session,
        input_name: String,
        output_name: String,
    }

    impl OnnxPoseEngine {
        /// ONNXモデルを読み込んで初期化
        pub fn new(config: &ModelConfig) -> Result<Self, ModelLoadError> {
            let path = Path::new(&config.path);
            if !path.exists() {
                return Err(ModelLoadError::NotFound(path.to_path_buf()));
            }

            let session = Session::builder()
                .map_err(load_error(path))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(load_error(path))?
                .with_intra_threads(config.threads)
                .map_err(load_error(path))?
                .commit_from_file(path)
                .map_err(load_error(path))?;

            info!(model = %path.display(), threads = config.threads, "pose model loaded");

            Ok(Self {
                session,
                input_name: config.input_name.clone(),
                output_name: config.output_name.clone(),
            })
        }
    }

    impl InferenceEngine for OnnxPoseEngine {
        fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>, InferenceError> {
            let input_tensor = Tensor::from_array(input).map_err(runtime_error)?;
            let outputs = self
                .session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .map_err(runtime_error)?;

            let value = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                InferenceError::Runtime(format!("missing output tensor {}", self.output_name))
            })?;

            // MoveNet の出力は [1, 1, 17, 3] (y, x, score)
            let (shape, data) = value.try_extract_tensor::<f32>().map_err(runtime_error)?;
            let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

            match shape.as_slice() {
                &[a, b, c, d] => Array4::from_shape_vec((a, b, c, d), data.to_vec())
                    .map_err(|_| InferenceError::OutputShape { actual: shape }),
                _ => Err(InferenceError::OutputShape { actual: shape }),
            }
        }
    }

    fn load_error<E: Display>(path: &Path) -> impl Fn(E) -> ModelLoadError + '_ {
        move |e| ModelLoadError::Runtime {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    fn runtime_error<E: Display>(e: E) -> InferenceError {
        InferenceError::Runtime(e.to_string())
    }
}
