use std::path::PathBuf;

use thiserror::Error;

use crate::pose::PixelFormat;

/// フレームを画素データとして解釈できない
#[derive(Debug, Error)]
pub enum FrameDecodeError {
    #[error("frame has zero size ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("{format:?} frame {width}x{height} needs {expected} bytes, got {actual}")]
    BufferTooShort {
        format: PixelFormat,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{format:?} frame {width}x{height} is too large")]
    FrameTooLarge {
        format: PixelFormat,
        width: u32,
        height: u32,
    },

    #[error("failed to decode encoded frame: {0}")]
    Decode(#[from] image::ImageError),
}

/// 前処理のエラーはフレームデコードのエラーと同じもの
pub type PreprocessError = FrameDecodeError;

/// 推論エンジンの呼び出し失敗
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference failed: {0}")]
    Runtime(String),

    #[error("unexpected output shape {actual:?}, expected [1, 1, 17, 3]")]
    OutputShape { actual: Vec<usize> },
}

/// モデル読み込みの失敗（起動時のみ、致命的）
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to load model {}: {reason}", .path.display())]
    Runtime { path: PathBuf, reason: String },
}

/// 1フレーム分の処理で起こり得るエラー
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Decode(#[from] FrameDecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode pose as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameDecodeError::EmptyFrame { width: 0, height: 480 };
        assert_eq!(err.to_string(), "frame has zero size (0x480)");

        let err = InferenceError::OutputShape { actual: vec![1, 17, 3] };
        assert_eq!(
            err.to_string(),
            "unexpected output shape [1, 17, 3], expected [1, 1, 17, 3]"
        );

        let err = ModelLoadError::NotFound(PathBuf::from("models/missing.onnx"));
        assert_eq!(err.to_string(), "model file not found: models/missing.onnx");
    }

    #[test]
    fn test_frame_error_is_transparent() {
        let err: FrameError = InferenceError::Runtime("boom".to_string()).into();
        assert_eq!(err.to_string(), "inference failed: boom");
    }
}
