use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::pose::DEFAULT_SCORE_THRESHOLD;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub path: String,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// 推論スレッド数
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_model_path() -> String { "models/movenet_thunder.onnx".to_string() }
fn default_input_name() -> String { "serving_default_input_0".to_string() }
fn default_output_name() -> String { "StatefulPartitionedCall_0".to_string() }
fn default_threads() -> usize { 4 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            input_name: default_input_name(),
            output_name: default_output_name(),
            threads: default_threads(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
    #[serde(default = "default_camera_fps")]
    pub fps: u32,
}

fn default_camera_width() -> u32 { 640 }
fn default_camera_height() -> u32 { 480 }
fn default_camera_fps() -> u32 { 30 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
            fps: default_camera_fps(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    /// この値を超えるスコアのキーポイントを描画
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_point_radius")]
    pub point_radius: f32,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// 0xRRGGBB
    #[serde(default = "default_point_color")]
    pub point_color: u32,
    /// 0xRRGGBB
    #[serde(default = "default_line_color")]
    pub line_color: u32,
}

fn default_threshold() -> f32 { DEFAULT_SCORE_THRESHOLD }
fn default_point_radius() -> f32 { 8.0 }
fn default_line_width() -> f32 { 4.0 }
fn default_point_color() -> u32 { 0x00FFFF }
fn default_line_color() -> u32 { 0xFFFFFF }

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            point_radius: default_point_radius(),
            line_width: default_line_width(),
            point_color: default_point_color(),
            line_color: default_line_color(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// この値を超えるスコアのキーポイントを書き出す（描画側とは独立）
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// 更新ごとに JSON を標準出力に出す
    #[serde(default)]
    pub print: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            print: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// tracing のフィルタ (RUST_LOG が優先)
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 読み込めなければ既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }
}
