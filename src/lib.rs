#[cfg(feature = "desktop")]
pub mod camera;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod pose;
pub mod presenter;
pub mod render;
pub mod slot;
