pub mod capture;

pub use capture::{CameraSource, OpenCvCamera};
