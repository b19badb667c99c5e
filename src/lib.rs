// src/lib.rs
//
// Driving-model output decoder: fixed tensor layout, hypothesis selection,
// weighted polynomial path fitting, calibrated probabilities, temporal
// input state and per-frame publishing.

pub mod config;
pub mod decode;
pub mod inference;
pub mod layout;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use inference::{ModelInputs, ModelRunner};
pub use layout::{ModelOutput, OutputLayout};
pub use pipeline::{CameraFrame, FrameDriver};
