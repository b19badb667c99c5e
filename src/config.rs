// src/config.rs

use crate::layout::MODEL_FRAME_SIZE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub vehicle: VehicleConfig,
    pub publish: PublishConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    /// Floats per preprocessed frame.
    pub frame_size: usize,
    /// Model carries a recurrent state tail that is fed back each frame.
    pub temporal: bool,
    /// Model takes a pulse-encoded desire input.
    pub desire: bool,
    /// Model takes the traffic-convention one-hot.
    pub traffic_convention: bool,
    pub num_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/supercombo.onnx".to_string(),
            frame_size: MODEL_FRAME_SIZE,
            temporal: true,
            desire: true,
            traffic_convention: true,
            num_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Right-hand drive. Read once, injected as a static one-hot input.
    pub is_rhd: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Attach a raw byte copy of the output buffer to every model record.
    pub send_raw_pred: bool,
    pub model_channel: String,
    pub model_v2_channel: String,
    pub odometry_channel: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            send_raw_pred: false,
            model_channel: "model".to_string(),
            model_v2_channel: "modelV2".to_string(),
            odometry_channel: "cameraOdometry".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "modeld=info,ort=warn".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Invalid config YAML")?;
        anyhow::ensure!(config.model.frame_size > 0, "model.frame_size must be > 0");
        Ok(config)
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over the configured level.
/// Safe to call more than once.
pub fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
