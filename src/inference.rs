// src/inference.rs
//
// Seam to the inference runtime. The decoder only cares that a runner
// consumes the two-frame window (plus optional side inputs) and overwrites
// the output buffer in the agreed layout.

use anyhow::Result;

/// Everything fed to the network for one frame.
#[derive(Debug, Clone, Copy)]
pub struct ModelInputs<'a> {
    /// Previous and current preprocessed frame, concatenated.
    pub frames: &'a [f32],
    /// Pulse-encoded desire vector.
    pub desire: Option<&'a [f32]>,
    /// Static left/right-hand-drive one-hot.
    pub traffic_convention: Option<&'a [f32]>,
    /// Recurrent state copied from the previous frame's output tail.
    pub recurrent_state: Option<&'a [f32]>,
}

pub trait ModelRunner {
    /// Run one synchronous inference, writing the full output buffer.
    fn execute(&mut self, inputs: &ModelInputs<'_>, output: &mut [f32]) -> Result<()>;

    /// Output length the runtime will produce, when known up front. Checked
    /// once against the configured layout.
    fn output_len(&self) -> Option<usize> {
        None
    }
}

#[cfg(feature = "onnx")]
pub use self::onnx::OrtRunner;

#[cfg(feature = "onnx")]
mod onnx {
    use super::{ModelInputs, ModelRunner};
    use crate::config::ModelConfig;
    use crate::layout::{
        DESIRE_LEN, MODEL_FRAME_SIZE, MODEL_HEIGHT, MODEL_WIDTH, TEMPORAL_SIZE,
        TRAFFIC_CONVENTION_LEN,
    };
    use anyhow::{ensure, Context, Result};
    use ort::{
        execution_providers::CUDAExecutionProvider,
        session::{builder::GraphOptimizationLevel, Session, SessionInputValue},
        value::Value,
    };
    use std::borrow::Cow;
    use tracing::{debug, info};

    /// ONNX Runtime backed runner for the driving model.
    pub struct OrtRunner {
        session: Session,
    }

    impl OrtRunner {
        pub fn new(config: &ModelConfig) -> Result<Self> {
            info!("Initializing driving model runtime");
            info!("Model path: {}", config.path);
            ensure!(
                config.frame_size == MODEL_FRAME_SIZE,
                "ONNX runner expects frame_size {} (got {})",
                MODEL_FRAME_SIZE,
                config.frame_size
            );

            let session = Session::builder()?
                .with_execution_providers([CUDAExecutionProvider::default()
                    .with_device_id(0)
                    .build()])?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(config.num_threads)?
                .with_inter_threads(1)?
                .commit_from_file(&config.path)
                .context("Failed to load driving model")?;

            info!("✓ Driving model runtime ready");
            Ok(Self { session })
        }
    }

    fn tensor(shape: &[usize], data: &[f32]) -> Result<SessionInputValue<'static>> {
        let value = Value::from_array((shape, data.to_vec().into_boxed_slice()))?;
        Ok(value.into())
    }

    impl ModelRunner for OrtRunner {
        fn execute(&mut self, inputs: &ModelInputs<'_>, output: &mut [f32]) -> Result<()> {
            debug!("Running driving model");

            // Two YUV420 frames as 6 planes each at half resolution
            let imgs_shape = [1, 12, MODEL_HEIGHT / 2, MODEL_WIDTH / 2];
            let mut feeds: Vec<(Cow<'static, str>, SessionInputValue<'static>)> =
                vec![("input_imgs".into(), tensor(&imgs_shape, inputs.frames)?)];

            if let Some(desire) = inputs.desire {
                feeds.push(("desire".into(), tensor(&[1, DESIRE_LEN], desire)?));
            }
            if let Some(tc) = inputs.traffic_convention {
                feeds.push((
                    "traffic_convention".into(),
                    tensor(&[1, TRAFFIC_CONVENTION_LEN], tc)?,
                ));
            }
            if let Some(state) = inputs.recurrent_state {
                feeds.push(("initial_state".into(), tensor(&[1, TEMPORAL_SIZE], state)?));
            }

            let outputs = self.session.run(feeds).context("Inference failed")?;
            let (_, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract output tensor")?;

            ensure!(
                data.len() == output.len(),
                "Model produced {} floats, layout expects {}",
                data.len(),
                output.len()
            );
            output.copy_from_slice(data);
            Ok(())
        }
    }
}
