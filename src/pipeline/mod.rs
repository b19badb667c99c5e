// src/pipeline/mod.rs

pub mod driver;
pub mod metrics;
pub mod model_state;
pub mod publisher;
pub mod temporal_input;

pub use driver::{CameraFrame, FrameDriver};
pub use metrics::{FrameDropTracker, MetricsSummary, ModelMetrics};
pub use model_state::ModelState;
pub use publisher::{FramePublisher, JsonLinesPublisher, MemoryPublisher, Publisher};
pub use temporal_input::{DesirePulse, TemporalInput};
