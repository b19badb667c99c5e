// src/decode/mod.rs
//
// Output buffer → typed records.
//
// Signal flow:
//   ModelOutput ─ selector ─┬─ path (polyfit)  ─┐
//                           ├─ series          ─┼→ assemble → ModelDataV1 / ModelDataV2
//                           ├─ lead            ─┤
//                           └─ meta            ─┘
//   pose segment ─ pose → CameraOdometry

pub mod assemble;
pub mod calibration;
pub mod grid;
pub mod lead;
pub mod meta;
pub mod path;
pub mod polyfit;
pub mod pose;
pub mod selector;
pub mod series;

pub use assemble::{assemble_v1, assemble_v2, legacy_valid_len};
pub use calibration::{sigmoid, softmax};
pub use grid::{grids, SampleGrids};
pub use polyfit::{poly_eval, poly_fit};
pub use pose::decode_pose;
pub use selector::{select_lead, select_plan};
