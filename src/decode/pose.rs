// src/decode/pose.rs
//
// Visual odometry: [trans(3) | rot(3) | trans log-std(3) | rot log-std(3)].

use crate::types::CameraOdometry;

pub fn decode_pose(pose: &[f32], frame_id: u32, timestamp_eof: u64) -> CameraOdometry {
    let mut trans = [0.0f32; 3];
    let mut rot = [0.0f32; 3];
    let mut trans_std = [0.0f32; 3];
    let mut rot_std = [0.0f32; 3];

    for i in 0..3 {
        trans[i] = pose[i];
        rot[i] = pose[3 + i];
        trans_std[i] = pose[6 + i].exp();
        rot_std[i] = pose[9 + i].exp();
    }

    CameraOdometry {
        frame_id,
        timestamp_eof,
        trans,
        rot,
        trans_std,
        rot_std,
    }
}
