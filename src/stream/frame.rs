//! frame.rs
//! Fixed-size telemetry record: 19 little-endian `f32` fields, 76 bytes.
//!
//! ```text
//! ┌────────────┬─────┬───────┬──────────┬───────┬─────┬───────┬──────────┬─────────┐
//! │ checkpoint │ lap │ speed │ pos xyz  │ steer │ gas │ brake │ finished │ ...     │
//! │ [0]        │ [1] │ [2]   │ [3..6]   │ [6]   │ [7] │ [8]   │ [9]      │ [10..19]│
//! └────────────┴─────┴───────┴──────────┴───────┴─────┴───────┴──────────┴─────────┘
//! ```
//!
//! Slots 0, 1 and 18 carry integers (truncated), 8 and 9 carry booleans
//! (nonzero = true). Field order is the wire contract.

use crate::utils::error::DecodeError;

pub const FIELD_COUNT: usize = 19;
pub const FIELD_SIZE: usize = 4;
pub const FRAME_LEN: usize = FIELD_COUNT * FIELD_SIZE;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Frame {
    pub checkpoint: i32,
    pub lap: i32,
    pub speed: f32,
    pub position: Vec3,
    pub steer: f32,
    pub gas: f32,
    pub brake: bool,
    pub finished: bool,
    pub acceleration: f32,
    pub jerk: f32,
    pub aim_yaw: f32,
    pub aim_pitch: f32,
    pub fl_steer_angle: f32,
    pub fr_steer_angle: f32,
    pub fl_slip: f32,
    pub fr_slip: f32,
    pub gear: i32,
}

impl Frame {
    /// Decode one record. `bytes` must be exactly `FRAME_LEN` long.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != FRAME_LEN {
            return Err(DecodeError::Length {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }

        let mut raw = [0f32; FIELD_COUNT];
        for (slot, chunk) in raw.iter_mut().zip(bytes.chunks_exact(FIELD_SIZE)) {
            *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self::from_fields(raw))
    }

    /// Build from the raw wire values, applying the integer/boolean slot rules.
    pub fn from_fields(f: [f32; FIELD_COUNT]) -> Self {
        Self {
            // `as` truncates toward zero, saturates, and maps NaN to 0.
            checkpoint: f[0] as i32,
            lap: f[1] as i32,
            speed: f[2],
            position: Vec3 { x: f[3], y: f[4], z: f[5] },
            steer: f[6],
            gas: f[7],
            brake: f[8] != 0.0,
            finished: f[9] != 0.0,
            acceleration: f[10],
            jerk: f[11],
            aim_yaw: f[12],
            aim_pitch: f[13],
            fl_steer_angle: f[14],
            fr_steer_angle: f[15],
            fl_slip: f[16],
            fr_slip: f[17],
            gear: f[18] as i32,
        }
    }

    /// Wire values in field order. Booleans become 1.0 / 0.0.
    pub fn to_fields(&self) -> [f32; FIELD_COUNT] {
        [
            self.checkpoint as f32,
            self.lap as f32,
            self.speed,
            self.position.x,
            self.position.y,
            self.position.z,
            self.steer,
            self.gas,
            if self.brake { 1.0 } else { 0.0 },
            if self.finished { 1.0 } else { 0.0 },
            self.acceleration,
            self.jerk,
            self.aim_yaw,
            self.aim_pitch,
            self.fl_steer_angle,
            self.fr_steer_angle,
            self.fl_slip,
            self.fr_slip,
            self.gear as f32,
        ]
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        encode_fields(&self.to_fields())
    }
}

/// Serialize raw field values as they would appear on the wire.
pub fn encode_fields(fields: &[f32; FIELD_COUNT]) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    for (chunk, value) in out.chunks_exact_mut(FIELD_SIZE).zip(fields.iter()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    out
}
