//! actuator.rs
//! Boundary to the virtual game controller.
//!
//! The controller itself lives outside this crate (a uinput/ViGEm device);
//! here we only define the action it consumes and the trait it implements.

use log::{debug, info};

use crate::utils::error::ControlError;

/// One control input. Values are clamped into range on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlAction {
    /// Left stick x, -1 (full left) to 1 (full right).
    pub steer: f32,
    /// Right trigger, 0 to 1.
    pub throttle: f32,
    /// Left trigger, 0 to 1.
    pub brake: f32,
}

impl ControlAction {
    pub const NEUTRAL: Self = Self {
        steer: 0.0,
        throttle: 0.0,
        brake: 0.0,
    };

    pub fn new(steer: f32, throttle: f32, brake: f32) -> Self {
        Self {
            steer: clamp_or_zero(steer, -1.0, 1.0),
            throttle: clamp_or_zero(throttle, 0.0, 1.0),
            brake: clamp_or_zero(brake, 0.0, 1.0),
        }
    }
}

impl From<(f32, f32, f32)> for ControlAction {
    fn from((steer, throttle, brake): (f32, f32, f32)) -> Self {
        Self::new(steer, throttle, brake)
    }
}

// NaN would reach the device as garbage.
fn clamp_or_zero(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(lo, hi) }
}

/// A device that accepts control actions.
pub trait Actuator {
    fn send_action(&mut self, action: ControlAction) -> Result<(), ControlError>;

    /// Release all inputs and trigger the game's restart binding.
    fn reset(&mut self) -> Result<(), ControlError>;
}

/// Dry-run actuator: logs what would be sent. Used when no device is attached.
#[derive(Debug, Default)]
pub struct LogActuator {
    last: Option<ControlAction>,
    actions_sent: u64,
    resets: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_action(&self) -> Option<ControlAction> {
        self.last
    }

    pub fn actions_sent(&self) -> u64 {
        self.actions_sent
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }
}

impl Actuator for LogActuator {
    fn send_action(&mut self, action: ControlAction) -> Result<(), ControlError> {
        debug!(
            "[Actuator] steer={:.2} throttle={:.2} brake={:.2}",
            action.steer, action.throttle, action.brake
        );
        self.last = Some(action);
        self.actions_sent += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ControlError> {
        info!("[Actuator] reset");
        self.last = Some(ControlAction::NEUTRAL);
        self.resets += 1;
        Ok(())
    }
}
