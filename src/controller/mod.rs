//! Controller subsystem for gamepad input handling
//!
//! 1. [`event_collector`] - Raw gamepad input collection (gilrs, own thread)
//! 2. [`controller_handle`] - Sampled controller state and lifecycle
//! 3. [`trigger`] / [`command_controller`] - Boolean conditions for command bindings
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Collector ──[watch]──► XboxController ──► CommandXboxController ──► Trigger
//!             (thread)               (non-blocking reads)   (memoized per input)
//! ```

pub mod command_controller;
pub mod controller_handle;
pub mod event_collector;
pub mod trigger;

pub use command_controller::CommandXboxController;
pub use controller_handle::{
    ControllerError, ControllerHandle, ControllerSettings, ControllerState, Pov, XboxAxis,
    XboxButton, XboxController,
};
pub use trigger::{AxisThreshold, Trigger, TriggerKey};
