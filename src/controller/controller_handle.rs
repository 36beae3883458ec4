//! Controller Handle - Unified API for gamepad input
//!
//! Owns the collector thread that samples the physical gamepad and exposes the
//! most recently sampled state through [`XboxController`]. Reads never block:
//! the collector publishes into a `watch` channel and readers only borrow the
//! latest value.
//!
//! ```text
//! Gamepad ──► EventCollector ──[watch<ControllerState>]──► XboxController
//!             (own thread)                                 (robot loop)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use super::event_collector::{CollectorError, CollectorHandle, CollectorSettings};

/// Logical buttons of an Xbox-style controller.
///
/// Discriminants are the raw HID button numbers reported by the driver station
/// convention (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XboxButton {
    A = 1,
    B = 2,
    X = 3,
    Y = 4,
    LeftBumper = 5,
    RightBumper = 6,
    Back = 7,
    Start = 8,
    LeftStick = 9,
    RightStick = 10,
}

impl XboxButton {
    pub const COUNT: usize = 10;

    pub const ALL: [XboxButton; Self::COUNT] = [
        XboxButton::A,
        XboxButton::B,
        XboxButton::X,
        XboxButton::Y,
        XboxButton::LeftBumper,
        XboxButton::RightBumper,
        XboxButton::Back,
        XboxButton::Start,
        XboxButton::LeftStick,
        XboxButton::RightStick,
    ];

    /// Raw HID button number
    pub fn value(self) -> u8 {
        self as u8
    }

    fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for XboxButton {
    type Error = ControllerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        XboxButton::ALL
            .into_iter()
            .find(|button| button.value() == value)
            .ok_or(ControllerError::UnknownButton(value))
    }
}

/// Analog axes. Stick axes range over [-1, 1], trigger axes over [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XboxAxis {
    LeftX = 0,
    LeftY = 1,
    LeftTrigger = 2,
    RightTrigger = 3,
    RightX = 4,
    RightY = 5,
}

impl XboxAxis {
    pub const COUNT: usize = 6;

    pub const ALL: [XboxAxis; Self::COUNT] = [
        XboxAxis::LeftX,
        XboxAxis::LeftY,
        XboxAxis::LeftTrigger,
        XboxAxis::RightTrigger,
        XboxAxis::RightX,
        XboxAxis::RightY,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_trigger(self) -> bool {
        matches!(self, XboxAxis::LeftTrigger | XboxAxis::RightTrigger)
    }

    /// Clamps a raw reading into the native range of this axis
    pub fn clamp(self, value: f64) -> f64 {
        if self.is_trigger() {
            value.clamp(0.0, 1.0)
        } else {
            value.clamp(-1.0, 1.0)
        }
    }
}

impl TryFrom<u8> for XboxAxis {
    type Error = ControllerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        XboxAxis::ALL
            .into_iter()
            .find(|axis| axis.value() == value)
            .ok_or(ControllerError::UnknownAxis(value))
    }
}

/// Positions of the eight-way directional switch, in degrees clockwise from up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pov {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Pov {
    pub const ALL: [Pov; 8] = [
        Pov::Up,
        Pov::UpRight,
        Pov::Right,
        Pov::DownRight,
        Pov::Down,
        Pov::DownLeft,
        Pov::Left,
        Pov::UpLeft,
    ];

    pub fn angle(self) -> u16 {
        match self {
            Pov::Up => 0,
            Pov::UpRight => 45,
            Pov::Right => 90,
            Pov::DownRight => 135,
            Pov::Down => 180,
            Pov::DownLeft => 225,
            Pov::Left => 270,
            Pov::UpLeft => 315,
        }
    }
}

impl TryFrom<u16> for Pov {
    type Error = ControllerError;

    fn try_from(angle: u16) -> Result<Self, Self::Error> {
        Pov::ALL
            .into_iter()
            .find(|pov| pov.angle() == angle)
            .ok_or(ControllerError::UnknownPov(angle))
    }
}

/// One sample of the whole controller
#[derive(Clone, Debug, Default)]
pub struct ControllerState {
    buttons: [bool; XboxButton::COUNT],
    axes: [f64; XboxAxis::COUNT],
    /// Directional switch angle, `None` while centered
    pub pov: Option<u16>,
}

impl ControllerState {
    pub fn button(&self, button: XboxButton) -> bool {
        self.buttons[button.index()]
    }

    pub fn set_button(&mut self, button: XboxButton, pressed: bool) {
        self.buttons[button.index()] = pressed;
    }

    pub fn axis(&self, axis: XboxAxis) -> f64 {
        self.axes[axis as usize]
    }

    pub fn set_axis(&mut self, axis: XboxAxis, value: f64) {
        self.axes[axis as usize] = axis.clamp(value);
    }

    /// Back to neutral: nothing pressed, sticks centered
    pub fn neutral(&mut self) {
        self.buttons = [false; XboxButton::COUNT];
        self.axes = [0.0; XboxAxis::COUNT];
        self.pov = None;
    }
}

/// Read-only view on one physical controller.
///
/// Cheap to clone; every clone observes the same sampled state.
#[derive(Clone, Debug)]
pub struct XboxController {
    port: u8,
    state: watch::Receiver<ControllerState>,
}

impl XboxController {
    pub fn new(port: u8, state: watch::Receiver<ControllerState>) -> Self {
        Self { port, state }
    }

    /// A controller whose state is driven by the returned sender instead of
    /// hardware. Used by tests and replay tools.
    pub fn detached(port: u8) -> (watch::Sender<ControllerState>, Self) {
        let (sender, receiver) = watch::channel(ControllerState::default());
        (sender, Self::new(port, receiver))
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn raw_button(&self, button: XboxButton) -> bool {
        self.state.borrow().button(button)
    }

    /// Directional switch angle, `None` while centered
    pub fn pov(&self) -> Option<u16> {
        self.state.borrow().pov
    }

    pub fn raw_axis(&self, axis: XboxAxis) -> f64 {
        self.state.borrow().axis(axis)
    }
}

/// Configuration settings for the controller subsystem
///
/// # Examples
///
/// ```rust
/// use shooter_control::controller::ControllerSettings;
///
/// let settings = ControllerSettings {
///     port: 0,
///     gamepad_index: 0,
///     poll_interval_ms: 5,
///     joystick_deadzone: 0.08,
/// };
/// assert!(settings.joystick_deadzone < 0.1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Logical port the controller is exposed as
    pub port: u8,

    /// Which connected gamepad to use when several are present
    pub gamepad_index: usize,

    /// Sleep between two drains of the gilrs event queue
    pub poll_interval_ms: u64,

    /// Analog stick deadzone as a fraction (0.0-1.0)
    ///
    /// Prevents analog stick drift by ignoring small movements near the center position.
    pub joystick_deadzone: f32,
}

impl ControllerSettings {
    /// The deadzone must leave part of the stick travel usable
    pub fn validate(&self) -> Result<(), ControllerError> {
        if !(0.0..1.0).contains(&self.joystick_deadzone) {
            return Err(ControllerError::InvalidDeadzone(self.joystick_deadzone));
        }
        Ok(())
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            port: 0,
            gamepad_index: 0,
            poll_interval_ms: 5,
            joystick_deadzone: 0.05,
        }
    }
}

/// Errors that can occur while setting up or reading the controller
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Error from the event collection subsystem
    #[error("Collector error: {0}")]
    CollectorError(#[from] CollectorError),

    /// Raw button number outside the logical button set
    #[error("Unknown button number: {0}")]
    UnknownButton(u8),

    /// Raw axis number outside the logical axis set
    #[error("Unknown axis number: {0}")]
    UnknownAxis(u8),

    /// Angle that is not one of the eight switch positions
    #[error("Unknown POV angle: {0}")]
    UnknownPov(u16),

    /// Deadzone outside [0, 1)
    #[error("Invalid joystick deadzone: {0}")]
    InvalidDeadzone(f32),

    /// Threshold that cannot be compared against an axis reading
    #[error("Invalid threshold {threshold} for axis {axis:?}")]
    InvalidThreshold { axis: XboxAxis, threshold: f64 },
}

/// Handle for the collector thread feeding one [`XboxController`]
pub struct ControllerHandle {
    shutdown: CancellationToken,
    collector_thread: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Spawns the gamepad collector and returns the handle together with the
    /// controller view the robot loop reads from.
    ///
    /// The collector stops when `shutdown` is cancelled.
    pub fn spawn(
        settings: Option<ControllerSettings>,
        shutdown: CancellationToken,
    ) -> Result<(Self, XboxController), ControllerError> {
        info!(
            "Initializing Controller system with settings: {:?}",
            settings
        );

        let settings = settings.unwrap_or_default();
        settings.validate()?;
        let collector_settings = CollectorSettings {
            gamepad_index: settings.gamepad_index,
            poll_interval_ms: settings.poll_interval_ms,
            joystick_deadzone: settings.joystick_deadzone,
        };
        debug!("Collector settings: {:?}", collector_settings);

        let (state_sender, state_receiver) = watch::channel(ControllerState::default());

        info!("Creating Event Collector");
        let collector =
            CollectorHandle::spawn(Some(collector_settings), state_sender, shutdown.clone())?;
        info!("Event Collector spawned successfully");

        let controller = XboxController::new(settings.port, state_receiver);
        info!("Controller on port {} initialized", settings.port);

        Ok((
            Self {
                shutdown,
                collector_thread: Some(collector.into_thread()),
            },
            controller,
        ))
    }

    /// Stops the collector and waits for its thread to exit
    pub fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.collector_thread.take() {
            match thread.join() {
                Ok(()) => debug!("Collector thread joined"),
                Err(_) => error!("Collector thread panicked"),
            }
        } else {
            warn!("Collector thread already joined");
        }
    }
}

impl fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_numbers_round_trip_through_raw_values() {
        for button in XboxButton::ALL {
            assert_eq!(XboxButton::try_from(button.value()).unwrap(), button);
        }
        assert!(matches!(
            XboxButton::try_from(0),
            Err(ControllerError::UnknownButton(0))
        ));
        assert!(matches!(
            XboxButton::try_from(11),
            Err(ControllerError::UnknownButton(11))
        ));
    }

    #[test]
    fn pov_positions_cover_the_circle_in_45_degree_steps() {
        let angles: Vec<u16> = Pov::ALL.iter().map(|pov| pov.angle()).collect();
        assert_eq!(angles, vec![0, 45, 90, 135, 180, 225, 270, 315]);
        assert!(Pov::try_from(30).is_err());
        assert_eq!(Pov::try_from(225).unwrap(), Pov::DownLeft);
    }

    #[test]
    fn trigger_axes_are_clamped_to_unit_range() {
        let mut state = ControllerState::default();
        state.set_axis(XboxAxis::LeftTrigger, -0.4);
        state.set_axis(XboxAxis::RightY, -1.7);
        assert_eq!(state.axis(XboxAxis::LeftTrigger), 0.0);
        assert_eq!(state.axis(XboxAxis::RightY), -1.0);
    }

    #[test]
    fn deadzone_must_leave_stick_travel() {
        let mut settings = ControllerSettings::default();
        assert!(settings.validate().is_ok());

        for deadzone in [1.0, 1.5, -0.1, f32::NAN] {
            settings.joystick_deadzone = deadzone;
            assert!(matches!(
                settings.validate(),
                Err(ControllerError::InvalidDeadzone(_))
            ));
        }
    }

    #[test]
    fn spawn_rejects_invalid_deadzone_before_touching_hardware() {
        let settings = ControllerSettings {
            joystick_deadzone: 1.0,
            ..ControllerSettings::default()
        };
        let result = ControllerHandle::spawn(Some(settings), CancellationToken::new());
        assert!(matches!(result, Err(ControllerError::InvalidDeadzone(_))));
    }

    #[test]
    fn detached_controller_sees_latest_sample() {
        let (sender, controller) = XboxController::detached(1);
        assert!(!controller.raw_button(XboxButton::B));

        sender.send_modify(|state| {
            state.set_button(XboxButton::B, true);
            state.pov = Some(90);
        });

        assert!(controller.raw_button(XboxButton::B));
        assert_eq!(controller.pov(), Some(90));

        sender.send_modify(ControllerState::neutral);
        assert!(!controller.raw_button(XboxButton::B));
        assert_eq!(controller.pov(), None);
    }
}
