//! Xbox controller for command bindings.
//!
//! Hands out [`Trigger`]s instead of raw button values. Button and directional
//! switch triggers are memoized: asking for the same input twice returns the
//! same instance, so every binding site shares one edge-tracking state in the
//! scheduler. Axis threshold triggers are built fresh on each call.
//!
//! ```rust
//! use shooter_control::controller::{CommandXboxController, XboxController};
//!
//! let (_state, hid) = XboxController::detached(0);
//! let mut driver = CommandXboxController::new(hid);
//! assert!(driver.a().ptr_eq(&driver.a()));
//! ```

use std::collections::HashMap;
use tracing::debug;

use crate::controller::controller_handle::{ControllerError, Pov, XboxAxis, XboxButton, XboxController};
use crate::controller::trigger::{AxisThreshold, Trigger};

#[derive(Debug)]
pub struct CommandXboxController {
    hid: XboxController,
    buttons: HashMap<XboxButton, Trigger>,
    povs: HashMap<Pov, Trigger>,
}

impl CommandXboxController {
    pub fn new(hid: XboxController) -> Self {
        Self {
            hid,
            buttons: HashMap::new(),
            povs: HashMap::new(),
        }
    }

    /// The underlying controller handle
    pub fn hid(&self) -> &XboxController {
        &self.hid
    }

    /// Trigger for a logical button, created on first request
    pub fn button(&mut self, button: XboxButton) -> Trigger {
        let hid = &self.hid;
        self.buttons
            .entry(button)
            .or_insert_with(|| {
                debug!("Creating trigger for {:?} on port {}", button, hid.port());
                let hid = hid.clone();
                Trigger::new(format!("{:?}", button), move || hid.raw_button(button))
            })
            .clone()
    }

    /// Trigger for a raw HID button number
    pub fn raw_button(&mut self, number: u8) -> Result<Trigger, ControllerError> {
        let button = XboxButton::try_from(number)?;
        Ok(self.button(button))
    }

    /// Trigger for one directional switch position, created on first request
    pub fn pov(&mut self, pov: Pov) -> Trigger {
        let hid = &self.hid;
        self.povs
            .entry(pov)
            .or_insert_with(|| {
                debug!("Creating trigger for POV {:?} on port {}", pov, hid.port());
                let hid = hid.clone();
                let angle = pov.angle();
                Trigger::new(format!("POV {}", angle), move || hid.pov() == Some(angle))
            })
            .clone()
    }

    pub fn raw_pov(&mut self, angle: u16) -> Result<Trigger, ControllerError> {
        let pov = Pov::try_from(angle)?;
        Ok(self.pov(pov))
    }

    /// New trigger that is active while `|axis| >= threshold`.
    ///
    /// Not memoized: two calls give two equivalent but distinct triggers.
    pub fn axis_trigger(&self, axis: XboxAxis, threshold: f64) -> Result<Trigger, ControllerError> {
        let threshold = AxisThreshold::new(axis, threshold)?;
        Ok(threshold.into_trigger(self.hid.clone()))
    }

    pub fn axis_trigger_raw(&self, number: u8, threshold: f64) -> Result<Trigger, ControllerError> {
        let axis = XboxAxis::try_from(number)?;
        self.axis_trigger(axis, threshold)
    }

    pub fn a(&mut self) -> Trigger {
        self.button(XboxButton::A)
    }

    pub fn b(&mut self) -> Trigger {
        self.button(XboxButton::B)
    }

    pub fn x(&mut self) -> Trigger {
        self.button(XboxButton::X)
    }

    pub fn y(&mut self) -> Trigger {
        self.button(XboxButton::Y)
    }

    pub fn left_bumper(&mut self) -> Trigger {
        self.button(XboxButton::LeftBumper)
    }

    pub fn right_bumper(&mut self) -> Trigger {
        self.button(XboxButton::RightBumper)
    }

    pub fn back(&mut self) -> Trigger {
        self.button(XboxButton::Back)
    }

    pub fn start(&mut self) -> Trigger {
        self.button(XboxButton::Start)
    }

    pub fn left_stick(&mut self) -> Trigger {
        self.button(XboxButton::LeftStick)
    }

    pub fn right_stick(&mut self) -> Trigger {
        self.button(XboxButton::RightStick)
    }

    pub fn pov_up(&mut self) -> Trigger {
        self.pov(Pov::Up)
    }

    pub fn pov_up_right(&mut self) -> Trigger {
        self.pov(Pov::UpRight)
    }

    pub fn pov_right(&mut self) -> Trigger {
        self.pov(Pov::Right)
    }

    pub fn pov_down_right(&mut self) -> Trigger {
        self.pov(Pov::DownRight)
    }

    pub fn pov_down(&mut self) -> Trigger {
        self.pov(Pov::Down)
    }

    pub fn pov_down_left(&mut self) -> Trigger {
        self.pov(Pov::DownLeft)
    }

    pub fn pov_left(&mut self) -> Trigger {
        self.pov(Pov::Left)
    }

    pub fn pov_up_left(&mut self) -> Trigger {
        self.pov(Pov::UpLeft)
    }

    pub fn left_x(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::LeftX)
    }

    pub fn right_x(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::RightX)
    }

    pub fn left_y(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::LeftY)
    }

    pub fn right_y(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::RightY)
    }

    /// Left trigger axis, in [0, 1]
    pub fn left_trigger_axis(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::LeftTrigger)
    }

    /// Right trigger axis, in [0, 1]
    pub fn right_trigger_axis(&self) -> f64 {
        self.hid.raw_axis(XboxAxis::RightTrigger)
    }

    /// Number of memoized button and switch triggers
    pub fn cached_triggers(&self) -> usize {
        self.buttons.len() + self.povs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::watch;
    use crate::controller::controller_handle::ControllerState;

    fn driver() -> (watch::Sender<ControllerState>, CommandXboxController) {
        let (sender, hid) = XboxController::detached(0);
        (sender, CommandXboxController::new(hid))
    }

    #[test]
    fn repeated_button_requests_return_the_same_instance() {
        let (_sender, mut driver) = driver();
        for button in XboxButton::ALL {
            let first = driver.button(button);
            for _ in 0..3 {
                assert!(first.ptr_eq(&driver.button(button)));
            }
        }
        assert_eq!(driver.cached_triggers(), XboxButton::COUNT);
    }

    #[test]
    fn named_accessors_share_the_cache_with_raw_lookups() {
        let (_sender, mut driver) = driver();
        let a = driver.a();
        assert!(a.ptr_eq(&driver.raw_button(1).unwrap()));
        assert!(driver.right_bumper().ptr_eq(&driver.button(XboxButton::RightBumper)));
        assert!(driver.pov_down().ptr_eq(&driver.raw_pov(180).unwrap()));
    }

    #[test]
    fn distinct_inputs_get_distinct_triggers() {
        let (_sender, mut driver) = driver();
        let buttons: Vec<Trigger> = XboxButton::ALL.iter().map(|b| driver.button(*b)).collect();
        for (i, lhs) in buttons.iter().enumerate() {
            for rhs in &buttons[i + 1..] {
                assert!(!lhs.ptr_eq(rhs));
            }
        }

        let povs: Vec<Trigger> = Pov::ALL.iter().map(|p| driver.pov(*p)).collect();
        for (i, lhs) in povs.iter().enumerate() {
            for rhs in &povs[i + 1..] {
                assert!(!lhs.ptr_eq(rhs));
            }
        }
    }

    #[test]
    fn pov_triggers_match_only_their_angle() {
        let (sender, mut driver) = driver();
        let triggers: Vec<(Pov, Trigger)> = Pov::ALL.iter().map(|p| (*p, driver.pov(*p))).collect();

        for pov in Pov::ALL {
            sender.send_modify(|state| state.pov = Some(pov.angle()));
            for (candidate, trigger) in &triggers {
                assert_eq!(trigger.get(), *candidate == pov, "{:?} vs {:?}", candidate, pov);
            }
        }

        sender.send_modify(|state| state.pov = None);
        assert!(triggers.iter().all(|(_, trigger)| !trigger.get()));
    }

    #[test]
    fn button_trigger_reads_live_state() {
        let (sender, mut driver) = driver();
        let x = driver.x();
        assert!(!x.get());
        sender.send_modify(|state| state.set_button(XboxButton::X, true));
        assert!(x.get());
    }

    #[test]
    fn axis_triggers_are_equivalent_but_not_memoized() {
        let (sender, driver) = driver();
        let first = driver.axis_trigger(XboxAxis::RightTrigger, 0.5).unwrap();
        let second = driver.axis_trigger(XboxAxis::RightTrigger, 0.5).unwrap();
        assert!(!first.ptr_eq(&second));
        assert_eq!(driver.cached_triggers(), 0);

        sender.send_modify(|state| state.set_axis(XboxAxis::RightTrigger, 0.5));
        assert!(first.get());
        assert!(second.get());

        sender.send_modify(|state| state.set_axis(XboxAxis::RightTrigger, 0.2));
        assert_eq!(first.get(), second.get());
        assert!(!first.get());
    }

    #[test]
    fn unknown_identifiers_fail_fast() {
        let (_sender, mut driver) = driver();
        assert!(matches!(driver.raw_button(42), Err(ControllerError::UnknownButton(42))));
        assert!(matches!(driver.raw_pov(10), Err(ControllerError::UnknownPov(10))));
        assert!(matches!(
            driver.axis_trigger_raw(9, 0.5),
            Err(ControllerError::UnknownAxis(9))
        ));
        assert!(driver.axis_trigger(XboxAxis::LeftX, f64::NAN).is_err());
    }

    #[test]
    fn axis_getters_read_native_ranges() {
        let (sender, driver) = driver();
        sender.send_modify(|state| {
            state.set_axis(XboxAxis::LeftX, -0.25);
            state.set_axis(XboxAxis::RightY, 0.75);
            state.set_axis(XboxAxis::LeftTrigger, 0.6);
        });
        assert_eq!(driver.left_x(), -0.25);
        assert_eq!(driver.right_y(), 0.75);
        assert_eq!(driver.left_trigger_axis(), 0.6);
        assert_eq!(driver.right_trigger_axis(), 0.0);
    }
}
