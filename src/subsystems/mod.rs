//! Interfaces of the mechanisms the shooting commands drive.
//!
//! Each subsystem owns its own feedback control; commands only issue setpoints
//! and read back feedback sampled from the previous physical state. Readiness
//! checks (`ready_tarmac`, `at_tarmac`) are decided inside the subsystem.

pub mod sim;

pub use sim::{SimHood, SimIndexer, SimShooter};

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::Requirement;

/// Subsystem shared between the scheduler and the commands using it. The
/// scheduler guarantees only one command touches it per cycle.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(subsystem: T) -> Shared<T> {
    Rc::new(RefCell::new(subsystem))
}

/// Two-wheel flywheel setpoint, in sensor units per 100 ms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityBand {
    pub low: f64,
    pub high: f64,
}

impl VelocityBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

pub trait Subsystem {
    fn requirement(&self) -> Requirement;

    /// Called once per cycle before any command runs
    fn periodic(&mut self) {}
}

pub trait Shooter: Subsystem {
    fn run_at_velocity(&mut self, band: VelocityBand);

    /// Measured flywheel velocity
    fn velocity(&self) -> f64;

    fn run_at_tarmac_velocity(&mut self);

    /// Flywheel within tolerance of the tarmac setpoint
    fn ready_tarmac(&self) -> bool;

    /// Track the setpoint computed from the current target estimate
    fn set_speeds_auto(&mut self);

    fn stop(&mut self);
}

pub trait Hood: Subsystem {
    fn tarmac_shot(&mut self);

    /// Hood within tolerance of the tarmac position
    fn at_tarmac(&self) -> bool;

    /// Track the position computed from the current target estimate
    fn set_position_auto(&mut self);

    fn return_to_default(&mut self);

    fn return_to_zero(&mut self);
}

pub trait Indexer: Subsystem {
    fn feed_shooter(&mut self);

    fn feed_shooter_slow(&mut self);

    /// Default behavior: hold and stage balls away from the flywheel
    fn index_balls(&mut self);
}
