//! Simulated mechanisms for running the robot program without hardware.
//!
//! Each one follows its setpoint with a first-order lag per `periodic()` call.
//! Good enough to exercise the gating logic, not a model of the real robot.

use tracing::debug;

use crate::command::Requirement;
use crate::subsystems::{Hood, Indexer, Shooter, Subsystem, VelocityBand};

const SHOOTER_RESPONSE: f64 = 0.2;
const HOOD_RESPONSE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct SimShooter {
    velocity: f64,
    target: f64,
    /// Setpoint used by `set_speeds_auto`, normally derived from vision
    pub auto_velocity: f64,
}

impl SimShooter {
    pub const TARMAC_VELOCITY: f64 = 8200.0;
    pub const TOLERANCE: f64 = 150.0;

    pub fn target(&self) -> f64 {
        self.target
    }
}

impl Default for SimShooter {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            target: 0.0,
            auto_velocity: 9000.0,
        }
    }
}

impl Subsystem for SimShooter {
    fn requirement(&self) -> Requirement {
        Requirement::Shooter
    }

    fn periodic(&mut self) {
        self.velocity += (self.target - self.velocity) * SHOOTER_RESPONSE;
    }
}

impl Shooter for SimShooter {
    fn run_at_velocity(&mut self, band: VelocityBand) {
        // Both wheels are lumped into one, spinning at the middle of the band
        self.target = (band.low + band.high) / 2.0;
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn run_at_tarmac_velocity(&mut self) {
        self.target = Self::TARMAC_VELOCITY;
    }

    fn ready_tarmac(&self) -> bool {
        (self.velocity - Self::TARMAC_VELOCITY).abs() <= Self::TOLERANCE
    }

    fn set_speeds_auto(&mut self) {
        self.target = self.auto_velocity;
    }

    fn stop(&mut self) {
        debug!("Shooter stop");
        self.target = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct SimHood {
    position: f64,
    target: f64,
    pub auto_position: f64,
}

impl SimHood {
    pub const TARMAC_POSITION: f64 = 0.42;
    pub const DEFAULT_POSITION: f64 = 0.1;
    pub const TOLERANCE: f64 = 0.01;

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

impl Default for SimHood {
    fn default() -> Self {
        Self {
            position: 0.0,
            target: 0.0,
            auto_position: 0.3,
        }
    }
}

impl Subsystem for SimHood {
    fn requirement(&self) -> Requirement {
        Requirement::Hood
    }

    fn periodic(&mut self) {
        self.position += (self.target - self.position) * HOOD_RESPONSE;
    }
}

impl Hood for SimHood {
    fn tarmac_shot(&mut self) {
        self.target = Self::TARMAC_POSITION;
    }

    fn at_tarmac(&self) -> bool {
        (self.position - Self::TARMAC_POSITION).abs() <= Self::TOLERANCE
    }

    fn set_position_auto(&mut self) {
        self.target = self.auto_position;
    }

    fn return_to_default(&mut self) {
        self.target = Self::DEFAULT_POSITION;
    }

    fn return_to_zero(&mut self) {
        debug!("Hood to zero");
        self.target = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexerMode {
    #[default]
    Idle,
    Indexing,
    Feeding,
    FeedingSlow,
}

#[derive(Debug, Clone, Default)]
pub struct SimIndexer {
    mode: IndexerMode,
    feed_cycles: u64,
}

impl SimIndexer {
    pub fn mode(&self) -> IndexerMode {
        self.mode
    }

    /// Cycles spent pushing balls into the flywheel
    pub fn feed_cycles(&self) -> u64 {
        self.feed_cycles
    }
}

impl Subsystem for SimIndexer {
    fn requirement(&self) -> Requirement {
        Requirement::Indexer
    }

    fn periodic(&mut self) {
        if matches!(self.mode, IndexerMode::Feeding | IndexerMode::FeedingSlow) {
            self.feed_cycles += 1;
        }
        // Feeding has to be re-commanded every cycle
        if self.mode != IndexerMode::Indexing {
            self.mode = IndexerMode::Idle;
        }
    }
}

impl Indexer for SimIndexer {
    fn feed_shooter(&mut self) {
        self.mode = IndexerMode::Feeding;
    }

    fn feed_shooter_slow(&mut self) {
        self.mode = IndexerMode::FeedingSlow;
    }

    fn index_balls(&mut self) {
        self.mode = IndexerMode::Indexing;
    }
}
