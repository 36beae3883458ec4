//! Recording subsystems for command tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::Requirement;
use crate::subsystems::{shared, Hood, Indexer, Shared, Shooter, Subsystem, VelocityBand};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    RunAtVelocity(VelocityBand),
    ReadVelocity,
    RunAtTarmacVelocity,
    ReadShooterReady,
    ShooterAuto,
    ShooterStop,
    HoodTarmac,
    ReadHoodReady,
    HoodAuto,
    HoodDefault,
    HoodZero,
    Feed,
    FeedSlow,
    IndexBalls,
}

pub(crate) type CallLog = Rc<RefCell<Vec<Call>>>;

pub(crate) fn drain(log: &CallLog) -> Vec<Call> {
    log.borrow_mut().drain(..).collect()
}

pub(crate) struct FakeShooter {
    log: CallLog,
    pub velocity: f64,
    pub ready: bool,
}

pub(crate) struct FakeHood {
    log: CallLog,
    pub ready: bool,
}

pub(crate) struct FakeIndexer {
    log: CallLog,
}

/// Three fakes writing into one shared log, so tests can check call order
/// across subsystems.
pub(crate) fn rig() -> (
    CallLog,
    Shared<FakeShooter>,
    Shared<FakeHood>,
    Shared<FakeIndexer>,
) {
    let log = CallLog::default();
    let shooter = shared(FakeShooter {
        log: log.clone(),
        velocity: 0.0,
        ready: false,
    });
    let hood = shared(FakeHood {
        log: log.clone(),
        ready: false,
    });
    let indexer = shared(FakeIndexer { log: log.clone() });
    (log, shooter, hood, indexer)
}

impl Subsystem for FakeShooter {
    fn requirement(&self) -> Requirement {
        Requirement::Shooter
    }
}

impl Shooter for FakeShooter {
    fn run_at_velocity(&mut self, band: VelocityBand) {
        self.log.borrow_mut().push(Call::RunAtVelocity(band));
    }

    fn velocity(&self) -> f64 {
        self.log.borrow_mut().push(Call::ReadVelocity);
        self.velocity
    }

    fn run_at_tarmac_velocity(&mut self) {
        self.log.borrow_mut().push(Call::RunAtTarmacVelocity);
    }

    fn ready_tarmac(&self) -> bool {
        self.log.borrow_mut().push(Call::ReadShooterReady);
        self.ready
    }

    fn set_speeds_auto(&mut self) {
        self.log.borrow_mut().push(Call::ShooterAuto);
    }

    fn stop(&mut self) {
        self.log.borrow_mut().push(Call::ShooterStop);
    }
}

impl Subsystem for FakeHood {
    fn requirement(&self) -> Requirement {
        Requirement::Hood
    }
}

impl Hood for FakeHood {
    fn tarmac_shot(&mut self) {
        self.log.borrow_mut().push(Call::HoodTarmac);
    }

    fn at_tarmac(&self) -> bool {
        self.log.borrow_mut().push(Call::ReadHoodReady);
        self.ready
    }

    fn set_position_auto(&mut self) {
        self.log.borrow_mut().push(Call::HoodAuto);
    }

    fn return_to_default(&mut self) {
        self.log.borrow_mut().push(Call::HoodDefault);
    }

    fn return_to_zero(&mut self) {
        self.log.borrow_mut().push(Call::HoodZero);
    }
}

impl Subsystem for FakeIndexer {
    fn requirement(&self) -> Requirement {
        Requirement::Indexer
    }
}

impl Indexer for FakeIndexer {
    fn feed_shooter(&mut self) {
        self.log.borrow_mut().push(Call::Feed);
    }

    fn feed_shooter_slow(&mut self) {
        self.log.borrow_mut().push(Call::FeedSlow);
    }

    fn index_balls(&mut self) {
        self.log.borrow_mut().push(Call::IndexBalls);
    }
}
