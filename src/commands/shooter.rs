use tracing::{debug, info};

use crate::command::{Command, Requirement};
use crate::subsystems::{Hood, Indexer, Shared, Shooter, VelocityBand};

/// Flywheel setpoint for the close shot
pub const CLOSE_SHOT_BAND: VelocityBand = VelocityBand::new(9818.0, 10710.0);

/// Measured velocities at which the close shot is allowed to feed
pub const CLOSE_SHOT_WINDOW: AcceptanceWindow = AcceptanceWindow::new(9700.0, 10500.0);

/// Open interval of measured velocities, both bounds excluded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceWindow {
    pub low: f64,
    pub high: f64,
}

impl AcceptanceWindow {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value > self.low && value < self.high
    }
}

/// Spins the flywheel to the close-shot band and feeds on every cycle the
/// measured velocity sits inside [`CLOSE_SHOT_WINDOW`].
///
/// Ending does not stop the flywheel; it keeps the last setpoint until another
/// command takes the shooter.
pub struct ShootAtVelocity<S: Shooter + ?Sized, I: Indexer + ?Sized> {
    shooter: Shared<S>,
    indexer: Shared<I>,
}

impl<S: Shooter + ?Sized, I: Indexer + ?Sized> ShootAtVelocity<S, I> {
    pub fn new(shooter: Shared<S>, indexer: Shared<I>) -> Self {
        Self { shooter, indexer }
    }
}

impl<S: Shooter + ?Sized, I: Indexer + ?Sized> Command for ShootAtVelocity<S, I> {
    fn name(&self) -> &str {
        "ShootAtVelocity"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Shooter, Requirement::Indexer]
    }

    fn on_start(&mut self) {
        let velocity = self.shooter.borrow().velocity();
        info!("ShootAtVelocity starting at {:.0}", velocity);
    }

    fn on_tick(&mut self) {
        let velocity = {
            let mut shooter = self.shooter.borrow_mut();
            shooter.run_at_velocity(CLOSE_SHOT_BAND);
            shooter.velocity()
        };

        if CLOSE_SHOT_WINDOW.contains(velocity) {
            debug!("Velocity {:.0} in window, feeding", velocity);
            self.indexer.borrow_mut().feed_shooter();
        } else {
            debug!("Velocity {:.0} outside window, holding", velocity);
        }
    }

    fn on_end(&mut self, interrupted: bool) {
        info!(
            "ShootAtVelocity ended (interrupted: {}), flywheel left at setpoint",
            interrupted
        );
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// Tarmac shot: hood and flywheel to their tarmac setpoints, slow feed only
/// on cycles where both report ready.
pub struct ShootAtTarmac<S: Shooter + ?Sized, H: Hood + ?Sized, I: Indexer + ?Sized> {
    shooter: Shared<S>,
    hood: Shared<H>,
    indexer: Shared<I>,
}

impl<S: Shooter + ?Sized, H: Hood + ?Sized, I: Indexer + ?Sized> ShootAtTarmac<S, H, I> {
    pub fn new(shooter: Shared<S>, hood: Shared<H>, indexer: Shared<I>) -> Self {
        Self {
            shooter,
            hood,
            indexer,
        }
    }
}

impl<S: Shooter + ?Sized, H: Hood + ?Sized, I: Indexer + ?Sized> Command
    for ShootAtTarmac<S, H, I>
{
    fn name(&self) -> &str {
        "ShootAtTarmac"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Shooter, Requirement::Hood, Requirement::Indexer]
    }

    fn on_tick(&mut self) {
        let mut hood = self.hood.borrow_mut();
        let mut shooter = self.shooter.borrow_mut();
        hood.tarmac_shot();
        shooter.run_at_tarmac_velocity();

        let shooter_ready = shooter.ready_tarmac();
        let hood_ready = hood.at_tarmac();
        if shooter_ready && hood_ready {
            debug!("Shooter and hood ready, feeding slowly");
            self.indexer.borrow_mut().feed_shooter_slow();
        } else {
            debug!(
                "Waiting for readiness (shooter: {}, hood: {})",
                shooter_ready, hood_ready
            );
        }
    }

    fn on_end(&mut self, interrupted: bool) {
        info!("ShootAtTarmac ended (interrupted: {})", interrupted);
        self.shooter.borrow_mut().stop();
        self.hood.borrow_mut().return_to_default();
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// Hood and flywheel follow the automatic target; feeding is left to other
/// commands.
pub struct ShootAuto<S: Shooter + ?Sized, H: Hood + ?Sized> {
    shooter: Shared<S>,
    hood: Shared<H>,
}

impl<S: Shooter + ?Sized, H: Hood + ?Sized> ShootAuto<S, H> {
    pub fn new(shooter: Shared<S>, hood: Shared<H>) -> Self {
        Self { shooter, hood }
    }
}

impl<S: Shooter + ?Sized, H: Hood + ?Sized> Command for ShootAuto<S, H> {
    fn name(&self) -> &str {
        "ShootAuto"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Hood, Requirement::Shooter]
    }

    fn on_tick(&mut self) {
        self.hood.borrow_mut().set_position_auto();
        self.shooter.borrow_mut().set_speeds_auto();
    }

    fn on_end(&mut self, interrupted: bool) {
        info!("ShootAuto ended (interrupted: {})", interrupted);
        self.shooter.borrow_mut().stop();
        self.hood.borrow_mut().return_to_zero();
    }

    fn is_finished(&self) -> bool {
        false
    }
}

/// Pre-spins the flywheel to the close-shot band without feeding
pub struct ShooterRunAtCloseVelocity<S: Shooter + ?Sized> {
    shooter: Shared<S>,
}

impl<S: Shooter + ?Sized> ShooterRunAtCloseVelocity<S> {
    pub fn new(shooter: Shared<S>) -> Self {
        Self { shooter }
    }
}

impl<S: Shooter + ?Sized> Command for ShooterRunAtCloseVelocity<S> {
    fn name(&self) -> &str {
        "ShooterRunAtCloseVelocity"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Shooter]
    }

    fn on_tick(&mut self) {
        self.shooter.borrow_mut().run_at_velocity(CLOSE_SHOT_BAND);
    }

    fn on_end(&mut self, _interrupted: bool) {
        self.shooter.borrow_mut().stop();
    }
}

/// Holds the hood at its default position. Registered as the hood's default
/// command.
pub struct HoodReturnToDefault<H: Hood + ?Sized> {
    hood: Shared<H>,
}

impl<H: Hood + ?Sized> HoodReturnToDefault<H> {
    pub fn new(hood: Shared<H>) -> Self {
        Self { hood }
    }
}

impl<H: Hood + ?Sized> Command for HoodReturnToDefault<H> {
    fn name(&self) -> &str {
        "HoodReturnToDefault"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Hood]
    }

    fn on_tick(&mut self) {
        self.hood.borrow_mut().return_to_default();
    }
}
