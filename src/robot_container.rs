//! Driver bindings for the shooter.
//!
//! | Input | Binding | Command |
//! |---|---|---|
//! | right bumper | while held | [`ShootAtTarmac`] |
//! | left bumper | while held | [`FeedShooter`] |
//! | A | while held | [`ShootAtVelocity`] |
//! | Y | toggle | [`ShootAuto`] |
//! | right trigger past 0.5 | while held | [`ShooterRunAtCloseVelocity`] |
//! | - | hood default | [`HoodReturnToDefault`] |

use tracing::info;

use crate::command::{CommandId, CommandScheduler, Requirement, SchedulerError};
use crate::commands::{
    FeedShooter, HoodReturnToDefault, ShootAtTarmac, ShootAtVelocity, ShootAuto,
    ShooterRunAtCloseVelocity,
};
use crate::controller::{CommandXboxController, ControllerError, XboxAxis, XboxController};
use crate::subsystems::{Hood, Indexer, Shared, Shooter, Subsystem};

/// Right trigger travel that counts as pressed
pub const SPIN_UP_THRESHOLD: f64 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Ids of the commands the container registered
#[derive(Debug, Clone, Copy)]
pub struct RobotCommands {
    pub shoot_tarmac: CommandId,
    pub feed: CommandId,
    pub shoot_velocity: CommandId,
    pub shoot_auto: CommandId,
    pub spin_up: CommandId,
    pub hood_default: CommandId,
}

pub struct RobotContainer {
    driver: CommandXboxController,
    scheduler: CommandScheduler,
    commands: RobotCommands,
}

impl RobotContainer {
    pub fn new<S, H, I>(
        driver: XboxController,
        shooter: Shared<S>,
        hood: Shared<H>,
        indexer: Shared<I>,
    ) -> Result<Self, RobotError>
    where
        S: Shooter + 'static,
        H: Hood + 'static,
        I: Indexer + 'static,
    {
        let mut driver = CommandXboxController::new(driver);
        let mut scheduler = CommandScheduler::new();

        scheduler.register_subsystem(shooter.clone() as Shared<dyn Subsystem>);
        scheduler.register_subsystem(hood.clone() as Shared<dyn Subsystem>);
        scheduler.register_subsystem(indexer.clone() as Shared<dyn Subsystem>);

        let commands = RobotCommands {
            shoot_tarmac: scheduler.register(ShootAtTarmac::new(
                shooter.clone(),
                hood.clone(),
                indexer.clone(),
            )),
            feed: scheduler.register(FeedShooter::new(indexer.clone())),
            shoot_velocity: scheduler.register(ShootAtVelocity::new(shooter.clone(), indexer)),
            shoot_auto: scheduler.register(ShootAuto::new(shooter.clone(), hood.clone())),
            spin_up: scheduler.register(ShooterRunAtCloseVelocity::new(shooter)),
            hood_default: scheduler.register(HoodReturnToDefault::new(hood)),
        };

        scheduler.while_true(&driver.right_bumper(), commands.shoot_tarmac)?;
        scheduler.while_true(&driver.left_bumper(), commands.feed)?;
        scheduler.while_true(&driver.a(), commands.shoot_velocity)?;
        scheduler.toggle_on_true(&driver.y(), commands.shoot_auto)?;

        let spin_up = driver.axis_trigger(XboxAxis::RightTrigger, SPIN_UP_THRESHOLD)?;
        scheduler.while_true(&spin_up, commands.spin_up)?;

        scheduler.set_default_command(Requirement::Hood, commands.hood_default)?;

        info!(
            "Robot container ready on port {} ({} cached triggers)",
            driver.hid().port(),
            driver.cached_triggers()
        );

        Ok(Self {
            driver,
            scheduler,
            commands,
        })
    }

    pub fn driver(&mut self) -> &mut CommandXboxController {
        &mut self.driver
    }

    pub fn scheduler(&self) -> &CommandScheduler {
        &self.scheduler
    }

    pub fn commands(&self) -> RobotCommands {
        self.commands
    }

    /// One control cycle
    pub fn run_cycle(&mut self) {
        self.scheduler.run();
    }

    /// Ends every running command as interrupted
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down after {} cycles, interrupting {} commands",
            self.scheduler.cycle(),
            self.scheduler.running_count()
        );
        self.scheduler.cancel_all();
    }
}
